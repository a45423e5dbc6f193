//! Rule trait and registry for detection rules

use std::collections::HashSet;

use thiserror::Error;
use unstatic_core::{MemberKinds, ProjectSet, SourceTree, UnitId};

use crate::diagnostic::Diagnostic;
use crate::fix::CodeFix;

/// Errors raised when selecting rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

/// A rule that detects an anti-pattern and can offer a fix for it
pub trait Rule: Send + Sync {
    /// The unique identifier for this rule (e.g., "unstatic_class")
    fn name(&self) -> &'static str;

    /// A short description of what this rule does
    fn description(&self) -> &'static str;

    /// Check one unit's tree and return its diagnostics
    fn check(&self, unit: &UnitId, tree: &SourceTree) -> Vec<Diagnostic>;

    /// Build the fix for a diagnostic this rule reported
    ///
    /// Returns `None` when the diagnostic belongs to another rule or its
    /// target no longer exists in `project`.
    fn fix(&self, project: &ProjectSet, diagnostic: &Diagnostic) -> Option<CodeFix>;
}

/// Registry of all available rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self::with_member_kinds(MemberKinds::default())
    }

    /// Create the built-in rules, rewriting members of the given kinds
    pub fn with_member_kinds(member_kinds: MemberKinds) -> Self {
        let mut registry = Self { rules: Vec::new() };

        registry.register(Box::new(
            super::unstatic_class::UnstaticClassRule::new().with_member_kinds(member_kinds),
        ));

        registry
    }

    /// Register a new rule
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Get all rule names
    pub fn all_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Check that every requested name refers to a registered rule
    pub fn validate(&self, names: &HashSet<String>) -> Result<(), RegistryError> {
        let known = self.all_names();
        let mut unknown: Vec<&String> = names
            .iter()
            .filter(|n| !known.contains(&n.as_str()))
            .collect();
        unknown.sort();
        match unknown.first() {
            Some(name) => Err(RegistryError::UnknownRule((*name).clone())),
            None => Ok(()),
        }
    }

    /// Get rules filtered by enabled names
    pub fn get_enabled(&self, enabled: &HashSet<String>) -> Vec<&dyn Rule> {
        self.rules
            .iter()
            .filter(|r| enabled.contains(r.name()))
            .map(|r| r.as_ref())
            .collect()
    }

    /// Get all rules with their descriptions (for --list-rules)
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.description()))
            .collect()
    }

    /// Run all enabled rules on one unit
    pub fn check_all(
        &self,
        unit: &UnitId,
        tree: &SourceTree,
        enabled: &HashSet<String>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for rule in self.get_enabled(enabled) {
            diagnostics.extend(rule.check(unit, tree));
        }
        diagnostics
    }

    /// Run all enabled rules on every unit, in project order
    pub fn check_project(
        &self,
        project: &ProjectSet,
        enabled: &HashSet<String>,
    ) -> Vec<Diagnostic> {
        project
            .iter()
            .flat_map(|(unit, tree)| self.check_all(unit, tree, enabled))
            .collect()
    }

    /// Ask the rule that reported `diagnostic` for its fix
    pub fn fix_for(&self, project: &ProjectSet, diagnostic: &Diagnostic) -> Option<CodeFix> {
        self.rules
            .iter()
            .find(|r| r.name() == diagnostic.rule)
            .and_then(|r| r.fix(project, diagnostic))
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_rules() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.all_names(), vec!["unstatic_class"]);
        let listed = registry.list_rules();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].1.is_empty());
    }

    #[test]
    fn test_get_enabled() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.get_enabled(&enabled(&["unstatic_class"])).len(), 1);
        assert!(registry.get_enabled(&enabled(&[])).is_empty());
    }

    #[test]
    fn test_validate() {
        let registry = RuleRegistry::new();
        assert!(registry.validate(&enabled(&["unstatic_class"])).is_ok());
        assert_eq!(
            registry.validate(&enabled(&["unstatic_class", "nope"])),
            Err(RegistryError::UnknownRule("nope".to_string()))
        );
    }

    #[test]
    fn test_check_project_in_unit_order() {
        let registry = RuleRegistry::new();
        let project = ProjectSet::parse_units([
            ("b.cs", "static class B { }"),
            ("a.cs", "class A { } static class C { }"),
        ])
        .unwrap();
        let diagnostics = registry.check_project(&project, &enabled(&["unstatic_class"]));
        let units: Vec<&str> = diagnostics.iter().map(|d| d.unit.as_str()).collect();
        assert_eq!(units, vec!["b.cs", "a.cs"]);

        let none = registry.check_project(&project, &enabled(&[]));
        assert!(none.is_empty());
    }

    #[test]
    fn test_fix_for_routes_to_rule() {
        let registry = RuleRegistry::new();
        let project = ProjectSet::parse_units([("a.cs", "static class A { }")]).unwrap();
        let diagnostics = registry.check_project(&project, &enabled(&["unstatic_class"]));
        let fix = registry.fix_for(&project, &diagnostics[0]).unwrap();
        let fixed = fix.apply(&project);
        assert_eq!(fixed.get(&UnitId::from("a.cs")).unwrap().text(), "class A { }");

        let mut foreign = diagnostics[0].clone();
        foreign.rule = "other";
        assert!(registry.fix_for(&project, &foreign).is_none());
    }
}
