//! Code fixes and whole-project fix application

use std::collections::HashSet;

use unstatic_core::{ModifierRewrite, NodeHandle, ProjectSet};

use crate::registry::RuleRegistry;

/// A fix offered for one diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFix {
    /// Title shown to the user
    pub title: &'static str,
    /// Fixes sharing this key can be applied together
    pub equivalence_key: &'static str,
    /// Declaration the fix rewrites
    pub target: NodeHandle,
    pub rewrite: ModifierRewrite,
}

impl CodeFix {
    /// Apply the fix, producing a new project set
    pub fn apply(&self, project: &ProjectSet) -> ProjectSet {
        self.rewrite.rewrite_project(project, self.target)
    }
}

/// Outcome of [`fix_all`]
#[derive(Debug, Clone)]
pub struct FixAllResult {
    pub project: ProjectSet,
    /// Titles of the fixes applied, in order
    pub applied: Vec<&'static str>,
}

/// Detect and fix until no fixable diagnostic remains
///
/// Every round re-runs detection on the current project, so each fix is
/// built from a handle of the generation it is applied to. The number of
/// rounds is bounded by the initial diagnostic count plus one.
pub fn fix_all(
    project: &ProjectSet,
    registry: &RuleRegistry,
    enabled: &HashSet<String>,
) -> FixAllResult {
    let mut current = project.clone();
    let mut applied = Vec::new();
    let rounds = registry.check_project(&current, enabled).len() + 1;

    for _ in 0..rounds {
        let diagnostics = registry.check_project(&current, enabled);
        let Some(fix) = diagnostics
            .iter()
            .find_map(|d| registry.fix_for(&current, d))
        else {
            break;
        };
        let next = fix.apply(&current);
        if next == current {
            break;
        }
        applied.push(fix.title);
        current = next;
    }

    FixAllResult {
        project: current,
        applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unstatic_core::UnitId;

    fn enabled() -> HashSet<String> {
        ["unstatic_class".to_string()].into_iter().collect()
    }

    #[test]
    fn test_fix_all_across_units() {
        let project = ProjectSet::parse_units([
            ("a.cs", "static class A { static void M() { } }\n"),
            ("b.cs", "namespace N\n{\n    static class B\n    {\n        static class C { }\n    }\n}\n"),
            ("c.cs", "class D { }\n"),
        ])
        .unwrap();
        let registry = RuleRegistry::new();
        let result = fix_all(&project, &registry, &enabled());

        assert_eq!(result.applied.len(), 3);
        let text = |unit: &str| result.project.get(&UnitId::from(unit)).unwrap().text();
        assert_eq!(text("a.cs"), "class A { void M() { } }\n");
        assert_eq!(
            text("b.cs"),
            "namespace N\n{\n    class B\n    {\n        class C { }\n    }\n}\n"
        );
        assert_eq!(text("c.cs"), "class D { }\n");
        assert!(registry
            .check_project(&result.project, &enabled())
            .is_empty());
    }

    #[test]
    fn test_fix_all_without_diagnostics() {
        let project = ProjectSet::parse_units([("a.cs", "class A { }")]).unwrap();
        let result = fix_all(&project, &RuleRegistry::new(), &enabled());
        assert!(result.applied.is_empty());
        assert_eq!(result.project, project);
    }

    #[test]
    fn test_fix_all_respects_enabled_rules() {
        let project = ProjectSet::parse_units([("a.cs", "static class A { }")]).unwrap();
        let result = fix_all(&project, &RuleRegistry::new(), &HashSet::new());
        assert!(result.applied.is_empty());
        assert_eq!(result.project, project);
    }
}
