//! Rule: Make `static` classes non-static
//!
//! A static class cannot be instantiated, substituted or mocked. This rule
//! reports every class declared `static` and offers a fix that removes the
//! modifier from the class and from the methods it declares directly.

use unstatic_core::{
    line_column, visit, Declaration, DeclarationKind, MemberKinds, ModifierRewrite,
    ProjectSet, SourceTree, Span, UnitId, Visitor,
};

use crate::diagnostic::{Diagnostic, Severity};
use crate::fix::CodeFix;
use crate::registry::Rule;

pub const DIAGNOSTIC_ID: &str = "UnstaticClass";
pub const FIX_TITLE: &str = "Make non-static with singleton";

const MODIFIER: &str = "static";

/// Reports `static` classes
#[derive(Debug, Clone, Default)]
pub struct UnstaticClassRule {
    member_kinds: MemberKinds,
}

impl UnstaticClassRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Member kinds whose `static` modifier the fix removes as well
    pub fn with_member_kinds(mut self, member_kinds: MemberKinds) -> Self {
        self.member_kinds = member_kinds;
        self
    }
}

impl Rule for UnstaticClassRule {
    fn name(&self) -> &'static str {
        "unstatic_class"
    }

    fn description(&self) -> &'static str {
        "Make static classes and their methods non-static"
    }

    fn check(&self, unit: &UnitId, tree: &SourceTree) -> Vec<Diagnostic> {
        let source = tree.text();
        let mut visitor = StaticClassVisitor {
            unit,
            tree,
            source: &source,
            diagnostics: Vec::new(),
        };
        visit(&mut visitor, tree);
        visitor.diagnostics
    }

    fn fix(&self, project: &ProjectSet, diagnostic: &Diagnostic) -> Option<CodeFix> {
        if diagnostic.rule != self.name() {
            return None;
        }
        // The handle must still point into the unit's current generation
        project.get(&diagnostic.unit)?.declaration(diagnostic.target)?;

        Some(CodeFix {
            title: FIX_TITLE,
            equivalence_key: FIX_TITLE,
            target: diagnostic.target,
            rewrite: ModifierRewrite::new(MODIFIER).with_member_kinds(self.member_kinds),
        })
    }
}

struct StaticClassVisitor<'s> {
    unit: &'s UnitId,
    tree: &'s SourceTree,
    source: &'s str,
    diagnostics: Vec<Diagnostic>,
}

impl Visitor for StaticClassVisitor<'_> {
    fn visit_declaration(&mut self, decl: &Declaration, offset: usize) -> bool {
        if decl.kind() == DeclarationKind::Class && decl.has_modifier(MODIFIER) {
            let start = decl.name_offset(offset);
            let (line, column) = line_column(self.source, start);
            self.diagnostics.push(Diagnostic {
                rule: "unstatic_class",
                id: DIAGNOSTIC_ID,
                severity: Severity::Info,
                message: format!(
                    "Type {} can be made into non-static with singleton",
                    decl.name()
                ),
                unit: self.unit.clone(),
                span: Span::new(start, start + decl.name().len()),
                line,
                column,
                target: self.tree.handle(decl.id()),
            });
        }
        true // Nested classes are reported on their own
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE_NAME: &str = r#"
    using System;
    using System.Collections.Generic;
    using System.Linq;
    using System.Text;
    using System.Threading.Tasks;
    using System.Diagnostics;

    namespace ConsoleApplication1
    {
        static class TypeName
        {
        }
    }"#;

    fn check(source: &str) -> Vec<Diagnostic> {
        let project = ProjectSet::parse_units([("Test0.cs", source)]).unwrap();
        let unit = UnitId::from("Test0.cs");
        UnstaticClassRule::new().check(&unit, project.get(&unit).unwrap())
    }

    fn fix(source: &str) -> String {
        let project = ProjectSet::parse_units([("Test0.cs", source)]).unwrap();
        let rule = UnstaticClassRule::new();
        let unit = UnitId::from("Test0.cs");
        let diagnostics = rule.check(&unit, project.get(&unit).unwrap());
        let fix = rule.fix(&project, &diagnostics[0]).unwrap();
        fix.apply(&project).get(&unit).unwrap().text()
    }

    // ==================== Detection Tests ====================

    #[test]
    fn test_no_diagnostics_for_empty_source() {
        assert!(check("").is_empty());
    }

    #[test]
    fn test_diagnostic_triggered() {
        let diagnostics = check(TYPE_NAME);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.id, "UnstaticClass");
        assert_eq!(
            d.message,
            "Type TypeName can be made into non-static with singleton"
        );
        assert_eq!(d.severity, Severity::Info);
        assert_eq!((d.line, d.column), (11, 22));
        assert_eq!(&TYPE_NAME[d.span.start..d.span.end], "TypeName");
        assert_eq!(d.location(), "Test0.cs:11:22");
    }

    #[test]
    fn test_non_static_and_non_class_types_are_ignored() {
        let source = "class A { static void M() { } }\nstatic struct S { }\ninterface I { }\n";
        assert!(check(source).is_empty());
    }

    #[test]
    fn test_nested_static_classes_are_reported() {
        let source = "static class Outer\n{\n    static class Inner { }\n}\n";
        let names: Vec<(usize, usize)> = check(source).iter().map(|d| (d.line, d.column)).collect();
        assert_eq!(names, vec![(1, 14), (3, 18)]);
    }

    // ==================== Fix Tests ====================

    #[test]
    fn test_fix_static_class() {
        assert_eq!(
            fix(TYPE_NAME),
            TYPE_NAME.replace("static class TypeName", "class TypeName")
        );
    }

    #[test]
    fn test_fix_static_class_and_method() {
        let source = r#"
    namespace ConsoleApplication1
    {
        static class Provider
        {
            public static void Provider()
            {
            }
        }
    }"#;
        let expected = r#"
    namespace ConsoleApplication1
    {
        class Provider
        {
            public void Provider()
            {
            }
        }
    }"#;
        assert_eq!(fix(source), expected);
    }

    #[test]
    fn test_fix_with_fields() {
        let source = "static class C { static int count; static void Tick() { count++; } }";
        let project = ProjectSet::parse_units([("c.cs", source)]).unwrap();
        let unit = UnitId::from("c.cs");
        let rule = UnstaticClassRule::new().with_member_kinds(MemberKinds::ALL);
        let diagnostics = rule.check(&unit, project.get(&unit).unwrap());
        let fixed = rule.fix(&project, &diagnostics[0]).unwrap().apply(&project);
        assert_eq!(
            fixed.get(&unit).unwrap().text(),
            "class C { int count; void Tick() { count++; } }"
        );
    }

    #[test]
    fn test_fix_metadata() {
        let project = ProjectSet::parse_units([("a.cs", "static class A { }")]).unwrap();
        let unit = UnitId::from("a.cs");
        let rule = UnstaticClassRule::new();
        let diagnostics = rule.check(&unit, project.get(&unit).unwrap());
        let fix = rule.fix(&project, &diagnostics[0]).unwrap();
        assert_eq!(fix.title, "Make non-static with singleton");
        assert_eq!(fix.equivalence_key, fix.title);
        assert_eq!(fix.target, diagnostics[0].target);
    }

    #[test]
    fn test_no_fix_for_stale_diagnostic() {
        let project = ProjectSet::parse_units([("a.cs", "static class A { }")]).unwrap();
        let unit = UnitId::from("a.cs");
        let rule = UnstaticClassRule::new();
        let diagnostics = rule.check(&unit, project.get(&unit).unwrap());
        let fixed = rule.fix(&project, &diagnostics[0]).unwrap().apply(&project);
        assert!(rule.fix(&fixed, &diagnostics[0]).is_none());
    }
}
