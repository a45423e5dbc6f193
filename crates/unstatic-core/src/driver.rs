//! Project-wide rewrite of one target declaration
//!
//! The target is addressed by a [`NodeHandle`] captured from one tree
//! generation. Every unit is traversed; only the tree of the generation the
//! handle came from can match. A handle that no longer matches any unit is
//! not an error: the project is returned unchanged.

use std::sync::Arc;

use rayon::prelude::*;

use crate::project::{ProjectSet, UnitId};
use crate::rewrite::{
    rewrite_members_of, rewrite_node, strip_modifier, MemberKinds, Rewrite, Rewriter,
};
use crate::syntax::{Declaration, Node, NodeHandle, NodeId, SourceTree};

/// Removal of one modifier from a declaration and its direct members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierRewrite {
    modifier: String,
    member_kinds: MemberKinds,
}

impl ModifierRewrite {
    pub fn new(modifier: impl Into<String>) -> Self {
        Self {
            modifier: modifier.into(),
            member_kinds: MemberKinds::default(),
        }
    }

    pub fn with_member_kinds(mut self, member_kinds: MemberKinds) -> Self {
        self.member_kinds = member_kinds;
        self
    }

    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    pub fn member_kinds(&self) -> MemberKinds {
        self.member_kinds
    }

    /// Strip the declaration, then its members. `None` if nothing changed.
    pub fn rewrite_target(&self, decl: &Declaration) -> Option<Declaration> {
        let stripped = strip_modifier(decl, &self.modifier);
        let rewritten = rewrite_members_of(&stripped, &self.modifier, self.member_kinds);
        (rewritten != *decl).then_some(rewritten)
    }

    /// Rewrite the target inside one tree
    ///
    /// Returns a clone of `tree` (same generation) if the handle belongs to
    /// another generation or the target needs no change. Otherwise returns a
    /// new generation sharing every subtree off the path to the target.
    pub fn rewrite_tree(&self, tree: &SourceTree, target: NodeHandle) -> SourceTree {
        if !tree.owns(target) {
            return tree.clone();
        }
        let mut rewriter = TargetRewriter {
            target: target.node,
            rewrite: self,
        };
        match rewrite_node(&mut rewriter, tree.root()) {
            Some(root) => SourceTree::from_root(root),
            None => tree.clone(),
        }
    }

    /// Rewrite the target across every unit of the project
    ///
    /// Units are processed in parallel and merged back in their original
    /// order. Key set and order of the project never change.
    pub fn rewrite_project(&self, project: &ProjectSet, target: NodeHandle) -> ProjectSet {
        let units: Vec<(&UnitId, &SourceTree)> = project.iter().collect();
        units
            .into_par_iter()
            .map(|(id, tree)| (id.clone(), self.rewrite_tree(tree, target)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }
}

/// Replaces the node with the target id and descends everywhere else
struct TargetRewriter<'r> {
    target: NodeId,
    rewrite: &'r ModifierRewrite,
}

impl Rewriter for TargetRewriter<'_> {
    fn rewrite(&mut self, node: &Node) -> Rewrite {
        match node {
            Node::Declaration(decl) if decl.id() == self.target => {
                match self.rewrite.rewrite_target(decl) {
                    Some(rewritten) => Rewrite::Replace(Node::Declaration(Arc::new(rewritten))),
                    None => Rewrite::Keep,
                }
            }
            Node::Member(_) => Rewrite::Keep,
            _ => Rewrite::Descend,
        }
    }
}

/// Remove `modifier` from the target declaration and from the methods it
/// declares directly, in whichever unit the target lives
pub fn rewrite_project(project: &ProjectSet, target: NodeHandle, modifier: &str) -> ProjectSet {
    ModifierRewrite::new(modifier).rewrite_project(project, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::MemberKind;

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

    const PROVIDER: &str = r#"
    namespace ConsoleApplication1
    {
        static class Provider
        {
            public static void Provider()
            {
            }
        }
    }"#;

    /// Handle to the first declaration named `name` in `unit`
    fn handle_of(project: &ProjectSet, unit: &str, name: &str) -> NodeHandle {
        use crate::syntax::Member;
        use crate::visitor::{visit, Visitor};

        struct Find<'n> {
            name: &'n str,
            found: Option<NodeId>,
        }

        impl Visitor for Find<'_> {
            fn visit_declaration(&mut self, decl: &Declaration, _offset: usize) -> bool {
                if self.found.is_none() && decl.name() == self.name {
                    self.found = Some(decl.id());
                }
                true
            }

            fn visit_member(&mut self, _member: &Member, _offset: usize) {}
        }

        let tree = project.get(&UnitId::from(unit)).unwrap();
        let mut find = Find { name, found: None };
        visit(&mut find, tree);
        tree.handle(find.found.unwrap())
    }

    fn text(project: &ProjectSet, unit: &str) -> String {
        project.get(&UnitId::from(unit)).unwrap().text()
    }

    #[test]
    fn test_static_class_without_members() {
        let project = ProjectSet::parse_units([("Test0.cs", TYPE_NAME)]).unwrap();
        let target = handle_of(&project, "Test0.cs", "TypeName");
        let fixed = rewrite_project(&project, target, "static");
        assert_eq!(
            text(&fixed, "Test0.cs"),
            TYPE_NAME.replace("static class TypeName", "class TypeName")
        );
    }

    #[test]
    fn test_static_class_and_its_method() {
        let project = ProjectSet::parse_units([("Test0.cs", PROVIDER)]).unwrap();
        let target = handle_of(&project, "Test0.cs", "Provider");
        let fixed = rewrite_project(&project, target, "static");
        let expected = PROVIDER
            .replace("static class Provider", "class Provider")
            .replace("public static void Provider()", "public void Provider()");
        assert_eq!(text(&fixed, "Test0.cs"), expected);
    }

    #[test]
    fn test_other_units_are_untouched() {
        let project = ProjectSet::parse_units([
            ("a.cs", "static class Helper { static void Run() { } }\n"),
            ("b.cs", "static class Helper { static void Run() { } }\n"),
        ])
        .unwrap();
        let target = handle_of(&project, "a.cs", "Helper");
        let fixed = rewrite_project(&project, target, "static");

        assert_eq!(text(&fixed, "a.cs"), "class Helper { void Run() { } }\n");
        let before = project.get(&UnitId::from("b.cs")).unwrap();
        let after = fixed.get(&UnitId::from("b.cs")).unwrap();
        assert_eq!(before, after);
        assert!(before.same_generation(after));

        let keys: Vec<&str> = fixed.keys().map(UnitId::as_str).collect();
        assert_eq!(keys, vec!["a.cs", "b.cs"]);
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let project = ProjectSet::parse_units([("a.cs", PROVIDER)]).unwrap();
        let target = handle_of(&project, "a.cs", "Provider");
        let once = rewrite_project(&project, target, "static");

        // The old handle is stale against the new generation
        let stale = rewrite_project(&once, target, "static");
        assert_eq!(stale, once);
        let unit = UnitId::from("a.cs");
        assert!(stale.get(&unit).unwrap().same_generation(once.get(&unit).unwrap()));

        // A fresh handle to the rewritten declaration changes nothing either
        let fresh = handle_of(&once, "a.cs", "Provider");
        let twice = rewrite_project(&once, fresh, "static");
        assert_eq!(twice, once);
        assert!(twice.get(&unit).unwrap().same_generation(once.get(&unit).unwrap()));
    }

    #[test]
    fn test_nested_declarations_keep_their_modifiers() {
        let source = "static class Outer\n{\n    static void A() { }\n    static class Inner\n    {\n        static void B() { }\n    }\n}\n";
        let project = ProjectSet::parse_units([("a.cs", source)]).unwrap();
        let target = handle_of(&project, "a.cs", "Outer");
        let fixed = rewrite_project(&project, target, "static");
        assert_eq!(
            text(&fixed, "a.cs"),
            "class Outer\n{\n    void A() { }\n    static class Inner\n    {\n        static void B() { }\n    }\n}\n"
        );
    }

    #[test]
    fn test_nested_target_leaves_outer_alone() {
        let source = "static class Outer { static void A() { } static class Inner { static void B() { } } }";
        let project = ProjectSet::parse_units([("a.cs", source)]).unwrap();
        let target = handle_of(&project, "a.cs", "Inner");
        let fixed = rewrite_project(&project, target, "static");
        assert_eq!(
            text(&fixed, "a.cs"),
            "static class Outer { static void A() { } class Inner { void B() { } } }"
        );
    }

    #[test]
    fn test_trivia_and_member_order_preserved() {
        let source = "// header\n[Serializable] // why\npublic static class A // trailing\n{\n    /// Docs\n    public static int One() => 1;\n\n    // two\n    internal static int Two() => 2;\n} // done\n";
        let project = ProjectSet::parse_units([("a.cs", source)]).unwrap();
        let target = handle_of(&project, "a.cs", "A");
        let fixed = rewrite_project(&project, target, "static");
        assert_eq!(
            text(&fixed, "a.cs"),
            "// header\n[Serializable] // why\npublic class A // trailing\n{\n    /// Docs\n    public int One() => 1;\n\n    // two\n    internal int Two() => 2;\n} // done\n"
        );
    }

    #[test]
    fn test_member_kinds_are_configurable() {
        let source = "static class A { static int x; static void M() { } }";
        let project = ProjectSet::parse_units([("a.cs", source)]).unwrap();
        let target = handle_of(&project, "a.cs", "A");

        let methods_only = rewrite_project(&project, target, "static");
        assert_eq!(text(&methods_only, "a.cs"), "class A { static int x; void M() { } }");

        let kinds = MemberKinds::METHODS.with(MemberKind::Field);
        let all = ModifierRewrite::new("static")
            .with_member_kinds(kinds)
            .rewrite_project(&project, target);
        assert_eq!(text(&all, "a.cs"), "class A { int x; void M() { } }");
    }

    #[test]
    fn test_unchanged_subtrees_are_shared() {
        let source = "namespace N\n{\n    class Keep { }\n    static class Fix { }\n}\nclass After { }\n";
        let project = ProjectSet::parse_units([("a.cs", source)]).unwrap();
        let target = handle_of(&project, "a.cs", "Fix");
        let unit = UnitId::from("a.cs");
        let before = project.get(&unit).unwrap();
        let after = ModifierRewrite::new("static").rewrite_tree(before, target);

        assert_ne!(before.generation(), after.generation());
        let keep = |tree: &SourceTree| {
            tree.declaration(tree.handle(NodeId(2))).unwrap() as *const Declaration
        };
        let after_class = |tree: &SourceTree| {
            tree.declaration(tree.handle(NodeId(4))).unwrap() as *const Declaration
        };
        assert_eq!(keep(before), keep(&after));
        assert_eq!(after_class(before), after_class(&after));
    }

    #[test]
    fn test_modifier_not_present_is_a_no_op() {
        let project = ProjectSet::parse_units([("a.cs", "class A { void M() { } }")]).unwrap();
        let target = handle_of(&project, "a.cs", "A");
        let fixed = rewrite_project(&project, target, "static");
        assert_eq!(fixed, project);
    }
}
