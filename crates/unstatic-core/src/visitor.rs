//! Tree visitor for walking declaration structure
//!
//! Provides a trait-based visitor pattern that rules can implement.
//! Default implementations handle traversal; rules override specific methods.
//! Every callback receives the byte offset where the visited node starts
//! (including its leading trivia) in the unit's source text.

use crate::syntax::{Declaration, Element, Member, Node, Other, SourceTree};

/// Trait for visiting syntax tree nodes
pub trait Visitor {
    /// Called for each type declaration. Return `true` to continue traversal
    /// into its members.
    fn visit_declaration(&mut self, _decl: &Declaration, _offset: usize) -> bool {
        true
    }

    /// Called for each member declaration
    fn visit_member(&mut self, _member: &Member, _offset: usize) {}

    /// Called for compilation units, namespaces and unrecognized items.
    /// Return `true` to continue traversal into children.
    fn visit_other(&mut self, _other: &Other, _offset: usize) -> bool {
        true
    }

    /// Visit a tree (entry point)
    fn visit_tree(&mut self, tree: &SourceTree) {
        self.traverse_node(tree.root(), 0);
    }

    /// Traverse a node and its children
    fn traverse_node(&mut self, node: &Node, offset: usize) {
        match node {
            Node::Declaration(decl) => {
                if !self.visit_declaration(decl, offset) {
                    return;
                }
                let mut child_offset = decl.items_offset(offset);
                for item in decl.members() {
                    self.traverse_node(item, child_offset);
                    child_offset += item.text_len();
                }
            }
            Node::Member(member) => self.visit_member(member, offset),
            Node::Other(other) => {
                if !self.visit_other(other, offset) {
                    return;
                }
                let mut child_offset = offset;
                for child in other.children() {
                    if let Element::Node(inner) = child {
                        self.traverse_node(inner, child_offset);
                    }
                    child_offset += child.text_len();
                }
            }
        }
    }
}

/// Helper function to run a visitor on a tree
pub fn visit<V: Visitor>(visitor: &mut V, tree: &SourceTree) {
    visitor.visit_tree(tree);
}
