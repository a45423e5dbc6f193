//! unstatic-core: Syntax trees and the modifier rewriting engine
//!
//! This crate provides:
//! - `parse()`: Lossless parser for C#-like sources into a `SourceTree`
//! - `ProjectSet`: Ordered mapping from unit identifier to syntax tree
//! - `strip_modifier()`: Remove a modifier from one declaration or member
//! - `rewrite_members()`: Remove a modifier from a declaration's direct members
//! - `rewrite_project()`: Rewrite one target declaration across a project
//! - `Rewriter`/`rewrite_node()`: Persistent top-down tree rewriting
//! - `Visitor`: Trait for traversing syntax trees

mod driver;
mod lexer;
mod parser;
mod project;
pub mod rewrite;
pub mod span;
pub mod syntax;
pub mod visitor;

pub use driver::{rewrite_project, ModifierRewrite};
pub use parser::{parse, ParseError};
pub use project::{ProjectError, ProjectSet, UnitId};
pub use rewrite::{
    rewrite_members, rewrite_members_of, rewrite_node, strip_modifier, HasModifiers,
    MemberKinds, Rewrite, Rewriter,
};
pub use span::{line_column, Span};
pub use syntax::{
    Declaration, DeclarationKind, Generation, Member, MemberKind, Node, NodeHandle, NodeId,
    SourceTree, Token, TokenKind, Trivia,
};
pub use visitor::{visit, Visitor};
