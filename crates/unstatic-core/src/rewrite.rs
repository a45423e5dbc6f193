//! Modifier stripping and persistent tree rewriting
//!
//! Nodes are immutable and shared through `Arc`. Rewriting a node produces a
//! new node; its ancestors are rebuilt on the way back up while every
//! untouched sibling subtree is shared with the previous tree.

use std::sync::Arc;

use crate::syntax::{
    Declaration, Element, Member, MemberKind, Node, Token, Trivia, TriviaKind, TriviaPiece,
};

/// Nodes that carry a modifier list
pub trait HasModifiers: Clone {
    fn modifiers(&self) -> &[Token];

    fn modifiers_mut(&mut self) -> &mut Vec<Token>;

    /// The first token following the modifier list
    fn anchor_mut(&mut self) -> Option<&mut Token>;

    fn leading_trivia(&self) -> Trivia;

    fn trailing_trivia(&self) -> Trivia;

    fn with_leading_trivia(self, trivia: Trivia) -> Self;

    fn with_trailing_trivia(self, trivia: Trivia) -> Self;

    fn has_modifier(&self, text: &str) -> bool {
        self.modifiers().iter().any(|m| m.is(text))
    }
}

impl HasModifiers for Declaration {
    fn modifiers(&self) -> &[Token] {
        &self.modifiers
    }

    fn modifiers_mut(&mut self) -> &mut Vec<Token> {
        &mut self.modifiers
    }

    fn anchor_mut(&mut self) -> Option<&mut Token> {
        self.keywords.first_mut()
    }

    fn leading_trivia(&self) -> Trivia {
        self.first_token().leading_trivia().clone()
    }

    fn trailing_trivia(&self) -> Trivia {
        self.last_token().trailing_trivia().clone()
    }

    fn with_leading_trivia(mut self, trivia: Trivia) -> Self {
        self.first_token_mut().set_leading_trivia(trivia);
        self
    }

    fn with_trailing_trivia(mut self, trivia: Trivia) -> Self {
        self.last_token_mut().set_trailing_trivia(trivia);
        self
    }
}

impl HasModifiers for Member {
    fn modifiers(&self) -> &[Token] {
        &self.modifiers
    }

    fn modifiers_mut(&mut self) -> &mut Vec<Token> {
        &mut self.modifiers
    }

    fn anchor_mut(&mut self) -> Option<&mut Token> {
        self.tokens.first_mut()
    }

    fn leading_trivia(&self) -> Trivia {
        self.first_token()
            .map(|t| t.leading_trivia().clone())
            .unwrap_or_default()
    }

    fn trailing_trivia(&self) -> Trivia {
        self.last_token()
            .map(|t| t.trailing_trivia().clone())
            .unwrap_or_default()
    }

    fn with_leading_trivia(mut self, trivia: Trivia) -> Self {
        if let Some(token) = self.first_token_mut() {
            token.set_leading_trivia(trivia);
        }
        self
    }

    fn with_trailing_trivia(mut self, trivia: Trivia) -> Self {
        if let Some(token) = self.last_token_mut() {
            token.set_trailing_trivia(trivia);
        }
        self
    }
}

/// Remove every modifier whose text equals `modifier`
///
/// The layout in front of a removed modifier moves onto the token that
/// follows it, so indentation survives when the modifier is not the first
/// token of the node. Comments attached to either side of the removed token
/// are kept. A modifier that ends its line hands the line break to the
/// modifier before it, so the following token stays on its own line. The
/// node's own leading and trailing trivia are reattached after filtering. A
/// node without the modifier is returned unchanged.
pub fn strip_modifier<N: HasModifiers>(node: &N, modifier: &str) -> N {
    if !node.has_modifier(modifier) {
        return node.clone();
    }

    let leading = node.leading_trivia();
    let trailing = node.trailing_trivia();
    let mut stripped = node.clone();

    let mut kept: Vec<Token> = Vec::with_capacity(stripped.modifiers().len());
    let mut carried: Option<Trivia> = None;
    for token in std::mem::take(stripped.modifiers_mut()) {
        if token.is(modifier) {
            let previous = if carried.is_none() { kept.last_mut() } else { None };
            carried = Some(carry(carried, &token, previous));
        } else if let Some(trivia) = carried.take() {
            let trivia = join(trivia, token.leading_trivia());
            kept.push(token.with_leading_trivia(trivia));
        } else {
            kept.push(token);
        }
    }
    *stripped.modifiers_mut() = kept;

    if let Some(trivia) = carried {
        if let Some(anchor) = stripped.anchor_mut() {
            let trivia = join(trivia, anchor.leading_trivia());
            anchor.set_leading_trivia(trivia);
        }
    }

    let first = reattach(leading, &stripped.leading_trivia());
    stripped
        .with_leading_trivia(first)
        .with_trailing_trivia(trailing)
}

/// Trivia to keep from a removed token
///
/// A line break that ends the removed token moves to `previous` when that
/// token does not end its own line yet.
fn carry(carried: Option<Trivia>, removed: &Token, previous: Option<&mut Token>) -> Trivia {
    let mut trivia = match carried {
        Some(trivia) => trivia.concat(removed.leading_trivia()),
        None => removed.leading_trivia().clone(),
    };
    let after: Vec<TriviaPiece> = removed
        .trailing_trivia()
        .pieces()
        .iter()
        .skip_while(|piece| piece.kind == TriviaKind::Whitespace)
        .cloned()
        .collect();
    let after = Trivia::new(after);

    if after.has_comment() {
        trivia = trivia.concat(&after);
    } else if ends_line(&after) {
        if let Some(previous) = previous.filter(|p| !ends_line(p.trailing_trivia())) {
            let line = trim_end(previous.trailing_trivia()).concat(&after);
            previous.set_trailing_trivia(line);
        }
    }
    trivia
}

/// Places carried trivia in front of a token. Plain whitespace of the token
/// is dropped unless the carried trivia leaves the token at a line start.
fn join(carried: Trivia, existing: &Trivia) -> Trivia {
    if carried.is_empty() || ends_line(&carried) || existing.has_comment() {
        carried.concat(existing)
    } else {
        carried
    }
}

/// The node's original leading trivia in front of its new first token
fn reattach(leading: Trivia, current: &Trivia) -> Trivia {
    if current.pieces().starts_with(leading.pieces()) {
        current.clone()
    } else {
        leading.concat(&trim_start(current))
    }
}

fn ends_line(trivia: &Trivia) -> bool {
    trivia
        .pieces()
        .last()
        .is_some_and(|piece| piece.kind == TriviaKind::Newline)
}

fn trim_start(trivia: &Trivia) -> Trivia {
    Trivia::new(
        trivia
            .pieces()
            .iter()
            .skip_while(|piece| piece.kind == TriviaKind::Whitespace)
            .cloned()
            .collect(),
    )
}

fn trim_end(trivia: &Trivia) -> Trivia {
    let pieces = trivia.pieces();
    let end = pieces
        .iter()
        .rposition(|piece| piece.kind != TriviaKind::Whitespace)
        .map_or(0, |index| index + 1);
    Trivia::new(pieces[..end].to_vec())
}

/// Set of member kinds that take part in a member rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKinds(u16);

impl MemberKinds {
    pub const NONE: MemberKinds = MemberKinds(0);
    pub const METHODS: MemberKinds = MemberKinds(1 << MemberKind::Method as u16);
    pub const ALL: MemberKinds = MemberKinds((1 << MemberKind::ALL.len()) - 1);

    pub fn contains(self, kind: MemberKind) -> bool {
        self.0 & (1 << kind as u16) != 0
    }

    pub fn with(self, kind: MemberKind) -> Self {
        MemberKinds(self.0 | (1 << kind as u16))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = MemberKind> {
        MemberKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

/// Only methods participate unless configured otherwise
impl Default for MemberKinds {
    fn default() -> Self {
        MemberKinds::METHODS
    }
}

impl FromIterator<MemberKind> for MemberKinds {
    fn from_iter<I: IntoIterator<Item = MemberKind>>(iter: I) -> Self {
        iter.into_iter().fold(MemberKinds::NONE, MemberKinds::with)
    }
}

/// Strip `modifier` from the methods declared directly in `scope`
pub fn rewrite_members(scope: &Declaration, modifier: &str) -> Declaration {
    rewrite_members_of(scope, modifier, MemberKinds::default())
}

/// Strip `modifier` from the members of the given kinds declared directly in
/// `scope`. Members of nested declarations are left alone.
pub fn rewrite_members_of(scope: &Declaration, modifier: &str, kinds: MemberKinds) -> Declaration {
    let Some(body) = scope.body() else {
        return scope.clone();
    };

    let mut changed = false;
    let items: Vec<Node> = body
        .items()
        .iter()
        .map(|item| match item {
            Node::Member(member)
                if kinds.contains(member.kind()) && member.has_modifier(modifier) =>
            {
                changed = true;
                Node::Member(Arc::new(strip_modifier(member.as_ref(), modifier)))
            }
            other => other.clone(),
        })
        .collect();

    if !changed {
        return scope.clone();
    }
    scope.with_body(body.with_items(items))
}

/// What a [`Rewriter`] wants done with a node
#[derive(Debug)]
pub enum Rewrite {
    /// Substitute the node; its subtree is not visited
    Replace(Node),
    /// Visit the node's children
    Descend,
    /// Leave the whole subtree as is
    Keep,
}

/// Decides, node by node, how a tree is rewritten
pub trait Rewriter {
    fn rewrite(&mut self, node: &Node) -> Rewrite;
}

/// Apply a rewriter top-down
///
/// Returns `None` when nothing changed. Otherwise returns the new node with
/// every ancestor of a replaced node rebuilt and every other subtree shared.
pub fn rewrite_node<R: Rewriter + ?Sized>(rewriter: &mut R, node: &Node) -> Option<Node> {
    match rewriter.rewrite(node) {
        Rewrite::Replace(new) => Some(new),
        Rewrite::Keep => None,
        Rewrite::Descend => match node {
            Node::Declaration(decl) => {
                let body = decl.body()?;
                let items = rewrite_items(rewriter, body.items())?;
                Some(Node::Declaration(Arc::new(
                    decl.with_body(body.with_items(items)),
                )))
            }
            Node::Member(_) => None,
            Node::Other(other) => {
                let mut children: Option<Vec<Element>> = None;
                for (index, child) in other.children().iter().enumerate() {
                    let Element::Node(inner) = child else {
                        continue;
                    };
                    if let Some(new) = rewrite_node(rewriter, inner) {
                        children.get_or_insert_with(|| other.children().to_vec())[index] =
                            Element::Node(new);
                    }
                }
                children.map(|c| Node::Other(Arc::new(other.with_children(c))))
            }
        },
    }
}

fn rewrite_items<R: Rewriter + ?Sized>(rewriter: &mut R, items: &[Node]) -> Option<Vec<Node>> {
    let mut rewritten: Option<Vec<Node>> = None;
    for (index, item) in items.iter().enumerate() {
        if let Some(new) = rewrite_node(rewriter, item) {
            rewritten.get_or_insert_with(|| items.to_vec())[index] = new;
        }
    }
    rewritten
}
