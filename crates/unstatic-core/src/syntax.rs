//! Lossless, immutable syntax tree for C#-like sources
//!
//! Trivia (whitespace, comments, preprocessor lines) is attached to tokens the
//! way Roslyn does it: a token's trailing trivia runs up to and including the
//! end of its line, everything else belongs to the leading trivia of the next
//! token. Nodes are reference counted so a rewrite can share every subtree it
//! did not touch with the previous generation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Kinds of trivia pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    /// `#region`, `#if`, `#pragma` and friends
    Directive,
}

/// A single piece of trivia with its verbatim text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriviaPiece {
    pub kind: TriviaKind,
    pub text: String,
}

impl TriviaPiece {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Ordered trivia attached to one edge of a token
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Trivia {
    pieces: Vec<TriviaPiece>,
}

impl Trivia {
    pub fn new(pieces: Vec<TriviaPiece>) -> Self {
        Self { pieces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn pieces(&self) -> &[TriviaPiece] {
        &self.pieces
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Length of the trivia text in bytes
    pub fn len(&self) -> usize {
        self.pieces.iter().map(|p| p.text.len()).sum()
    }

    /// Returns `self` followed by `other`
    pub fn concat(mut self, other: &Trivia) -> Self {
        self.pieces.extend(other.pieces.iter().cloned());
        self
    }

    pub fn has_comment(&self) -> bool {
        self.pieces
            .iter()
            .any(|p| matches!(p.kind, TriviaKind::LineComment | TriviaKind::BlockComment))
    }

    pub fn write_to(&self, out: &mut String) {
        for piece in &self.pieces {
            out.push_str(&piece.text);
        }
    }
}

impl fmt::Display for Trivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in &self.pieces {
            f.write_str(&piece.text)?;
        }
        Ok(())
    }
}

/// Lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    String,
    Char,
    Punct,
    Eof,
}

/// A token with its attached trivia
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    text: String,
    leading: Trivia,
    trailing: Trivia,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading: Trivia::empty(),
            trailing: Trivia::empty(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The token text without trivia
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn leading_trivia(&self) -> &Trivia {
        &self.leading
    }

    pub fn trailing_trivia(&self) -> &Trivia {
        &self.trailing
    }

    pub fn with_leading_trivia(mut self, trivia: Trivia) -> Self {
        self.leading = trivia;
        self
    }

    pub fn with_trailing_trivia(mut self, trivia: Trivia) -> Self {
        self.trailing = trivia;
        self
    }

    pub(crate) fn set_leading_trivia(&mut self, trivia: Trivia) {
        self.leading = trivia;
    }

    pub(crate) fn set_trailing_trivia(&mut self, trivia: Trivia) {
        self.trailing = trivia;
    }

    /// Length including leading and trailing trivia
    pub fn full_len(&self) -> usize {
        self.leading.len() + self.text.len() + self.trailing.len()
    }

    pub fn write_to(&self, out: &mut String) {
        self.leading.write_to(out);
        out.push_str(&self.text);
        self.trailing.write_to(out);
    }
}

/// Identity of a node within one tree generation, assigned in pre-order at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Process-unique tag of one immutable tree snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

impl Generation {
    fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque reference to a node, only meaningful for the generation it was
/// captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub generation: Generation,
    pub node: NodeId,
}

/// Kinds of type declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Struct,
    Interface,
    Record,
    RecordStruct,
    Enum,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Record => "record",
            DeclarationKind::RecordStruct => "record struct",
            DeclarationKind::Enum => "enum",
        }
    }
}

/// Kinds of member declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Constructor,
    Destructor,
    Field,
    Property,
    Indexer,
    Event,
    Operator,
    Delegate,
    EnumMember,
}

impl MemberKind {
    pub const ALL: [MemberKind; 10] = [
        MemberKind::Method,
        MemberKind::Constructor,
        MemberKind::Destructor,
        MemberKind::Field,
        MemberKind::Property,
        MemberKind::Indexer,
        MemberKind::Event,
        MemberKind::Operator,
        MemberKind::Delegate,
        MemberKind::EnumMember,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::Destructor => "destructor",
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Indexer => "indexer",
            MemberKind::Event => "event",
            MemberKind::Operator => "operator",
            MemberKind::Delegate => "delegate",
            MemberKind::EnumMember => "enum_member",
        }
    }

    pub fn from_str(s: &str) -> Option<MemberKind> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }
}

/// Kinds of nodes that are neither declarations nor members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtherKind {
    CompilationUnit,
    Namespace,
    /// `using`, `global using` and `extern alias` directives
    UsingDirective,
    /// Top-level statements, stray attributes and anything else kept verbatim
    Unknown,
}

/// A node in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Declaration(Arc<Declaration>),
    Member(Arc<Member>),
    Other(Arc<Other>),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Declaration(decl) => decl.id,
            Node::Member(member) => member.id,
            Node::Other(other) => other.id,
        }
    }

    /// Reference identity: both values point at the same shared node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Declaration(a), Node::Declaration(b)) => Arc::ptr_eq(a, b),
            (Node::Member(a), Node::Member(b)) => Arc::ptr_eq(a, b),
            (Node::Other(a), Node::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_declaration(&self) -> Option<&Declaration> {
        match self {
            Node::Declaration(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Node::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        match self {
            Node::Declaration(decl) => Some(decl.first_token()),
            Node::Member(member) => member.first_token(),
            Node::Other(other) => other.first_token(),
        }
    }

    pub fn last_token(&self) -> Option<&Token> {
        match self {
            Node::Declaration(decl) => Some(decl.last_token()),
            Node::Member(member) => member.last_token(),
            Node::Other(other) => other.last_token(),
        }
    }

    pub fn leading_trivia(&self) -> Trivia {
        self.first_token()
            .map(|t| t.leading_trivia().clone())
            .unwrap_or_default()
    }

    pub fn trailing_trivia(&self) -> Trivia {
        self.last_token()
            .map(|t| t.trailing_trivia().clone())
            .unwrap_or_default()
    }

    /// Full text length including trivia
    pub fn text_len(&self) -> usize {
        match self {
            Node::Declaration(decl) => decl.text_len(),
            Node::Member(member) => member.text_len(),
            Node::Other(other) => other.text_len(),
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Node::Declaration(decl) => decl.write_to(out),
            Node::Member(member) => member.write_to(out),
            Node::Other(other) => other.write_to(out),
        }
    }

    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.text_len());
        self.write_to(&mut out);
        out
    }
}

/// A child of an [`Other`] node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Node(Node),
    Token(Token),
}

impl Element {
    pub fn text_len(&self) -> usize {
        match self {
            Element::Node(node) => node.text_len(),
            Element::Token(token) => token.full_len(),
        }
    }

    fn first_token(&self) -> Option<&Token> {
        match self {
            Element::Node(node) => node.first_token(),
            Element::Token(token) => Some(token),
        }
    }

    fn last_token(&self) -> Option<&Token> {
        match self {
            Element::Node(node) => node.last_token(),
            Element::Token(token) => Some(token),
        }
    }
}

/// Braced body of a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub(crate) open: Token,
    pub(crate) items: Vec<Node>,
    pub(crate) close: Token,
}

impl Body {
    pub fn open(&self) -> &Token {
        &self.open
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn close(&self) -> &Token {
        &self.close
    }

    pub(crate) fn with_items(&self, items: Vec<Node>) -> Self {
        Self {
            open: self.open.clone(),
            items,
            close: self.close.clone(),
        }
    }

    fn text_len(&self) -> usize {
        self.open.full_len()
            + self.items.iter().map(Node::text_len).sum::<usize>()
            + self.close.full_len()
    }
}

/// A type declaration (class-like construct)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub(crate) id: NodeId,
    pub(crate) kind: DeclarationKind,
    pub(crate) attributes: Vec<Token>,
    pub(crate) modifiers: Vec<Token>,
    /// `class`, or `record` followed by an optional `class`/`struct`
    pub(crate) keywords: Vec<Token>,
    pub(crate) name: Token,
    /// Type parameters, primary constructor, base list and constraints
    pub(crate) header: Vec<Token>,
    pub(crate) body: Option<Body>,
    pub(crate) terminator: Option<Token>,
}

impl Declaration {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.name.text()
    }

    pub fn name_token(&self) -> &Token {
        &self.name
    }

    pub fn attributes(&self) -> &[Token] {
        &self.attributes
    }

    pub fn modifiers(&self) -> &[Token] {
        &self.modifiers
    }

    pub fn header(&self) -> &[Token] {
        &self.header
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Direct child nodes of the body, empty for body-less declarations
    pub fn members(&self) -> &[Node] {
        self.body.as_ref().map(|b| b.items.as_slice()).unwrap_or(&[])
    }

    pub fn has_modifier(&self, text: &str) -> bool {
        self.modifiers.iter().any(|m| m.is(text))
    }

    pub fn first_token(&self) -> &Token {
        self.attributes
            .first()
            .or_else(|| self.modifiers.first())
            .or_else(|| self.keywords.first())
            .unwrap_or(&self.name)
    }

    pub fn last_token(&self) -> &Token {
        if let Some(terminator) = &self.terminator {
            return terminator;
        }
        if let Some(body) = &self.body {
            return &body.close;
        }
        self.header.last().unwrap_or(&self.name)
    }

    pub(crate) fn first_token_mut(&mut self) -> &mut Token {
        if let Some(token) = self.attributes.first_mut() {
            return token;
        }
        if let Some(token) = self.modifiers.first_mut() {
            return token;
        }
        if let Some(token) = self.keywords.first_mut() {
            return token;
        }
        &mut self.name
    }

    pub(crate) fn last_token_mut(&mut self) -> &mut Token {
        if let Some(terminator) = self.terminator.as_mut() {
            return terminator;
        }
        if let Some(body) = self.body.as_mut() {
            return &mut body.close;
        }
        self.header.last_mut().unwrap_or(&mut self.name)
    }

    /// Byte offset of the name token's text, given the offset where this
    /// declaration (including its leading trivia) starts.
    pub fn name_offset(&self, start: usize) -> usize {
        let before: usize = self
            .attributes
            .iter()
            .chain(&self.modifiers)
            .chain(&self.keywords)
            .map(Token::full_len)
            .sum();
        start + before + self.name.leading_trivia().len()
    }

    /// Byte offset where the body items start, given the declaration start
    pub(crate) fn items_offset(&self, start: usize) -> usize {
        let before: usize = self
            .attributes
            .iter()
            .chain(&self.modifiers)
            .chain(&self.keywords)
            .chain(std::iter::once(&self.name))
            .chain(&self.header)
            .map(Token::full_len)
            .sum();
        let open = self.body.as_ref().map(|b| b.open.full_len()).unwrap_or(0);
        start + before + open
    }

    pub(crate) fn with_body(&self, body: Body) -> Self {
        Self {
            body: Some(body),
            ..self.clone()
        }
    }

    pub fn text_len(&self) -> usize {
        self.attributes
            .iter()
            .chain(&self.modifiers)
            .chain(&self.keywords)
            .chain(std::iter::once(&self.name))
            .chain(&self.header)
            .chain(&self.terminator)
            .map(Token::full_len)
            .sum::<usize>()
            + self.body.as_ref().map(Body::text_len).unwrap_or(0)
    }

    pub fn write_to(&self, out: &mut String) {
        for token in self
            .attributes
            .iter()
            .chain(&self.modifiers)
            .chain(&self.keywords)
            .chain(std::iter::once(&self.name))
            .chain(&self.header)
        {
            token.write_to(out);
        }
        if let Some(body) = &self.body {
            body.open.write_to(out);
            for item in &body.items {
                item.write_to(out);
            }
            body.close.write_to(out);
        }
        if let Some(terminator) = &self.terminator {
            terminator.write_to(out);
        }
    }
}

/// A member declaration (method, field, property, ...) kept verbatim after
/// its modifier list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub(crate) id: NodeId,
    pub(crate) kind: MemberKind,
    pub(crate) attributes: Vec<Token>,
    pub(crate) modifiers: Vec<Token>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) name: Option<usize>,
}

impl Member {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name
            .and_then(|index| self.tokens.get(index))
            .map(Token::text)
    }

    pub fn attributes(&self) -> &[Token] {
        &self.attributes
    }

    pub fn modifiers(&self) -> &[Token] {
        &self.modifiers
    }

    /// Tokens after the modifier list (type, name, parameters, body)
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn has_modifier(&self, text: &str) -> bool {
        self.modifiers.iter().any(|m| m.is(text))
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.attributes
            .first()
            .or_else(|| self.modifiers.first())
            .or_else(|| self.tokens.first())
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.tokens
            .last()
            .or_else(|| self.modifiers.last())
            .or_else(|| self.attributes.last())
    }

    pub(crate) fn first_token_mut(&mut self) -> Option<&mut Token> {
        if let Some(token) = self.attributes.first_mut() {
            return Some(token);
        }
        if let Some(token) = self.modifiers.first_mut() {
            return Some(token);
        }
        self.tokens.first_mut()
    }

    pub(crate) fn last_token_mut(&mut self) -> Option<&mut Token> {
        if !self.tokens.is_empty() {
            return self.tokens.last_mut();
        }
        if !self.modifiers.is_empty() {
            return self.modifiers.last_mut();
        }
        self.attributes.last_mut()
    }

    pub fn text_len(&self) -> usize {
        self.attributes
            .iter()
            .chain(&self.modifiers)
            .chain(&self.tokens)
            .map(Token::full_len)
            .sum()
    }

    pub fn write_to(&self, out: &mut String) {
        for token in self
            .attributes
            .iter()
            .chain(&self.modifiers)
            .chain(&self.tokens)
        {
            token.write_to(out);
        }
    }
}

/// Any other node: the compilation unit, namespaces, using directives and
/// unrecognized token runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Other {
    pub(crate) id: NodeId,
    pub(crate) kind: OtherKind,
    pub(crate) children: Vec<Element>,
}

impl Other {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> OtherKind {
        self.kind
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn with_children(&self, children: Vec<Element>) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            children,
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.children.iter().find_map(Element::first_token)
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.children.iter().rev().find_map(Element::last_token)
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Element::text_len).sum()
    }

    pub fn write_to(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Element::Node(node) => node.write_to(out),
                Element::Token(token) => token.write_to(out),
            }
        }
    }
}

/// One immutable generation of a unit's syntax tree
#[derive(Debug, Clone)]
pub struct SourceTree {
    generation: Generation,
    root: Node,
}

impl SourceTree {
    /// Wraps a root node as a fresh generation
    pub(crate) fn from_root(root: Node) -> Self {
        Self {
            generation: Generation::next(),
            root,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Captures a handle to a node of this generation
    pub fn handle(&self, node: NodeId) -> NodeHandle {
        NodeHandle {
            generation: self.generation,
            node,
        }
    }

    /// Returns true if the handle was captured from this generation
    pub fn owns(&self, handle: NodeHandle) -> bool {
        handle.generation == self.generation
    }

    /// Finds the declaration a handle refers to, if it belongs to this
    /// generation
    pub fn declaration(&self, handle: NodeHandle) -> Option<&Declaration> {
        if !self.owns(handle) {
            return None;
        }
        find_declaration(&self.root, handle.node)
    }

    /// Both trees are the same generation value
    pub fn same_generation(&self, other: &SourceTree) -> bool {
        self.generation == other.generation && self.root.ptr_eq(&other.root)
    }

    /// Renders the tree back to source text
    pub fn text(&self) -> String {
        self.root.text()
    }
}

/// Structural equality of the trees, regardless of generation
impl PartialEq for SourceTree {
    fn eq(&self, other: &Self) -> bool {
        self.root.ptr_eq(&other.root) || self.root == other.root
    }
}

impl Eq for SourceTree {}

impl fmt::Display for SourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn find_declaration(node: &Node, id: NodeId) -> Option<&Declaration> {
    match node {
        Node::Declaration(decl) => {
            if decl.id == id {
                return Some(decl);
            }
            decl.members().iter().find_map(|n| find_declaration(n, id))
        }
        Node::Member(_) => None,
        Node::Other(other) => other.children.iter().find_map(|child| match child {
            Element::Node(n) => find_declaration(n, id),
            Element::Token(_) => None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_len_and_concat() {
        let a = Trivia::new(vec![TriviaPiece::new(TriviaKind::Newline, "\n")]);
        let b = Trivia::new(vec![
            TriviaPiece::new(TriviaKind::Whitespace, "    "),
            TriviaPiece::new(TriviaKind::LineComment, "// note"),
        ]);
        let joined = a.concat(&b);
        assert_eq!(joined.len(), 12);
        assert_eq!(joined.to_string(), "\n    // note");
        assert!(joined.has_comment());
    }

    #[test]
    fn test_token_full_len() {
        let token = Token::new(TokenKind::Keyword, "static")
            .with_leading_trivia(Trivia::new(vec![TriviaPiece::new(
                TriviaKind::Whitespace,
                "  ",
            )]))
            .with_trailing_trivia(Trivia::new(vec![TriviaPiece::new(
                TriviaKind::Whitespace,
                " ",
            )]));
        assert_eq!(token.full_len(), 9);
        let mut out = String::new();
        token.write_to(&mut out);
        assert_eq!(out, "  static ");
    }

    #[test]
    fn test_member_kind_from_str() {
        assert_eq!(MemberKind::from_str("method"), Some(MemberKind::Method));
        assert_eq!(MemberKind::from_str("Property"), Some(MemberKind::Property));
        assert_eq!(
            MemberKind::from_str("enum-member"),
            Some(MemberKind::EnumMember)
        );
        assert_eq!(MemberKind::from_str("lambda"), None);
    }

    #[test]
    fn test_generations_are_unique() {
        let root = Node::Other(Arc::new(Other {
            id: NodeId(0),
            kind: OtherKind::CompilationUnit,
            children: vec![Element::Token(Token::new(TokenKind::Eof, ""))],
        }));
        let first = SourceTree::from_root(root.clone());
        let second = SourceTree::from_root(root);
        assert_ne!(first.generation(), second.generation());
        assert_eq!(first, second);
        assert!(!first.same_generation(&second));
    }
}
