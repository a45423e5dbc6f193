//! Recursive-descent parser producing a lossless [`SourceTree`]
//!
//! Only the declaration structure is parsed: namespaces, type declarations,
//! their modifiers and their members. Member bodies, expressions and
//! statements are kept as balanced token runs.

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;

use crate::lexer::{tokenize, Lexed};
use crate::span::line_column;
use crate::syntax::{
    Body, Declaration, DeclarationKind, Element, Member, MemberKind, Node, NodeId, Other,
    OtherKind, SourceTree, Token, TokenKind,
};

/// Errors that can occur while parsing a unit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unterminated {what} starting at {line}:{column}")]
    Unterminated {
        what: &'static str,
        line: usize,
        column: usize,
    },

    #[error("Unexpected `{found}` at {line}:{column}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        line: usize,
        column: usize,
    },

    #[error("Unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

/// Keywords that are always modifiers in modifier position
const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "sealed", "virtual",
    "override", "readonly", "const", "extern", "unsafe", "volatile", "new",
];

/// Contextual keywords that are modifiers when another word follows them
const CONTEXTUAL_MODIFIERS: &[&str] = &["partial", "async", "required", "file"];

/// Parse a C#-like source file into a syntax tree
pub fn parse(source: &str) -> Result<SourceTree, ParseError> {
    let Lexed { tokens, starts } = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens: tokens.into(),
        starts: starts.into(),
        next_id: 0,
        eof: Token::new(TokenKind::Eof, ""),
    };
    let root = parser.compilation_unit()?;
    Ok(SourceTree::from_root(root))
}

struct Parser<'s> {
    source: &'s str,
    tokens: VecDeque<Token>,
    starts: VecDeque<usize>,
    next_id: u32,
    eof: Token,
}

impl<'s> Parser<'s> {
    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn peek(&self, n: usize) -> &Token {
        self.tokens
            .get(n)
            .or_else(|| self.tokens.back())
            .unwrap_or(&self.eof)
    }

    fn at(&self, text: &str) -> bool {
        let token = self.peek(0);
        token.kind() != TokenKind::String && token.is(text)
    }

    fn at_eof(&self) -> bool {
        self.peek(0).kind() == TokenKind::Eof
    }

    fn bump(&mut self) -> Token {
        self.starts.pop_front();
        self.tokens
            .pop_front()
            .unwrap_or_else(|| self.eof.clone())
    }

    fn expect(&mut self, text: &str, expected: &'static str) -> Result<Token, ParseError> {
        if self.at(text) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        if self.at_eof() {
            return ParseError::UnexpectedEof { expected };
        }
        let offset = self.starts.front().copied().unwrap_or(self.source.len());
        let (line, column) = line_column(self.source, offset);
        ParseError::UnexpectedToken {
            found: self.peek(0).text().to_string(),
            expected,
            line,
            column,
        }
    }

    fn compilation_unit(&mut self) -> Result<Node, ParseError> {
        let id = self.alloc_id();
        let mut children: Vec<Element> = self
            .namespace_items()?
            .into_iter()
            .map(Element::Node)
            .collect();
        if !self.at_eof() {
            return Err(self.unexpected("a declaration"));
        }
        children.push(Element::Token(self.bump()));
        Ok(Node::Other(Arc::new(Other {
            id,
            kind: OtherKind::CompilationUnit,
            children,
        })))
    }

    fn namespace_items(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        while !self.at_eof() && !self.at("}") {
            items.push(self.namespace_item()?);
        }
        Ok(items)
    }

    fn namespace_item(&mut self) -> Result<Node, ParseError> {
        let starts_directive = self.at("using")
            || (self.at("global") && self.peek(1).is("using"))
            || (self.at("extern") && self.peek(1).is("alias"));
        if starts_directive {
            let id = self.alloc_id();
            let tokens = self.member_tokens()?;
            return Ok(other(id, OtherKind::UsingDirective, tokens));
        }
        if self.at("namespace") {
            return self.namespace();
        }

        let id = self.alloc_id();
        let attributes = self.attributes()?;
        let modifiers = self.modifiers();
        if let Some(kind) = self.declaration_keyword() {
            return self.declaration(id, attributes, modifiers, kind);
        }
        if self.at("delegate") {
            return self.member(id, attributes, modifiers, "");
        }

        let mut tokens = attributes;
        let only_attributes = modifiers.is_empty();
        tokens.extend(modifiers);
        let ends_here = self.at_eof()
            || self.at("}")
            || self.at("namespace")
            || self.at("using")
            || self.at("global");
        if !(only_attributes && ends_here && !tokens.is_empty()) {
            tokens.extend(self.member_tokens()?);
        }
        Ok(other(id, OtherKind::Unknown, tokens))
    }

    fn namespace(&mut self) -> Result<Node, ParseError> {
        let id = self.alloc_id();
        let mut children = vec![Element::Token(self.bump())];

        while !self.at("{") && !self.at(";") {
            if self.at_eof() || self.at("}") {
                return Err(self.unexpected("`{` or `;`"));
            }
            children.push(Element::Token(self.bump()));
        }

        if self.at(";") {
            // File-scoped: the namespace owns the rest of the file
            children.push(Element::Token(self.bump()));
            children.extend(self.namespace_items()?.into_iter().map(Element::Node));
        } else {
            children.push(Element::Token(self.bump()));
            children.extend(self.namespace_items()?.into_iter().map(Element::Node));
            children.push(Element::Token(self.expect("}", "`}`")?));
            if self.at(";") {
                children.push(Element::Token(self.bump()));
            }
        }

        Ok(Node::Other(Arc::new(Other {
            id,
            kind: OtherKind::Namespace,
            children,
        })))
    }

    fn attributes(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while self.at("[") {
            self.balanced(&mut tokens)?;
        }
        Ok(tokens)
    }

    fn modifiers(&mut self) -> Vec<Token> {
        let mut modifiers = Vec::new();
        while self.at_modifier() {
            modifiers.push(self.bump());
        }
        modifiers
    }

    fn at_modifier(&self) -> bool {
        let token = self.peek(0);
        match token.kind() {
            TokenKind::Keyword if token.is("ref") => self.peek(1).is("struct"),
            TokenKind::Keyword => MODIFIERS.contains(&token.text()),
            TokenKind::Identifier => {
                CONTEXTUAL_MODIFIERS.contains(&token.text())
                    && matches!(
                        self.peek(1).kind(),
                        TokenKind::Identifier | TokenKind::Keyword
                    )
            }
            _ => false,
        }
    }

    fn declaration_keyword(&self) -> Option<DeclarationKind> {
        let token = self.peek(0);
        match token.text() {
            "class" => Some(DeclarationKind::Class),
            "struct" => Some(DeclarationKind::Struct),
            "interface" => Some(DeclarationKind::Interface),
            "enum" => Some(DeclarationKind::Enum),
            "record" if token.kind() == TokenKind::Identifier => {
                let next = self.peek(1);
                if next.is("struct") {
                    Some(DeclarationKind::RecordStruct)
                } else if next.is("class") || next.kind() == TokenKind::Identifier {
                    Some(DeclarationKind::Record)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn declaration(
        &mut self,
        id: NodeId,
        attributes: Vec<Token>,
        modifiers: Vec<Token>,
        kind: DeclarationKind,
    ) -> Result<Node, ParseError> {
        let mut keywords = vec![self.bump()];
        if keywords[0].is("record") && (self.at("class") || self.at("struct")) {
            keywords.push(self.bump());
        }

        if self.peek(0).kind() != TokenKind::Identifier {
            return Err(self.unexpected("a type name"));
        }
        let name = self.bump();

        let mut header = Vec::new();
        while !self.at("{") && !self.at(";") {
            if self.at_eof() || self.at("}") {
                return Err(self.unexpected("`{` or `;`"));
            }
            if self.at("(") || self.at("[") {
                self.balanced(&mut header)?;
            } else {
                header.push(self.bump());
            }
        }

        let body = if self.at("{") {
            let open = self.bump();
            let items = if kind == DeclarationKind::Enum {
                self.enum_members()?
            } else {
                self.type_members(name.text())?
            };
            let close = self.expect("}", "`}`")?;
            Some(Body { open, items, close })
        } else {
            None
        };
        let terminator = if self.at(";") { Some(self.bump()) } else { None };

        Ok(Node::Declaration(Arc::new(Declaration {
            id,
            kind,
            attributes,
            modifiers,
            keywords,
            name,
            header,
            body,
            terminator,
        })))
    }

    fn type_members(&mut self, type_name: &str) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.unexpected("`}`"));
            }
            let id = self.alloc_id();
            let attributes = self.attributes()?;
            let modifiers = self.modifiers();
            if let Some(kind) = self.declaration_keyword() {
                items.push(self.declaration(id, attributes, modifiers, kind)?);
                continue;
            }
            if self.at("}") {
                return Err(self.unexpected("a member declaration"));
            }
            items.push(self.member(id, attributes, modifiers, type_name)?);
        }
        Ok(items)
    }

    fn member(
        &mut self,
        id: NodeId,
        attributes: Vec<Token>,
        modifiers: Vec<Token>,
        type_name: &str,
    ) -> Result<Node, ParseError> {
        let tokens = self.member_tokens()?;
        let (kind, name) = classify_member(&tokens, type_name);
        Ok(Node::Member(Arc::new(Member {
            id,
            kind,
            attributes,
            modifiers,
            tokens,
            name,
        })))
    }

    fn enum_members(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.unexpected("`}`"));
            }
            let id = self.alloc_id();
            let attributes = self.attributes()?;
            let mut tokens = Vec::new();
            while !self.at("}") {
                if self.at_eof() {
                    return Err(self.unexpected("`}`"));
                }
                if self.at(",") {
                    tokens.push(self.bump());
                    break;
                }
                if self.at("(") || self.at("[") || self.at("{") {
                    self.balanced(&mut tokens)?;
                } else {
                    tokens.push(self.bump());
                }
            }
            let name = tokens
                .iter()
                .position(|t| t.kind() == TokenKind::Identifier);
            items.push(Node::Member(Arc::new(Member {
                id,
                kind: MemberKind::EnumMember,
                attributes,
                modifiers: Vec::new(),
                tokens,
                name,
            })));
        }
        Ok(items)
    }

    /// Tokens of a member after its modifiers, up to and including the `;`
    /// or the closing brace of its body
    fn member_tokens(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut in_expression = false;
        loop {
            if self.at_eof() || self.at("}") {
                return Err(self.unexpected("`;`"));
            }
            if self.at(";") {
                tokens.push(self.bump());
                return Ok(tokens);
            }
            if self.at("=") || self.at("=>") {
                in_expression = true;
                tokens.push(self.bump());
                continue;
            }
            if self.at("{") {
                self.balanced(&mut tokens)?;
                // Property initializers follow the accessor block
                if in_expression || self.at("=") {
                    continue;
                }
                return Ok(tokens);
            }
            if self.at("(") || self.at("[") {
                self.balanced(&mut tokens)?;
                continue;
            }
            tokens.push(self.bump());
        }
    }

    /// Consumes a bracketed run starting at an opening `(`, `[` or `{`
    fn balanced(&mut self, out: &mut Vec<Token>) -> Result<(), ParseError> {
        let mut stack: Vec<&'static str> = Vec::new();
        loop {
            if self.at_eof() {
                return Err(self.unexpected(closer_description(stack.last().copied())));
            }
            let token = self.peek(0);
            if token.kind() == TokenKind::Punct {
                match token.text() {
                    "(" => stack.push(")"),
                    "[" => stack.push("]"),
                    "{" => stack.push("}"),
                    ")" | "]" | "}" => match stack.last().copied() {
                        Some(expected) if token.is(expected) => {
                            stack.pop();
                        }
                        other => return Err(self.unexpected(closer_description(other))),
                    },
                    _ => {}
                }
            }
            out.push(self.bump());
            if stack.is_empty() {
                return Ok(());
            }
        }
    }
}

fn closer_description(closer: Option<&'static str>) -> &'static str {
    match closer {
        Some(")") => "`)`",
        Some("]") => "`]`",
        Some("}") => "`}`",
        _ => "a closing bracket",
    }
}

fn other(id: NodeId, kind: OtherKind, tokens: Vec<Token>) -> Node {
    Node::Other(Arc::new(Other {
        id,
        kind,
        children: tokens.into_iter().map(Element::Token).collect(),
    }))
}

/// Determines a member's kind and the index of its name token
fn classify_member(tokens: &[Token], type_name: &str) -> (MemberKind, Option<usize>) {
    let head_end = tokens
        .iter()
        .position(|t| {
            t.kind() == TokenKind::Punct && matches!(t.text(), "(" | "{" | "=" | "=>" | ";" | ",")
        })
        .unwrap_or(tokens.len());
    let head = &tokens[..head_end];
    let stop = tokens.get(head_end).map(Token::text);
    let name = name_before(tokens, head_end);

    match tokens.first().map(Token::text) {
        Some("event") => return (MemberKind::Event, name),
        Some("delegate") => return (MemberKind::Delegate, name),
        Some("~") => return (MemberKind::Destructor, name),
        _ => {}
    }
    if head.iter().any(|t| t.is("operator")) {
        return (MemberKind::Operator, None);
    }
    if let Some(index) = head
        .windows(2)
        .position(|w| w[0].is("this") && w[1].is("["))
    {
        return (MemberKind::Indexer, Some(index));
    }

    match stop {
        Some("(") if name == Some(0) && tokens[0].is(type_name) => {
            (MemberKind::Constructor, name)
        }
        Some("(") => (MemberKind::Method, name),
        Some("{") | Some("=>") => (MemberKind::Property, name),
        _ => (MemberKind::Field, name),
    }
}

/// Index of the identifier right before `end`, skipping generic arguments
fn name_before(tokens: &[Token], end: usize) -> Option<usize> {
    let mut index = end.checked_sub(1)?;
    if tokens[index].is(">") {
        let mut depth = 0usize;
        loop {
            match tokens[index].text() {
                ">" => depth += 1,
                "<" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            index = index.checked_sub(1)?;
        }
        index = index.checked_sub(1)?;
    }
    (tokens[index].kind() == TokenKind::Identifier).then_some(index)
}
