//! Tokenizer for C#-like sources
//!
//! Produces tokens with attached trivia. Trailing trivia stops after the first
//! newline; everything up to the next token becomes its leading trivia.

use crate::span::line_column;
use crate::syntax::{Token, TokenKind, Trivia, TriviaKind, TriviaPiece};
use crate::ParseError;

/// Reserved words that lex as [`TokenKind::Keyword`]
const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Multi-character operators, longest first. `>>` is deliberately absent so
/// nested generic arguments close one bracket at a time.
const OPERATORS: &[&str] = &[
    "??=", "<<=", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "::", "++", "--", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "->", "<<",
];

/// Output of the lexer: tokens plus the byte offset where each token's text
/// starts (used for error positions)
pub(crate) struct Lexed {
    pub(crate) tokens: Vec<Token>,
    pub(crate) starts: Vec<usize>,
}

pub(crate) fn tokenize(source: &str) -> Result<Lexed, ParseError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
    };
    let mut tokens = Vec::new();
    let mut starts = Vec::new();

    loop {
        let leading = lexer.leading_trivia();
        let start = lexer.pos;
        if lexer.at_end() {
            tokens.push(Token::new(TokenKind::Eof, "").with_leading_trivia(leading));
            starts.push(start);
            break;
        }
        let kind = lexer.token()?;
        let text = &source[start..lexer.pos];
        let trailing = lexer.trailing_trivia();
        tokens.push(
            Token::new(kind, text)
                .with_leading_trivia(leading)
                .with_trailing_trivia(trailing),
        );
        starts.push(start);
    }

    Ok(Lexed { tokens, starts })
}

struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Lexer<'s> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn current_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn unterminated(&self, what: &'static str, start: usize) -> ParseError {
        let (line, column) = line_column(self.source, start);
        ParseError::Unterminated { what, line, column }
    }

    /// True if only spaces/tabs precede `pos` on its line
    fn at_line_start(&self) -> bool {
        self.bytes[..self.pos]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .all(|&b| b == b' ' || b == b'\t')
    }

    fn leading_trivia(&mut self) -> Trivia {
        let mut pieces = Vec::new();
        while let Some(piece) = self.trivia_piece(true) {
            pieces.push(piece);
        }
        Trivia::new(pieces)
    }

    fn trailing_trivia(&mut self) -> Trivia {
        let mut pieces = Vec::new();
        while let Some(piece) = self.trivia_piece(false) {
            let newline = piece.kind == TriviaKind::Newline;
            pieces.push(piece);
            if newline {
                break;
            }
        }
        Trivia::new(pieces)
    }

    fn trivia_piece(&mut self, leading: bool) -> Option<TriviaPiece> {
        let start = self.pos;
        match self.peek()? {
            b' ' | b'\t' | b'\x0c' => {
                while matches!(self.peek(), Some(b' ' | b'\t' | b'\x0c')) {
                    self.pos += 1;
                }
                Some(TriviaPiece::new(
                    TriviaKind::Whitespace,
                    &self.source[start..self.pos],
                ))
            }
            b'\r' if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                Some(TriviaPiece::new(TriviaKind::Newline, "\r\n"))
            }
            b'\n' | b'\r' => {
                self.pos += 1;
                Some(TriviaPiece::new(
                    TriviaKind::Newline,
                    &self.source[start..self.pos],
                ))
            }
            b'/' if self.peek_at(1) == Some(b'/') => {
                while !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
                    self.pos += 1;
                }
                Some(TriviaPiece::new(
                    TriviaKind::LineComment,
                    &self.source[start..self.pos],
                ))
            }
            b'/' if self.peek_at(1) == Some(b'*') => {
                match self.source[start + 2..].find("*/") {
                    Some(end) => self.pos = start + 2 + end + 2,
                    // Reported as an error by the caller via `token`
                    None => return None,
                }
                Some(TriviaPiece::new(
                    TriviaKind::BlockComment,
                    &self.source[start..self.pos],
                ))
            }
            b'#' if leading && self.at_line_start() => {
                while !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
                    self.pos += 1;
                }
                Some(TriviaPiece::new(
                    TriviaKind::Directive,
                    &self.source[start..self.pos],
                ))
            }
            _ => None,
        }
    }

    fn token(&mut self) -> Result<TokenKind, ParseError> {
        let start = self.pos;
        let Some(c) = self.current_char() else {
            return Ok(TokenKind::Eof);
        };

        if c == '/' && self.peek_at(1) == Some(b'*') {
            return Err(self.unterminated("block comment", start));
        }

        // String prefixes: @"..", $"..", $@"..", @$"..", raw """..."""
        if let Some(kind) = self.string_literal(start)? {
            return Ok(kind);
        }

        if c == '\'' {
            self.pos += 1;
            self.quoted(b'\'', false, "character literal", start)?;
            return Ok(TokenKind::Char);
        }

        if c == '@' && self.source[start + 1..].starts_with(is_ident_start) {
            self.pos += 1;
            self.identifier_tail();
            return Ok(TokenKind::Identifier);
        }

        if is_ident_start(c) {
            self.identifier_tail();
            let text = &self.source[start..self.pos];
            return Ok(if KEYWORDS.contains(&text) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            });
        }

        if c.is_ascii_digit() || (c == '.' && matches!(self.peek_at(1), Some(b'0'..=b'9'))) {
            self.number();
            return Ok(TokenKind::Number);
        }

        for op in OPERATORS {
            if self.source[self.pos..].starts_with(op) {
                self.pos += op.len();
                return Ok(TokenKind::Punct);
            }
        }

        self.pos += c.len_utf8();
        Ok(TokenKind::Punct)
    }

    fn identifier_tail(&mut self) {
        while let Some(c) = self.current_char() {
            if c == '_' || c.is_alphanumeric() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn number(&mut self) {
        while let Some(b) = self.peek() {
            let continues = b.is_ascii_alphanumeric()
                || b == b'_'
                || (b == b'.' && matches!(self.peek_at(1), Some(b'0'..=b'9')));
            if !continues {
                break;
            }
            self.pos += 1;
        }
    }

    /// Lexes any string literal form starting at `start`, or returns `None` if
    /// the input does not start a string
    fn string_literal(&mut self, start: usize) -> Result<Option<TokenKind>, ParseError> {
        let rest = &self.source[start..];
        let prefix_len = rest
            .bytes()
            .take_while(|&b| b == b'$' || b == b'@')
            .count();
        if prefix_len > 2 && !rest[prefix_len..].starts_with("\"\"\"") {
            return Ok(None);
        }
        if !rest[prefix_len..].starts_with('"') {
            return Ok(None);
        }
        let prefix = &rest[..prefix_len];
        let verbatim = prefix.contains('@');
        let interpolated = prefix.contains('$');

        self.pos = start + prefix_len;
        let quotes = self.source[self.pos..]
            .bytes()
            .take_while(|&b| b == b'"')
            .count();
        if quotes >= 3 && !verbatim {
            self.raw_string(quotes, start)?;
            return Ok(Some(TokenKind::String));
        }

        self.pos += 1;
        if interpolated {
            self.interpolated(verbatim, start)?;
        } else {
            self.quoted(b'"', verbatim, "string literal", start)?;
        }
        Ok(Some(TokenKind::String))
    }

    /// Scans up to and including the closing `quote`
    fn quoted(
        &mut self,
        quote: u8,
        verbatim: bool,
        what: &'static str,
        start: usize,
    ) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                None => return Err(self.unterminated(what, start)),
                Some(b'\n' | b'\r') if !verbatim => return Err(self.unterminated(what, start)),
                Some(b'\\') if !verbatim => self.pos += 2,
                Some(b) if b == quote => {
                    self.pos += 1;
                    if verbatim && self.peek() == Some(quote) {
                        self.pos += 1;
                        continue;
                    }
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn raw_string(&mut self, quotes: usize, start: usize) -> Result<(), ParseError> {
        self.pos += quotes;
        let closing = "\"".repeat(quotes);
        match self.source[self.pos..].find(&closing) {
            Some(end) => {
                self.pos += end + quotes;
                Ok(())
            }
            None => Err(self.unterminated("raw string literal", start)),
        }
    }

    /// Scans an interpolated string body; holes are lexed as code so nested
    /// strings and braces are balanced
    fn interpolated(&mut self, verbatim: bool, start: usize) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                None => return Err(self.unterminated("interpolated string", start)),
                Some(b'\n' | b'\r') if !verbatim => {
                    return Err(self.unterminated("interpolated string", start))
                }
                Some(b'\\') if !verbatim => self.pos += 2,
                Some(b'{') if self.peek_at(1) == Some(b'{') => self.pos += 2,
                Some(b'}') if self.peek_at(1) == Some(b'}') => self.pos += 2,
                Some(b'{') => {
                    self.pos += 1;
                    self.interpolation_hole(start)?;
                }
                Some(b'"') => {
                    self.pos += 1;
                    if verbatim && self.peek() == Some(b'"') {
                        self.pos += 1;
                        continue;
                    }
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn interpolation_hole(&mut self, start: usize) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while depth > 0 {
            let here = self.pos;
            match self.peek() {
                None => return Err(self.unterminated("interpolated string", start)),
                Some(b'{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b'}') => {
                    depth -= 1;
                    self.pos += 1;
                }
                Some(b'\'') => {
                    self.pos += 1;
                    self.quoted(b'\'', false, "character literal", here)?;
                }
                Some(b'"' | b'$' | b'@') => {
                    if self.string_literal(here)?.is_none() {
                        self.pos = here + 1;
                    }
                }
                Some(_) => {
                    let c = self.current_char().map(char::len_utf8).unwrap_or(1);
                    self.pos += c;
                }
            }
        }
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .tokens
            .iter()
            .map(|t| t.text().to_string())
            .collect()
    }

    fn roundtrip(source: &str) -> String {
        let mut out = String::new();
        for token in tokenize(source).unwrap().tokens {
            token.write_to(&mut out);
        }
        out
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let lexed = tokenize("static class TypeName").unwrap();
        let kinds: Vec<_> = lexed.tokens.iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_trailing_trivia_stops_at_newline() {
        let lexed = tokenize("a // tail\n    b").unwrap();
        let a = &lexed.tokens[0];
        let b = &lexed.tokens[1];
        assert_eq!(a.trailing_trivia().to_string(), " // tail\n");
        assert_eq!(b.leading_trivia().to_string(), "    ");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            texts("x => y ?? z; a<List<int>>"),
            vec!["x", "=>", "y", "??", "z", ";", "a", "<", "List", "<", "int", ">", ">", ""]
        );
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(texts(r#"s = "a\"b";"#)[2], r#""a\"b""#);
        assert_eq!(texts(r#"s = @"c:\dir""x";"#)[2], r#"@"c:\dir""x""#);
        assert_eq!(
            texts(r#"s = $"{d["k"]} and {{x}}";"#)[2],
            r#"$"{d["k"]} and {{x}}""#
        );
        assert_eq!(texts("s = \"\"\"raw \" text\"\"\";")[2], "\"\"\"raw \" text\"\"\"");
        assert_eq!(texts("c = '\\'';")[2], "'\\''");
    }

    #[test]
    fn test_verbatim_identifier() {
        let lexed = tokenize("@class").unwrap();
        assert_eq!(lexed.tokens[0].kind(), TokenKind::Identifier);
        assert_eq!(lexed.tokens[0].text(), "@class");
    }

    #[test]
    fn test_directive_trivia() {
        let lexed = tokenize("#region Stuff\nclass A {}\n#endregion\n").unwrap();
        let class = &lexed.tokens[0];
        assert_eq!(class.text(), "class");
        assert_eq!(class.leading_trivia().pieces()[0].kind, TriviaKind::Directive);
        let eof = lexed.tokens.last().unwrap();
        assert_eq!(eof.kind(), TokenKind::Eof);
        assert_eq!(eof.leading_trivia().to_string(), "#endregion\n");
    }

    #[test]
    fn test_lossless() {
        let source = "\r\n  /* head */ static class A\t{ // x\r\n  int b = 1.5e3; }\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_unterminated_errors() {
        assert!(matches!(
            tokenize("class A { /* oops"),
            Err(ParseError::Unterminated { what: "block comment", .. })
        ));
        assert!(matches!(
            tokenize("x = \"abc\n"),
            Err(ParseError::Unterminated { what: "string literal", line: 1, column: 5 })
        ));
    }
}
