//! Lexer for TypeScript declaration text.
//!
//! Line and block comments are skipped. A `/** … */` doc comment is attached
//! to the token that follows it so the parser can carry documentation into
//! declarations and members.

use super::span::Span;
use crate::error::ParseError;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
    /// Doc comment immediately preceding this token.
    pub doc: Option<String>,
}

/// Token types.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword; keywords are contextual and decided by the parser.
    Ident(String),
    /// String literal, unescaped.
    Str(String),
    /// Numeric literal as written, including a leading `-`.
    Number(String),
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `<`
    LAngle,
    /// `>`
    RAngle,
    /// `:`
    Colon,
    /// `;`
    Semi,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `?`
    Question,
    /// `|`
    Pipe,
    /// `&`
    Amp,
    /// `=`
    Eq,
    /// `=>`
    Arrow,
    /// `...`
    Ellipsis,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("'{name}'"),
            Self::Str(s) => format!("string \"{s}\""),
            Self::Number(n) => format!("number {n}"),
            Self::LBrace => "'{'".into(),
            Self::RBrace => "'}'".into(),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::LBracket => "'['".into(),
            Self::RBracket => "']'".into(),
            Self::LAngle => "'<'".into(),
            Self::RAngle => "'>'".into(),
            Self::Colon => "':'".into(),
            Self::Semi => "';'".into(),
            Self::Comma => "','".into(),
            Self::Dot => "'.'".into(),
            Self::Question => "'?'".into(),
            Self::Pipe => "'|'".into(),
            Self::Amp => "'&'".into(),
            Self::Eq => "'='".into(),
            Self::Arrow => "'=>'".into(),
            Self::Ellipsis => "'...'".into(),
            Self::Eof => "end of input".into(),
        }
    }
}

/// Lexer for declaration source.
pub struct Lexer<'src> {
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// The opening block comment is a metadata block, not documentation.
    /// Cleared once any comment or token has been consumed.
    metadata_pending: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            metadata_pending: false,
        }
    }

    /// Treats the opening block comment as metadata rather than as the doc
    /// comment of the first declaration.
    pub fn after_metadata(mut self) -> Self {
        self.metadata_pending = true;
        self
    }

    /// Tokenizes all source. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        Lexer::new(source).collect_tokens()
    }

    /// Consumes the lexer up to and including [`TokenKind::Eof`].
    pub fn collect_tokens(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let (newline_before, doc) = self.skip_trivia()?;

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start, start_line, start_column),
                newline_before,
                doc,
            });
        };

        let kind = match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '<' => self.single(TokenKind::LAngle),
            '>' => self.single(TokenKind::RAngle),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semi),
            ',' => self.single(TokenKind::Comma),
            '?' => self.single(TokenKind::Question),
            '|' => self.single(TokenKind::Pipe),
            '&' => self.single(TokenKind::Amp),
            '=' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '.' => {
                if self.rest.starts_with("...") {
                    self.advance_n(3);
                    TokenKind::Ellipsis
                } else {
                    self.single(TokenKind::Dot)
                }
            }
            '"' | '\'' => self.scan_string(c)?,
            '-' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            '`' => {
                return Err(ParseError::unsupported(
                    start_line,
                    start_column,
                    "template literal type",
                ));
            }
            c => {
                return Err(ParseError::syntax(
                    start_line,
                    start_column,
                    format!("unexpected character: {c}"),
                ));
            }
        };

        Ok(Token {
            kind,
            span: Span::new(start, self.position, start_line, start_column),
            newline_before,
            doc,
        })
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace and comments. Returns whether a newline was crossed
    /// and the last doc comment seen.
    fn skip_trivia(&mut self) -> Result<(bool, Option<String>), ParseError> {
        let mut newline = false;
        let mut doc = None;
        loop {
            match self.peek_char() {
                Some('\n') => {
                    newline = true;
                    self.advance();
                }
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.rest.starts_with("//") => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.rest.starts_with("/*") => {
                    let (line, column) = (self.line, self.column);
                    let Some(end) = self.rest[2..].find("*/").map(|i| i + 2) else {
                        return Err(ParseError::syntax(line, column, "unterminated comment"));
                    };
                    let body = &self.rest[2..end];
                    let is_doc = !self.metadata_pending
                        && body.starts_with('*')
                        && !body.starts_with("**");
                    let text = is_doc.then(|| strip_gutters(&body[1..]));
                    let body_chars = self.rest[..end + 2].chars().count();
                    self.advance_n(body_chars);
                    self.metadata_pending = false;
                    if let Some(text) = text {
                        doc = (!text.is_empty()).then_some(text);
                    }
                }
                _ => {
                    self.metadata_pending = false;
                    return Ok((newline, doc));
                }
            }
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Ident(name)
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut text = String::new();
        if self.peek_char() == Some('-') {
            text.push('-');
            self.advance();
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Number(text)
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        let (line, column) = (self.line, self.column);
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(TokenKind::Str(text));
                }
                Some('\\') => {
                    self.advance();
                    let Some(escaped) = self.peek_char() else {
                        break;
                    };
                    self.advance();
                    match escaped {
                        'n' => text.push('\n'),
                        'r' => text.push('\r'),
                        't' => text.push('\t'),
                        '0' => text.push('\0'),
                        'u' => text.push(self.scan_unicode_escape(line, column)?),
                        other => text.push(other),
                    }
                }
                Some('\n') | None => break,
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Err(ParseError::syntax(line, column, "unterminated string literal"))
    }

    fn scan_unicode_escape(&mut self, line: u32, column: u32) -> Result<char, ParseError> {
        let hex: String = self.rest.chars().take(4).collect();
        let ch = u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|_| hex.len() == 4)
            .and_then(char::from_u32)
            .ok_or_else(|| ParseError::syntax(line, column, "invalid unicode escape"))?;
        self.advance_n(4);
        Ok(ch)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Strips the leading `*` gutter from each line of a block comment body and
/// trims surrounding blank lines.
pub(crate) fn strip_gutters(body: &str) -> String {
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            match trimmed.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .map(str::trim_end)
        .collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => {
            let kept = &lines[first..=last];
            if kept.len() == 1 {
                kept[0].trim().to_string()
            } else {
                kept.join("\n")
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuation_and_arrow() {
        assert_eq!(
            kinds("(a: T) => U[]"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident("a".into()),
                TokenKind::Colon,
                TokenKind::Ident("T".into()),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Ident("U".into()),
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_numbers() {
        assert_eq!(
            kinds(r#"'a\'b' "cA" -1.5 42"#),
            vec![
                TokenKind::Str("a'b".into()),
                TokenKind::Str("cA".into()),
                TokenKind::Number("-1.5".into()),
                TokenKind::Number("42".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_skipped_and_docs_attached() {
        let tokens = Lexer::tokenize(
            "// line\n/* block */\n/**\n * The name.\n */\nname",
        )
        .unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("name".into()));
        assert_eq!(tokens[0].doc.as_deref(), Some("The name."));
        assert!(tokens[0].newline_before);
        assert_eq!(tokens[0].span.line, 6);
    }

    #[test]
    fn test_metadata_block_is_not_a_doc_comment() {
        let tokens = Lexer::new("/**\n * id: a/b\n */\ninterface")
            .after_metadata()
            .collect_tokens()
            .unwrap();
        assert_eq!(tokens[0].doc, None);
    }

    #[test]
    fn test_opening_doc_comment_kept_without_metadata() {
        let tokens = Lexer::tokenize("/** A labelled thing. */\ninterface").unwrap();
        assert_eq!(tokens[0].doc.as_deref(), Some("A labelled thing."));
    }

    #[test]
    fn test_comment_starting_with_slash() {
        assert_eq!(
            kinds("/*/ note */\n/**/ a /*/*/ b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
        let err = Lexer::tokenize("/*/").unwrap_err();
        assert_eq!(err.to_string(), "1:1: unterminated comment");
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = Lexer::tokenize("\n  \"abc").unwrap_err();
        assert_eq!(err.to_string(), "2:3: unterminated string literal");
    }

    #[test]
    fn test_template_literal_unsupported() {
        let err = Lexer::tokenize("`a${b}`").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn test_strip_gutters() {
        assert_eq!(strip_gutters("\n * id: a/b\n * type: api\n "), "id: a/b\ntype: api");
        assert_eq!(strip_gutters(" single line "), "single line");
    }
}
