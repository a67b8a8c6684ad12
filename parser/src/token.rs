//! Token types produced by the Tessel lexer.

use crate::span::Span;

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Number literal, e.g. `42`, `3.5`.
    Number(f64),
    /// String literal (contents without surrounding quotes, escapes resolved).
    String(std::string::String),
    /// An identifier, e.g. `factorial`, `IO`, `_tmp`.
    Identifier(std::string::String),

    /// The reserved word `true`.
    True,
    /// The reserved word `false`.
    False,
    /// The reserved word `null`.
    Null,

    /// A binary operator composed of op-chars, e.g. `+`, `<=`, `!=`.
    Operator(std::string::String),
    /// A lone `=`: assignment or parameter default.
    Equals,

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `|`: block parameter list delimiter.
    Pipe,
    /// `.`: message send.
    Dot,
    /// `,`: argument / parameter separator.
    Comma,
    /// `:`: named argument marker.
    Colon,
    /// `;`: expression separator.
    Semicolon,

    /// A line comment: `// ...` (text does NOT include the leading `//`).
    LineComment(std::string::String),

    /// End of input.
    Eof,
    /// A string literal missing its closing quote.
    UnterminatedString,
    /// A character that cannot start any token.
    Unknown(char),
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Identifier(_) => "identifier",
            Self::True => "`true`",
            Self::False => "`false`",
            Self::Null => "`null`",
            Self::Operator(_) => "operator",
            Self::Equals => "`=`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::Pipe => "`|`",
            Self::Dot => "`.`",
            Self::Comma => "`,`",
            Self::Colon => "`:`",
            Self::Semicolon => "`;`",
            Self::LineComment(_) => "line comment",
            Self::Eof => "end of input",
            Self::UnterminatedString => "unterminated string",
            Self::Unknown(_) => "unknown character",
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_))
    }

    /// Lexical errors are carried in-band as tokens; the parser turns them
    /// into a [`crate::ParseError`] the moment it reaches one.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::UnterminatedString | Self::Unknown(_))
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The original source text of this token.
    pub lexeme: std::string::String,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
        lexeme: impl Into<std::string::String>,
    ) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }
}
