//! Lexer for Tessel source text.
//!
//! The [`Lexer`] walks a borrowed `&str` and implements [`Iterator`] over
//! [`Token`]s, tracking byte offset, line, and column for every token. It
//! never fails: malformed input is reported in-band as an error token
//! ([`TokenKind::UnterminatedString`], [`TokenKind::Unknown`]) and the
//! parser decides what to do with it.
//!
//! | Syntax      | Token                          |
//! |-------------|--------------------------------|
//! | `// …`      | line comment, runs to newline  |
//! | `"…"`       | string, `\\ \" \n \t \r \0`    |
//! | `12`, `1.5` | number (no sign prefix)        |
//! | `+ <= !=`   | operator                       |
//! | `=`         | assignment / parameter default |

use crate::span::{Pos, Span};
use crate::token::{Token, TokenKind};

/// Characters that may appear in binary operators.
///
/// `|` is excluded: it always delimits block parameters. `/` is allowed,
/// but comment starts are checked before operator lexing.
fn is_op_char(c: u8) -> bool {
    matches!(
        c,
        b'+' | b'-'
            | b'*'
            | b'/'
            | b'%'
            | b'<'
            | b'>'
            | b'='
            | b'!'
            | b'&'
            | b'^'
            | b'~'
            | b'?'
    )
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            emitted_eof: false,
        }
    }

    /// Alias kept for symmetry with reader-backed lexers.
    pub fn from_str(source: &'a str) -> Self {
        Self::new(source)
    }

    fn pos(&self) -> Pos {
        Pos::new(self.offset, self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.offset).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.source.as_bytes().get(self.offset + n).copied()
    }

    /// Consume one full UTF-8 character.
    fn advance_char(&mut self) -> Option<char> {
        let c = self.source[self.offset..].chars().next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += c.len_utf8();
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, start: Pos) -> Token {
        let span = Span::new(start, self.pos());
        Token::new(kind, span, &self.source[start.offset..self.offset])
    }

    // ───────────────────────────────────────────────────────────
    //  Whitespace and comments
    // ───────────────────────────────────────────────────────────

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn lex_line_comment(&mut self, start: Pos) -> Token {
        self.advance_char();
        self.advance_char();
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.advance_char();
        }
        let text = self.source[start.offset + 2..self.offset].trim().to_string();
        self.token(TokenKind::LineComment(text), start)
    }

    // ───────────────────────────────────────────────────────────
    //  Literals
    // ───────────────────────────────────────────────────────────

    fn lex_string(&mut self, start: Pos) -> Token {
        self.advance_char(); // opening `"`
        let mut value = String::new();
        loop {
            match self.advance_char() {
                None => return self.token(TokenKind::UnterminatedString, start),
                Some('"') => break,
                Some('\\') => match self.advance_char() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return self.token(TokenKind::UnterminatedString, start);
                    }
                },
                Some(c) => value.push(c),
            }
        }
        self.token(TokenKind::String(value), start)
    }

    fn lex_number(&mut self, start: Pos) -> Token {
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance_char();
        }
        // `1.foo` is a send, `1.5` is a fraction
        if self.peek() == Some(b'.')
            && matches!(self.peek_ahead(1), Some(b) if b.is_ascii_digit())
        {
            self.advance_char();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.advance_char();
            }
        }
        // digit runs always parse; overlong ones saturate to infinity
        let value = self.source[start.offset..self.offset]
            .parse::<f64>()
            .unwrap_or(f64::INFINITY);
        self.token(TokenKind::Number(value), start)
    }

    fn lex_identifier(&mut self, start: Pos) -> Token {
        while matches!(self.peek(), Some(b) if is_ident_continue(b)) {
            self.advance_char();
        }
        let kind = match &self.source[start.offset..self.offset] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            name => TokenKind::Identifier(name.to_string()),
        };
        self.token(kind, start)
    }

    fn lex_operator(&mut self, start: Pos) -> Token {
        while matches!(self.peek(), Some(b) if is_op_char(b)) {
            // `a=//comment` must not swallow the comment start
            if self.peek() == Some(b'/') && self.peek_ahead(1) == Some(b'/') {
                break;
            }
            self.advance_char();
        }
        let kind = match &self.source[start.offset..self.offset] {
            "=" => TokenKind::Equals,
            op => TokenKind::Operator(op.to_string()),
        };
        self.token(kind, start)
    }

    fn punctuation(&mut self, kind: TokenKind, start: Pos) -> Token {
        self.advance_char();
        self.token(kind, start)
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos();
        let Some(b) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match b {
            b'/' if self.peek_ahead(1) == Some(b'/') => self.lex_line_comment(start),
            b'"' => self.lex_string(start),
            b'0'..=b'9' => self.lex_number(start),
            b'(' => self.punctuation(TokenKind::LParen, start),
            b')' => self.punctuation(TokenKind::RParen, start),
            b'{' => self.punctuation(TokenKind::LBrace, start),
            b'}' => self.punctuation(TokenKind::RBrace, start),
            b'|' => self.punctuation(TokenKind::Pipe, start),
            b'.' => self.punctuation(TokenKind::Dot, start),
            b',' => self.punctuation(TokenKind::Comma, start),
            b':' => self.punctuation(TokenKind::Colon, start),
            b';' => self.punctuation(TokenKind::Semicolon, start),
            b if is_ident_start(b) => self.lex_identifier(start),
            b if is_op_char(b) => self.lex_operator(start),
            _ => {
                let c = self.advance_char().unwrap_or('\u{fffd}');
                self.token(TokenKind::Unknown(c), start)
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.is_eof() {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_literals_and_keywords() {
        assert_eq!(
            kinds("42 3.5 \"hi\" true false null"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::String("hi".into()),
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_followed_by_send_is_not_a_fraction() {
        assert_eq!(
            kinds("1.abs"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Dot,
                TokenKind::Identifier("abs".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn separates_equals_from_comparison() {
        assert_eq!(
            kinds("x = a == b"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Equals,
                TokenKind::Identifier("a".into()),
                TokenKind::Operator("==".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn block_punctuation() {
        assert_eq!(
            kinds("{|a, b: 1|}"),
            vec![
                TokenKind::LBrace,
                TokenKind::Pipe,
                TokenKind::Identifier("a".into()),
                TokenKind::Comma,
                TokenKind::Identifier("b".into()),
                TokenKind::Colon,
                TokenKind::Number(1.0),
                TokenKind::Pipe,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n""#),
            vec![TokenKind::String("a\"b\n".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let tokens: Vec<Token> = Lexer::new("x = \"oops").collect();
        assert_eq!(tokens[2].kind, TokenKind::UnterminatedString);
        assert_eq!(tokens[2].lexeme, "\"oops");
        assert_eq!(tokens[2].span.start.column, 5);
    }

    #[test]
    fn unknown_character() {
        assert_eq!(
            kinds("a # b")[1],
            TokenKind::Unknown('#'),
        );
    }

    #[test]
    fn comments_keep_their_text() {
        let tokens: Vec<Token> = Lexer::new("// the answer\nx").collect();
        assert_eq!(tokens[0].kind, TokenKind::LineComment("the answer".into()));
        assert_eq!(tokens[1].span.start.line, 2);
        assert_eq!(tokens[1].span.start.column, 1);
    }

    #[test]
    fn tracks_columns_across_lines() {
        let tokens: Vec<Token> = Lexer::new("a\n  bb").collect();
        assert_eq!(tokens[1].span.start, Pos::new(4, 2, 3));
        assert_eq!(tokens[1].span.end, Pos::new(6, 2, 5));
    }
}
