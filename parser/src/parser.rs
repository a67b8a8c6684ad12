use std::collections::VecDeque;

use crate::ast::{Argument, Expr, ExprKind, Param};
use crate::span::{Pos, Span};
use crate::token::{Token, TokenKind};

/// What went wrong while turning tokens into expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    // lexical
    UnterminatedString,
    UnknownToken,
    // syntactic
    InvalidExpressionStart,
    InvalidExpressionEnd,
    UnmatchedClosing,
    IncompleteExpression,
    IncompleteParameterList,
    Expected { expected: &'static str },
    InvalidAssignmentTarget { target: &'static str },
}

/// A lexical or syntactic error, anchored at the offending token.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub token: Token,
    /// Originating file or source label, if known.
    pub label: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, token: Token) -> Self {
        Self {
            kind,
            token,
            label: None,
        }
    }

    pub fn span(&self) -> Span {
        self.token.span
    }

    pub fn is_lexical(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::UnterminatedString | ParseErrorKind::UnknownToken
        )
    }

    /// One-line human-readable description.
    pub fn message(&self) -> String {
        let found = self.token.kind.name();
        match &self.kind {
            ParseErrorKind::UnterminatedString => {
                "unterminated string literal".to_string()
            }
            ParseErrorKind::UnknownToken => {
                format!("unknown token `{}`", self.token.lexeme)
            }
            ParseErrorKind::InvalidExpressionStart => {
                format!("expected an expression, found {found}")
            }
            ParseErrorKind::InvalidExpressionEnd => {
                format!("unexpected {found} after expression")
            }
            ParseErrorKind::UnmatchedClosing => {
                format!("unmatched closing {found}")
            }
            ParseErrorKind::IncompleteExpression => {
                "incomplete expression, input ended early".to_string()
            }
            ParseErrorKind::IncompleteParameterList => {
                "incomplete parameter list".to_string()
            }
            ParseErrorKind::Expected { expected } => {
                format!("expected {expected}, found {found}")
            }
            ParseErrorKind::InvalidAssignmentTarget { target } => {
                format!("cannot assign to a {target}")
            }
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => {
                write!(f, "{} at {}:{}", self.message(), label, self.token.span.start)
            }
            None => write!(f, "{} at {}", self.message(), self.token.span.start),
        }
    }
}

impl std::error::Error for ParseError {}

/// Binding power of a binary operator; higher binds tighter.
fn precedence(operator: &str) -> u8 {
    match operator {
        "==" | "!=" => 1,
        "<" | "<=" | ">" | ">=" => 2,
        "*" | "/" | "%" => 4,
        _ => 3,
    }
}

/// Recursive-descent parser over a token stream.
///
/// Iterating yields one top-level expression at a time. The first error
/// ends the stream: no resynchronization is attempted.
pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
    lookahead: VecDeque<Token>,
    /// Line comments seen but not yet attached, as `(line, text)`.
    comments: Vec<(usize, String)>,
    last_span: Span,
    label: Option<String>,
    failed: bool,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            lookahead: VecDeque::new(),
            comments: Vec::new(),
            last_span: Span::point(Pos::origin()),
            label: None,
            failed: false,
        }
    }

    /// Attach a source label (usually a file path) to every error.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parse the whole stream, stopping at the first error.
    pub fn parse_program(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = Vec::new();
        while let Some(result) = self.next() {
            exprs.push(result?);
        }
        Ok(exprs)
    }

    // ───────────────────────────────────────────────────────────
    //  Token plumbing
    // ───────────────────────────────────────────────────────────

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            match self.tokens.next() {
                Some(tok) if tok.is_comment() => {
                    if let TokenKind::LineComment(text) = tok.kind {
                        self.comments.push((tok.span.start.line, text));
                    }
                }
                Some(tok) => self.lookahead.push_back(tok),
                None => {
                    let eof = Token::new(TokenKind::Eof, self.last_span, "");
                    self.lookahead.push_back(eof);
                }
            }
        }
    }

    fn peek_nth(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.lookahead[n]
    }

    fn peek(&mut self) -> &Token {
        self.peek_nth(0)
    }

    fn peek_kind(&mut self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        self.fill(0);
        match self.lookahead.pop_front() {
            Some(tok) => {
                self.last_span = Span::point(tok.span.end);
                tok
            }
            None => Token::new(TokenKind::Eof, self.last_span, ""),
        }
    }

    fn error(&self, kind: ParseErrorKind, token: Token) -> ParseError {
        ParseError {
            kind,
            token,
            label: self.label.clone(),
        }
    }

    /// Error for a token that appeared where an expression was expected.
    fn unexpected(&self, token: Token) -> ParseError {
        let kind = match token.kind {
            TokenKind::UnterminatedString => ParseErrorKind::UnterminatedString,
            TokenKind::Unknown(_) => ParseErrorKind::UnknownToken,
            TokenKind::Eof => ParseErrorKind::IncompleteExpression,
            _ => ParseErrorKind::InvalidExpressionStart,
        };
        self.error(kind, token)
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Comments on the lines directly above `line`, oldest first.
    fn take_doc_comment(&mut self, line: usize) -> Option<String> {
        let mut expected = line;
        let mut doc = Vec::new();
        for (comment_line, text) in self.comments.iter().rev() {
            if *comment_line + 1 != expected {
                break;
            }
            doc.push(text.clone());
            expected = *comment_line;
        }
        self.comments.clear();
        if doc.is_empty() {
            return None;
        }
        doc.reverse();
        Some(doc.join("\n"))
    }

    /// After a complete expression only a separator, a closer of the
    /// enclosing construct, or the start of another expression may follow.
    fn check_expression_end(&mut self, closer: Option<&TokenKind>) -> Result<(), ParseError> {
        let kind = self.peek_kind().clone();
        if closer == Some(&kind) {
            return Ok(());
        }
        match kind {
            TokenKind::Semicolon | TokenKind::Eof => Ok(()),
            TokenKind::RParen | TokenKind::RBrace => {
                let tok = self.advance();
                Err(self.error(ParseErrorKind::UnmatchedClosing, tok))
            }
            TokenKind::UnterminatedString | TokenKind::Unknown(_) => {
                let tok = self.advance();
                Err(self.unexpected(tok))
            }
            TokenKind::Comma
            | TokenKind::Colon
            | TokenKind::Pipe
            | TokenKind::Equals
            | TokenKind::Dot => {
                let tok = self.advance();
                Err(self.error(ParseErrorKind::InvalidExpressionEnd, tok))
            }
            _ => Ok(()),
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Expressions
    // ───────────────────────────────────────────────────────────

    fn parse_statement(&mut self, closer: Option<&TokenKind>) -> Result<Expr, ParseError> {
        let line = self.peek().span.start.line;
        let comment = self.take_doc_comment(line);
        let expr = self.parse_expression(comment)?;
        self.check_expression_end(closer)?;
        Ok(expr)
    }

    fn parse_expression(&mut self, comment: Option<String>) -> Result<Expr, ParseError> {
        let target = self.parse_binary(0)?;
        if !matches!(self.peek_kind(), TokenKind::Equals) {
            return Ok(target);
        }

        let equals = self.advance();
        let value = self.parse_expression(None)?;
        let span = target.span.merge(value.span);
        let (receiver, name) = match target.kind {
            ExprKind::Identifier(name) => (None, name),
            ExprKind::MessageSend {
                receiver: Some(receiver),
                selector,
                arguments,
                ..
            } if arguments.is_empty() => (Some(receiver), selector),
            other => {
                let target = other.describe();
                return Err(self.error(
                    ParseErrorKind::InvalidAssignmentTarget { target },
                    equals,
                ));
            }
        };

        Ok(Expr::new(
            ExprKind::Assignment {
                receiver,
                name,
                value: Box::new(value),
                comment,
            },
            span,
        ))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_postfix()?;
        loop {
            let prec = match self.peek_kind() {
                TokenKind::Operator(op) => precedence(op),
                _ => break,
            };
            if prec < min_precedence {
                break;
            }
            let operator = self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.merge(rhs.span);
            let argument = Argument {
                name: None,
                span: rhs.span,
                value: rhs,
            };
            lhs = Expr::new(
                ExprKind::MessageSend {
                    receiver: Some(Box::new(lhs)),
                    selector: operator.lexeme,
                    selector_span: operator.span,
                    arguments: vec![argument],
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.advance();
                    let TokenKind::Identifier(selector) = name.kind.clone() else {
                        let kind = match name.kind {
                            TokenKind::Eof => ParseErrorKind::IncompleteExpression,
                            _ => ParseErrorKind::Expected {
                                expected: "message name",
                            },
                        };
                        return Err(self.error(kind, name));
                    };
                    let (arguments, end) = if matches!(self.peek_kind(), TokenKind::LParen) {
                        self.parse_call_arguments()?
                    } else {
                        (Vec::new(), name.span)
                    };
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::MessageSend {
                            receiver: Some(Box::new(expr)),
                            selector,
                            selector_span: name.span,
                            arguments,
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    let (arguments, end) = self.parse_call_arguments()?;
                    let span = expr.span.merge(end);
                    let kind = match expr.kind {
                        ExprKind::Identifier(selector) => ExprKind::MessageSend {
                            receiver: None,
                            selector,
                            selector_span: expr.span,
                            arguments,
                        },
                        _ => ExprKind::MessageSend {
                            selector_span: expr.span,
                            receiver: Some(Box::new(expr)),
                            selector: "call".to_string(),
                            arguments,
                        },
                    };
                    expr = Expr::new(kind, span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.advance();
        let kind = match tok.kind {
            TokenKind::Number(value) => ExprKind::Number(value),
            TokenKind::String(ref value) => ExprKind::String(value.clone()),
            TokenKind::True => ExprKind::Boolean(true),
            TokenKind::False => ExprKind::Boolean(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Identifier(ref name) => ExprKind::Identifier(name.clone()),
            TokenKind::LParen => {
                let inner = self.parse_expression(None)?;
                let close = self.advance();
                return match close.kind {
                    TokenKind::RParen => Ok(Expr::new(inner.kind, tok.span.merge(close.span))),
                    TokenKind::Eof => {
                        Err(self.error(ParseErrorKind::IncompleteExpression, close))
                    }
                    _ => Err(self.error(ParseErrorKind::Expected { expected: "`)`" }, close)),
                };
            }
            TokenKind::LBrace => return self.parse_block(tok),
            _ => return Err(self.unexpected(tok)),
        };
        Ok(Expr::new(kind, tok.span))
    }

    fn parse_call_arguments(&mut self) -> Result<(Vec<Argument>, Span), ParseError> {
        let open = self.advance();
        let mut arguments = Vec::new();
        if matches!(self.peek_kind(), TokenKind::RParen) {
            let close = self.advance();
            return Ok((arguments, open.span.merge(close.span)));
        }

        loop {
            let named = matches!(self.peek_kind(), TokenKind::Identifier(_))
                && matches!(self.peek_nth(1).kind, TokenKind::Colon);
            let argument = if named {
                let name = self.advance();
                self.advance();
                let value = self.parse_expression(None)?;
                Argument {
                    span: name.span.merge(value.span),
                    name: Some(name.lexeme),
                    value,
                }
            } else {
                let value = self.parse_expression(None)?;
                Argument {
                    name: None,
                    span: value.span,
                    value,
                }
            };
            arguments.push(argument);

            let sep = self.advance();
            match sep.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok((arguments, open.span.merge(sep.span))),
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::IncompleteExpression, sep));
                }
                _ => {
                    return Err(self.error(
                        ParseErrorKind::Expected {
                            expected: "`,` or `)`",
                        },
                        sep,
                    ));
                }
            }
        }
    }

    fn parse_block(&mut self, open: Token) -> Result<Expr, ParseError> {
        let params = if matches!(self.peek_kind(), TokenKind::Pipe) {
            self.advance();
            self.parse_params()?
        } else {
            Vec::new()
        };

        let mut body = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                TokenKind::RBrace => {
                    let close = self.advance();
                    let span = open.span.merge(close.span);
                    return Ok(Expr::new(ExprKind::Block { params, body }, span));
                }
                TokenKind::Eof => {
                    let eof = self.advance();
                    return Err(self.error(ParseErrorKind::IncompleteExpression, eof));
                }
                _ => body.push(self.parse_statement(Some(&TokenKind::RBrace))?),
            }
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        loop {
            let tok = self.advance();
            let name = match tok.kind {
                TokenKind::Pipe => return Ok(params),
                TokenKind::Identifier(ref name) => name.clone(),
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::IncompleteParameterList, tok));
                }
                _ => {
                    return Err(self.error(
                        ParseErrorKind::Expected {
                            expected: "parameter name",
                        },
                        tok,
                    ));
                }
            };

            let default = if matches!(self.peek_kind(), TokenKind::Equals) {
                self.advance();
                Some(self.parse_binary(0)?)
            } else {
                None
            };
            let span = match &default {
                Some(expr) => tok.span.merge(expr.span),
                None => tok.span,
            };
            params.push(Param {
                name,
                default,
                span,
            });

            let sep = self.advance();
            match sep.kind {
                TokenKind::Comma => continue,
                TokenKind::Pipe => return Ok(params),
                TokenKind::Eof => {
                    return Err(self.error(ParseErrorKind::IncompleteParameterList, sep));
                }
                _ => {
                    return Err(self.error(
                        ParseErrorKind::Expected {
                            expected: "`,` or `|`",
                        },
                        sep,
                    ));
                }
            }
        }
    }
}

impl<I: Iterator<Item = Token>> Iterator for Parser<I> {
    type Item = Result<Expr, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_separators();
        let result = match self.peek_kind() {
            TokenKind::Eof => return None,
            TokenKind::RParen | TokenKind::RBrace => {
                let tok = self.advance();
                Err(self.error(ParseErrorKind::UnmatchedClosing, tok))
            }
            _ => self.parse_statement(None),
        };
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
