//! Abstract syntax tree nodes for Tessel expressions.
//!
//! The parser produces a sequence of [`Expr`] nodes. Each node carries a
//! [`Span`] so that downstream consumers (error reporting, the runtime's
//! materialize pass) always know the exact source location.
//!
//! There are eight node kinds: the four literal kinds, identifiers, block
//! literals, assignments and message sends. Binary operators are ordinary
//! message sends with one argument; `a.b(c)` and `b(c)` are sends with an
//! explicit and an implicit receiver respectively.

use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,

    /// A lexical identifier, resolved against the current scope.
    Identifier(String),

    /// A block literal: `{ |a, b = 1| body }`.
    Block { params: Vec<Param>, body: Vec<Expr> },

    /// `name = value` or `receiver.name = value`.
    Assignment {
        receiver: Option<Box<Expr>>,
        name: String,
        value: Box<Expr>,
        /// Line comments directly above the assignment, joined by newlines.
        comment: Option<String>,
    },

    /// `receiver.selector(arguments)`, `selector(arguments)`,
    /// `receiver op argument`.
    MessageSend {
        receiver: Option<Box<Expr>>,
        selector: String,
        selector_span: Span,
        arguments: Vec<Argument>,
    },
}

/// A block parameter, optionally with a default expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
    pub span: Span,
}

impl Param {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A positional (`expr`) or named (`name: expr`) argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
    pub span: Span,
}

impl ExprKind {
    /// Short description used in error messages and debugging output.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Number(_) => "number literal",
            Self::String(_) => "string literal",
            Self::Boolean(_) => "boolean literal",
            Self::Null => "null literal",
            Self::Identifier(_) => "identifier",
            Self::Block { .. } => "block literal",
            Self::Assignment { .. } => "assignment",
            Self::MessageSend { .. } => "message send",
        }
    }
}
