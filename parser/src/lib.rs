//! # Parser
//!
//! Lexer, parser and error reports for Tessel source text.
//!
//! ## Architecture
//!
//! ```text
//!  &str
//!    │
//!    ▼
//!  ┌────────┐    Token stream     ┌────────┐    Expr stream
//!  │ Lexer  │ ──────────────────▶ │ Parser │ ──────────────────▶
//!  └────────┘  (impl Iterator)    └────────┘  (impl Iterator)
//! ```
//!
//! ```rust
//! use parser::{Lexer, Parser};
//!
//! let source = "square = {|x| x * x}; square(4)";
//! let parser = Parser::new(Lexer::from_str(source));
//!
//! for result in parser {
//!     match result {
//!         Ok(expr) => println!("{:#?}", expr),
//!         Err(err) => eprintln!("{}", err.report().render(source)),
//!     }
//! }
//! ```

pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{Argument, Expr, ExprKind, Param};
pub use diagnostic::Report;
pub use lexer::Lexer;
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use span::{Pos, Span};
pub use token::{Token, TokenKind};

/// Parse a whole source unit, stopping at the first error.
pub fn parse_source(
    source: &str,
    label: Option<&str>,
) -> Result<Vec<Expr>, ParseError> {
    let mut parser = Parser::new(Lexer::new(source));
    if let Some(label) = label {
        parser = parser.with_label(label);
    }
    parser.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_program() {
        let exprs = parse_source(
            "// doubles\ndouble = {|x| x * 2}\ndouble(21)",
            Some("demo.tsl"),
        )
        .unwrap();
        assert_eq!(exprs.len(), 2);
        assert!(matches!(
            exprs[0].kind,
            ExprKind::Assignment { ref comment, .. } if comment.as_deref() == Some("doubles")
        ));
        assert!(matches!(
            exprs[1].kind,
            ExprKind::MessageSend { receiver: None, .. }
        ));
    }

    #[test]
    fn errors_carry_the_label() {
        let err = parse_source("f(", Some("demo.tsl")).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IncompleteExpression);
        assert_eq!(err.label.as_deref(), Some("demo.tsl"));
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        assert!(parse_source("", None).unwrap().is_empty());
        assert!(parse_source("  ;; // nothing\n", None).unwrap().is_empty());
    }
}
