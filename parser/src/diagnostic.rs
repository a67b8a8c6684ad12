//! Source-pointer error reports.
//!
//! A [`Report`] renders an error against the text it came from:
//!
//! ```text
//! error: unknown token `#` (--> main.tsl:3:7)
//! 3| x = 1 # 2
//!  |       ^
//!  = remove the stray character
//! ```
//!
//! Both parse errors and runtime errors go through here, so the CLI has a
//! single way of drawing problems.
use crate::parser::ParseError;
use crate::span::Span;

/// Excerpts longer than this are shortened to their first and last two lines.
const MAX_EXCERPT_LINES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub span: Span,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl Report {
    pub fn new(title: impl Into<String>, span: Span) -> Self {
        Self {
            title: title.into(),
            span,
            label: None,
            description: None,
        }
    }

    pub fn with_label(mut self, label: Option<impl Into<String>>) -> Self {
        self.label = label.map(Into::into);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Draw the report against `source`, without a trailing newline.
    pub fn render(&self, source: &str) -> String {
        let source_lines: Vec<&str> = source.split('\n').collect();
        let first = self.span.start.line.max(1);
        let mut last = self.span.end.line.max(first);
        // a span that ends right after a newline does not touch the next line
        if last > first && self.span.end.column == 1 {
            last -= 1;
        }

        let shown: Vec<Option<usize>> = if last - first + 1 > MAX_EXCERPT_LINES {
            vec![
                Some(first),
                Some(first + 1),
                None,
                Some(last - 1),
                Some(last),
            ]
        } else {
            (first..=last).map(Some).collect()
        };

        let width = last.to_string().len();
        let pad = " ".repeat(width);
        let label = self.label.as_deref().unwrap_or("<input>");

        let mut out = vec![format!(
            "error: {} (--> {}:{})",
            self.title, label, self.span.start
        )];

        for entry in shown {
            let Some(number) = entry else {
                out.push(format!("{:>width$}", "..."));
                continue;
            };
            let text = source_lines
                .get(number - 1)
                .copied()
                .unwrap_or("")
                .trim_end_matches('\r');
            out.push(format!("{number:>width$}| {text}"));

            let from = if number == first {
                self.span.start.column.saturating_sub(1).min(text.len())
            } else {
                0
            };
            let to = if number == self.span.end.line {
                self.span.end.column.saturating_sub(1).min(text.len())
            } else {
                text.len()
            };
            let carets = to.saturating_sub(from).max(1);
            out.push(format!(
                "{pad}| {}{}",
                " ".repeat(from),
                "^".repeat(carets)
            ));
        }

        if let Some(description) = &self.description {
            out.push(format!("{pad}= {description}"));
        }
        out.join("\n")
    }
}

impl ParseError {
    pub fn report(&self) -> Report {
        let title = if self.is_lexical() {
            "lexical error"
        } else {
            "syntax error"
        };
        Report::new(title, self.token.span)
            .with_label(self.label.clone())
            .with_description(self.message())
    }
}
