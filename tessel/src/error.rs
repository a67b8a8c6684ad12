use std::sync::Arc;

use parser::{ParseError, Report};

use crate::{ConversionError, Location, Source};

/// `1 argument`, `2 arguments`.
pub(crate) fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn was_were(count: usize) -> &'static str {
    if count == 1 { "was" } else { "were" }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    MessageNotUnderstood {
        selector: String,
        receiver: String,
    },
    SlotNotFound {
        name: String,
    },
    NotABlock {
        selector: String,
    },
    TooManyArguments {
        max: usize,
        given: usize,
    },
    MissingArguments {
        required: usize,
        optional: usize,
        given: usize,
    },
    UnknownNamedArguments {
        names: Vec<String>,
    },
    DuplicateArgument {
        name: String,
    },
    UnfilledParameters {
        names: Vec<String>,
    },
    TypeError(String),
    StackOverflow {
        limit: usize,
    },
    Cancelled,
}

impl RuntimeErrorKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::MessageNotUnderstood { .. } => "message not understood",
            Self::SlotNotFound { .. } => "slot not found",
            Self::NotABlock { .. } => "not a block",
            Self::TooManyArguments { .. }
            | Self::MissingArguments { .. }
            | Self::UnknownNamedArguments { .. }
            | Self::DuplicateArgument { .. }
            | Self::UnfilledParameters { .. } => "argument mismatch",
            Self::TypeError(_) => "type error",
            Self::StackOverflow { .. } => "stack overflow",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MessageNotUnderstood { selector, receiver } => {
                write!(f, "{receiver} does not understand `{selector}`")
            }
            Self::SlotNotFound { name } => write!(f, "no slot named `{name}`"),
            Self::NotABlock { selector } => write!(
                f,
                "`{selector}` is not a block and cannot take arguments"
            ),
            Self::TooManyArguments { max: 0, given } => write!(
                f,
                "block takes no arguments, but {given} {} given",
                was_were(*given)
            ),
            Self::TooManyArguments { max, given } => write!(
                f,
                "block takes at most {}, but {given} {} given",
                plural(*max, "argument"),
                was_were(*given)
            ),
            Self::MissingArguments {
                required,
                optional: 0,
                given,
            } => write!(
                f,
                "block requires {}, but {given} {} given",
                plural(*required, "argument"),
                was_were(*given)
            ),
            Self::MissingArguments {
                required,
                optional,
                given,
            } => write!(
                f,
                "block requires {} ({} optional), but {given} {} given",
                plural(*required, "argument"),
                optional,
                was_were(*given)
            ),
            Self::UnknownNamedArguments { names } => write!(
                f,
                "unknown named {} {}",
                if names.len() == 1 { "argument" } else { "arguments" },
                quoted(names)
            ),
            Self::DuplicateArgument { name } => {
                write!(f, "argument `{name}` was given more than once")
            }
            Self::UnfilledParameters { names } => write!(
                f,
                "required {} {} not filled",
                if names.len() == 1 { "parameter" } else { "parameters" },
                quoted(names)
            ),
            Self::TypeError(message) => f.write_str(message),
            Self::StackOverflow { limit } => {
                write!(f, "evaluation exceeded the depth limit of {limit}")
            }
            Self::Cancelled => f.write_str("evaluation was cancelled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub location: Option<Location>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    pub fn at(kind: RuntimeErrorKind, location: Location) -> Self {
        Self {
            kind,
            location: Some(location),
        }
    }

    pub fn report(&self) -> Option<Report> {
        let location = self.location.as_ref()?;
        Some(
            Report::new(self.kind.title(), location.span)
                .with_label(location.source.label.clone())
                .with_description(self.kind.to_string()),
        )
    }

    pub fn render(&self) -> String {
        match (&self.location, self.report()) {
            (Some(location), Some(report)) => report.render(&location.source.text),
            _ => format!("error: {}: {}", self.kind.title(), self.kind),
        }
    }
}

impl PartialEq for RuntimeError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "{} at {}:{}",
                self.kind,
                location.source.label.as_deref().unwrap_or("<input>"),
                location.span.start
            ),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Anything that can go wrong while evaluating a source unit.
#[derive(Debug, Clone)]
pub enum EvalError {
    Parse {
        error: ParseError,
        source: Arc<Source>,
    },
    Runtime(RuntimeError),
    Conversion(ConversionError),
    /// The reference interpreter's thread could not be started.
    Spawn(Arc<std::io::Error>),
}

impl EvalError {
    /// Source-pointer report for the CLI.
    pub fn render(&self) -> String {
        match self {
            Self::Parse { error, source } => error.report().render(&source.text),
            Self::Runtime(error) => error.render(),
            Self::Conversion(error) => format!("error: conversion failed: {error}"),
            Self::Spawn(error) => format!("error: {self}: {error}"),
        }
    }

    pub fn runtime_kind(&self) -> Option<&RuntimeErrorKind> {
        match self {
            Self::Runtime(error) => Some(&error.kind),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { error, .. } => write!(f, "{error}"),
            Self::Runtime(error) => write!(f, "{error}"),
            Self::Conversion(error) => write!(f, "{error}"),
            Self::Spawn(_) => f.write_str("could not start the interpreter thread"),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse { error, .. } => Some(error),
            Self::Runtime(error) => Some(error),
            Self::Conversion(error) => Some(error),
            Self::Spawn(error) => Some(&**error),
        }
    }
}

impl From<RuntimeError> for EvalError {
    fn from(error: RuntimeError) -> Self {
        Self::Runtime(error)
    }
}

impl From<ConversionError> for EvalError {
    fn from(error: ConversionError) -> Self {
        Self::Conversion(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_messages_pluralize() {
        let msg = |kind: RuntimeErrorKind| kind.to_string();
        assert_eq!(
            msg(RuntimeErrorKind::TooManyArguments { max: 0, given: 1 }),
            "block takes no arguments, but 1 was given"
        );
        assert_eq!(
            msg(RuntimeErrorKind::TooManyArguments { max: 1, given: 3 }),
            "block takes at most 1 argument, but 3 were given"
        );
        assert_eq!(
            msg(RuntimeErrorKind::MissingArguments {
                required: 2,
                optional: 0,
                given: 1
            }),
            "block requires 2 arguments, but 1 was given"
        );
        assert_eq!(
            msg(RuntimeErrorKind::MissingArguments {
                required: 1,
                optional: 2,
                given: 0
            }),
            "block requires 1 argument (2 optional), but 0 were given"
        );
        assert_eq!(
            msg(RuntimeErrorKind::UnknownNamedArguments {
                names: vec!["a".into(), "b".into()]
            }),
            "unknown named arguments `a`, `b`"
        );
        assert_eq!(
            msg(RuntimeErrorKind::UnfilledParameters {
                names: vec!["x".into()]
            }),
            "required parameter `x` not filled"
        );
    }

    #[test]
    fn located_errors_render_against_their_source() {
        let source = Source::new("1 + foo", Some("demo.tsl"));
        let span = parser::Span::new(
            parser::Pos::new(4, 1, 5),
            parser::Pos::new(7, 1, 8),
        );
        let err = RuntimeError::at(
            RuntimeErrorKind::MessageNotUnderstood {
                selector: "foo".into(),
                receiver: "<object #1>".into(),
            },
            Location { source, span },
        );
        let rendered = err.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "error: message not understood (--> demo.tsl:1:5)");
        assert_eq!(lines[1], "1| 1 + foo");
        assert_eq!(lines[2], " |     ^^^");
        assert_eq!(lines[3], " = <object #1> does not understand `foo`");
        assert_eq!(err.to_string(), "<object #1> does not understand `foo` at demo.tsl:1:5");
    }

    #[test]
    fn unlocated_errors_render_inline() {
        let err = RuntimeError::new(RuntimeErrorKind::Cancelled);
        assert_eq!(err.render(), "error: cancelled: evaluation was cancelled");
    }
}
