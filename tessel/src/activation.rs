use std::sync::Arc;

use crate::{ParamCode, RuntimeErrorKind, Value};

/// One evaluated argument of a send.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentValue {
    pub name: Option<Arc<str>>,
    pub value: Value,
}

impl ArgumentValue {
    pub fn positional(value: Value) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: &str, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// Match arguments against a block's parameters.
///
/// Positional arguments fill parameters left to right, named arguments
/// fill by name. The result holds one entry per parameter; `None` marks a
/// parameter whose default still has to be evaluated.
pub fn bind_arguments(
    params: &[ParamCode],
    arguments: &[ArgumentValue],
) -> Result<Vec<Option<Value>>, RuntimeErrorKind> {
    let given = arguments.len();
    if params.is_empty() && given > 0 {
        return Err(RuntimeErrorKind::TooManyArguments { max: 0, given });
    }

    let positional: Vec<Value> = arguments
        .iter()
        .filter(|a| a.name.is_none())
        .map(|a| a.value)
        .collect();
    if positional.len() > params.len() {
        return Err(RuntimeErrorKind::TooManyArguments {
            max: params.len(),
            given: positional.len(),
        });
    }

    let unknown: Vec<String> = arguments
        .iter()
        .filter_map(|a| a.name.as_deref())
        .filter(|name| !params.iter().any(|p| &*p.name == *name))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(RuntimeErrorKind::UnknownNamedArguments { names: unknown });
    }

    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    for (slot, value) in slots.iter_mut().zip(positional) {
        *slot = Some(value);
    }
    for argument in arguments {
        let Some(name) = argument.name.as_deref() else {
            continue;
        };
        let index = params
            .iter()
            .position(|p| &*p.name == name)
            .ok_or_else(|| RuntimeErrorKind::UnknownNamedArguments {
                names: vec![name.to_string()],
            })?;
        if slots[index].is_some() {
            return Err(RuntimeErrorKind::DuplicateArgument {
                name: name.to_string(),
            });
        }
        slots[index] = Some(argument.value);
    }

    let required = params.iter().filter(|p| p.default.is_none()).count();
    if given < required {
        return Err(RuntimeErrorKind::MissingArguments {
            required,
            optional: params.len() - required,
            given,
        });
    }

    let unfilled: Vec<String> = params
        .iter()
        .zip(&slots)
        .filter(|(p, slot)| p.default.is_none() && slot.is_none())
        .map(|(p, _)| p.name.to_string())
        .collect();
    if !unfilled.is_empty() {
        return Err(RuntimeErrorKind::UnfilledParameters { names: unfilled });
    }

    Ok(slots)
}

/// Arity check for built-in blocks, which only take positional arguments.
pub fn check_primitive_arity(
    inputs: usize,
    arguments: &[ArgumentValue],
) -> Result<(), RuntimeErrorKind> {
    let named: Vec<String> = arguments
        .iter()
        .filter_map(|a| a.name.as_deref().map(str::to_string))
        .collect();
    if !named.is_empty() {
        return Err(RuntimeErrorKind::UnknownNamedArguments { names: named });
    }
    let given = arguments.len();
    if given > inputs {
        return Err(RuntimeErrorKind::TooManyArguments { max: inputs, given });
    }
    if given < inputs {
        return Err(RuntimeErrorKind::MissingArguments {
            required: inputs,
            optional: 0,
            given,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeKind, Source};

    fn param(name: &str, optional: bool) -> ParamCode {
        let default = optional.then(|| {
            Arc::new(Node {
                kind: NodeKind::Identifier("null".into()),
                span: parser::Span::point(parser::Pos::origin()),
                source: Source::new("", None),
            })
        });
        ParamCode {
            name: name.into(),
            default,
        }
    }

    fn pos(n: u32) -> ArgumentValue {
        ArgumentValue::positional(Value(n))
    }

    #[test]
    fn positional_then_named() {
        let params = [param("a", false), param("b", false), param("c", true)];
        let slots = bind_arguments(
            &params,
            &[ArgumentValue::named("b", Value(2)), pos(1)],
        )
        .unwrap();
        assert_eq!(slots, vec![Some(Value(1)), Some(Value(2)), None]);
    }

    #[test]
    fn zero_parameter_block_rejects_arguments() {
        assert_eq!(
            bind_arguments(&[], &[pos(1)]),
            Err(RuntimeErrorKind::TooManyArguments { max: 0, given: 1 })
        );
        assert_eq!(bind_arguments(&[], &[]), Ok(vec![]));
    }

    #[test]
    fn too_many_positional() {
        let params = [param("a", false)];
        assert_eq!(
            bind_arguments(&params, &[pos(1), pos(2)]),
            Err(RuntimeErrorKind::TooManyArguments { max: 1, given: 2 })
        );
    }

    #[test]
    fn unknown_names() {
        let params = [param("a", true)];
        assert_eq!(
            bind_arguments(&params, &[ArgumentValue::named("zz", Value(1))]),
            Err(RuntimeErrorKind::UnknownNamedArguments {
                names: vec!["zz".into()]
            })
        );
    }

    #[test]
    fn duplicates() {
        let params = [param("a", false), param("b", true)];
        assert_eq!(
            bind_arguments(&params, &[pos(1), ArgumentValue::named("a", Value(2))]),
            Err(RuntimeErrorKind::DuplicateArgument { name: "a".into() })
        );
    }

    #[test]
    fn missing_counts_required_and_optional() {
        let params = [param("a", false), param("b", false), param("c", true)];
        assert_eq!(
            bind_arguments(&params, &[pos(1)]),
            Err(RuntimeErrorKind::MissingArguments {
                required: 2,
                optional: 1,
                given: 1
            })
        );
    }

    #[test]
    fn unfilled_required_parameter() {
        let params = [param("a", true), param("b", false)];
        assert_eq!(
            bind_arguments(&params, &[ArgumentValue::named("a", Value(1))]),
            Err(RuntimeErrorKind::UnfilledParameters {
                names: vec!["b".into()]
            })
        );
    }

    #[test]
    fn primitive_arity() {
        assert_eq!(check_primitive_arity(1, &[pos(1)]), Ok(()));
        assert_eq!(
            check_primitive_arity(1, &[]),
            Err(RuntimeErrorKind::MissingArguments {
                required: 1,
                optional: 0,
                given: 0
            })
        );
        assert_eq!(
            check_primitive_arity(0, &[pos(1)]),
            Err(RuntimeErrorKind::TooManyArguments { max: 0, given: 1 })
        );
    }
}
