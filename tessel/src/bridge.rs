use crate::{Heap, NativeData, Value};

/// Largest integer magnitude a number payload represents exactly.
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Host-side values that can cross into the object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Number(f64),
    Integer(i64),
    String(String),
    Array(Vec<NativeValue>),
    /// Already an object of the graph; passes through unchanged.
    Object(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Integer outside the exactly representable range.
    LossyInteger(i64),
    /// Handle that does not belong to this heap.
    ForeignObject(Value),
    /// A message name must be a string.
    NotAName { kind: &'static str },
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LossyInteger(n) => {
                write!(f, "integer {n} cannot be represented exactly")
            }
            Self::ForeignObject(v) => {
                write!(f, "object handle {} does not belong to this heap", v.0)
            }
            Self::NotAName { kind } => {
                write!(f, "message names must be strings, got a {kind}")
            }
        }
    }
}

impl std::error::Error for ConversionError {}

impl Heap {
    /// Wrap a host value.
    ///
    /// Booleans and null map onto the singletons; every other value gets a
    /// fresh wrapper, arrays bridging their elements recursively.
    pub fn bridge(&mut self, native: NativeValue) -> Result<Value, ConversionError> {
        match native {
            NativeValue::Null => Ok(self.null()),
            NativeValue::Bool(b) => Ok(self.boolean(b)),
            NativeValue::Number(n) => Ok(self.number(n)),
            NativeValue::Integer(i) => {
                if !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i) {
                    return Err(ConversionError::LossyInteger(i));
                }
                Ok(self.number(i as f64))
            }
            NativeValue::String(s) => Ok(self.string(s)),
            NativeValue::Array(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.bridge(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.array(items))
            }
            NativeValue::Object(value) => {
                if self.contains(value) {
                    Ok(value)
                } else {
                    Err(ConversionError::ForeignObject(value))
                }
            }
        }
    }

    /// Unwrap payload-carrying objects; anything else stays an object.
    pub fn to_native(&self, value: Value) -> NativeValue {
        if self.is_null(value) {
            return NativeValue::Null;
        }
        match &self.get(value).data {
            Some(NativeData::Number(n)) => NativeValue::Number(*n),
            Some(NativeData::String(s)) => NativeValue::String(s.clone()),
            Some(NativeData::Boolean(b)) => NativeValue::Bool(*b),
            Some(NativeData::Array(items)) => NativeValue::Array(
                items.iter().map(|&item| self.to_native(item)).collect(),
            ),
            None => NativeValue::Object(value),
        }
    }

    /// Coarse classification used in error messages.
    pub fn kind_name(&self, value: Value) -> &'static str {
        if self.is_null(value) {
            return "null";
        }
        let object = self.get(value);
        if let Some(data) = &object.data {
            return data.kind();
        }
        if object.is_block() {
            "block"
        } else if object.is_space() {
            "space"
        } else {
            "object"
        }
    }
}
