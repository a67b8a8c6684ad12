use ahash::AHashSet;

use crate::{ConversionError, Heap, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult {
    None,
    Found {
        /// object whose own slots held the name
        holder: Value,
        value: Value,
    },
}

impl LookupResult {
    pub fn value(self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Found { value, .. } => Some(value),
        }
    }
}

impl Heap {
    /// Resolve `name` against `receiver` and its ancestry.
    ///
    /// Parents are searched depth-first in declaration order; the first
    /// object that binds the name wins, even when the bound value is null.
    /// Each object is visited at most once, so parent cycles terminate.
    pub fn lookup(&self, receiver: Value, name: &str) -> LookupResult {
        let mut pending = vec![receiver];
        let mut visited = AHashSet::new();

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let object = self.get(current);
            if let Some(value) = object.slots.get(name) {
                return LookupResult::Found {
                    holder: current,
                    value,
                };
            }
            pending.extend(object.parents.iter().rev());
        }
        LookupResult::None
    }

    /// Message dispatch: the bound value, or null on a miss.
    pub fn dispatch(&self, receiver: Value, name: &str) -> Value {
        self.lookup(receiver, name)
            .value()
            .unwrap_or(self.specials.null)
    }

    /// Dispatch with the message name given as a string object.
    pub fn dispatch_message(
        &self,
        receiver: Value,
        message: Value,
    ) -> Result<Value, ConversionError> {
        match self.string_value(message) {
            Some(name) => Ok(self.dispatch(receiver, name)),
            None => Err(ConversionError::NotAName {
                kind: self.kind_name(message),
            }),
        }
    }
}
