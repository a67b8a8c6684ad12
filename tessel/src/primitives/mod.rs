use crate::{Heap, Platform, RuntimeErrorKind, Value};

mod array;
mod io;
mod number;
mod object;
mod string;

pub type PrimitiveFunction =
    fn(&mut PrimitiveContext) -> Result<Value, RuntimeErrorKind>;

// the receiver does not count as input
// e.g. `+` => `3 + 5` has inputs: 1
#[derive(Debug, Copy, Clone)]
pub struct PrimitiveMessage {
    pub name: &'static str,
    pub inputs: usize,
    pub ptr: PrimitiveFunction,
}

impl PrimitiveMessage {
    pub const fn new(
        name: &'static str,
        inputs: usize,
        ptr: PrimitiveFunction,
    ) -> Self {
        Self { name, inputs, ptr }
    }
}

pub struct PrimitiveContext<'a> {
    pub heap: &'a mut Heap,
    pub platform: &'a dyn Platform,
    pub receiver: Value,
    pub arguments: &'a [Value],
}

impl PrimitiveContext<'_> {
    pub fn argument(&self, index: usize) -> Value {
        self.arguments[index]
    }

    pub(crate) fn expect_number(
        &self,
        value: Value,
        what: &str,
    ) -> Result<f64, RuntimeErrorKind> {
        self.heap.number_value(value).ok_or_else(|| {
            RuntimeErrorKind::TypeError(format!(
                "{what} must be a number, got a {}",
                self.heap.kind_name(value)
            ))
        })
    }

    pub(crate) fn expect_string(
        &self,
        value: Value,
        what: &str,
    ) -> Result<String, RuntimeErrorKind> {
        self.heap
            .string_value(value)
            .map(str::to_string)
            .ok_or_else(|| {
                RuntimeErrorKind::TypeError(format!(
                    "{what} must be a string, got a {}",
                    self.heap.kind_name(value)
                ))
            })
    }
}

pub const NUMBER_PRIMITIVES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("+", 1, number::add),
    PrimitiveMessage::new("-", 1, number::sub),
    PrimitiveMessage::new("*", 1, number::mul),
    PrimitiveMessage::new("/", 1, number::div),
    PrimitiveMessage::new("%", 1, number::rem),
    PrimitiveMessage::new(">", 1, number::gt),
    PrimitiveMessage::new(">=", 1, number::geq),
    PrimitiveMessage::new("<", 1, number::lt),
    PrimitiveMessage::new("<=", 1, number::leq),
    PrimitiveMessage::new("==", 1, number::eq),
    PrimitiveMessage::new("!=", 1, number::neq),
];

pub const STRING_PRIMITIVES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("+", 1, string::concat),
    PrimitiveMessage::new("==", 1, string::eq),
    PrimitiveMessage::new("!=", 1, string::neq),
    PrimitiveMessage::new("length", 0, string::length),
];

pub const OBJECT_PRIMITIVES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("clone", 0, object::clone),
    PrimitiveMessage::new("==", 1, object::identical),
    PrimitiveMessage::new("!=", 1, object::not_identical),
    PrimitiveMessage::new("meta", 1, object::meta),
    PrimitiveMessage::new("get", 1, object::get),
    PrimitiveMessage::new("parents", 0, object::parents),
    PrimitiveMessage::new("addParent", 1, object::add_parent),
    PrimitiveMessage::new("describe", 0, object::describe),
];

pub const ARRAY_PRIMITIVES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("length", 0, array::length),
    PrimitiveMessage::new("at", 1, array::at),
];

pub const IO_PRIMITIVES: &[PrimitiveMessage] =
    &[PrimitiveMessage::new("puts", 1, io::puts)];

/// Register every table as built-in block slots on its prototype.
pub(crate) fn install(heap: &mut Heap) {
    let s = heap.specials;
    let tables = [
        (s.object, OBJECT_PRIMITIVES),
        (s.number, NUMBER_PRIMITIVES),
        (s.string, STRING_PRIMITIVES),
        (s.array, ARRAY_PRIMITIVES),
        (s.io, IO_PRIMITIVES),
    ];
    for (target, table) in tables {
        for message in table {
            let block = heap.allocate_primitive(*message);
            heap.add_slot(target, message.name, block, Some("built-in"));
        }
    }
}
