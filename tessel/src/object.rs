use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{BlockCode, PrimitiveMessage, SlotMap};

/// Handle to an object living in a [`crate::Heap`].
///
/// Handles are only meaningful for the heap that produced them.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(pub(crate) u32);

impl Value {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjectFlags: u8 {
        /// executable block: parameters + body + captured scope
        const CODE_BLOCK = 1 << 0;
        /// block backed by a native function
        const BUILT_IN = 1 << 1;
        /// scope object created by a block activation
        const SPACE = 1 << 2;
    }
}

/// Embedded native payload of wrapper objects.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeData {
    Number(f64),
    String(String),
    Boolean(bool),
    Array(Vec<Value>),
}

impl NativeData {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Array(_) => "array",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Code {
    Interpreted {
        block: Arc<BlockCode>,
        /// defining space, captured by reference
        scope: Value,
    },
    Primitive(PrimitiveMessage),
}

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn next_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct Object {
    /// Process-unique, never reused.
    pub id: u64,
    pub parents: Vec<Value>,
    pub slots: SlotMap,
    pub meta_slots: SlotMap,
    pub data: Option<NativeData>,
    pub flags: ObjectFlags,
    pub code: Option<Code>,
}

impl Object {
    pub fn new(parents: Vec<Value>, data: Option<NativeData>) -> Self {
        Self {
            id: next_object_id(),
            parents,
            slots: SlotMap::new(),
            meta_slots: SlotMap::new(),
            data,
            flags: ObjectFlags::empty(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: Code) -> Self {
        self.flags |= ObjectFlags::CODE_BLOCK;
        if matches!(code, Code::Primitive(_)) {
            self.flags |= ObjectFlags::BUILT_IN;
        }
        self.code = Some(code);
        self
    }

    pub fn is_block(&self) -> bool {
        self.flags.contains(ObjectFlags::CODE_BLOCK)
    }

    pub fn is_built_in(&self) -> bool {
        self.flags.contains(ObjectFlags::BUILT_IN)
    }

    pub fn is_space(&self) -> bool {
        self.flags.contains(ObjectFlags::SPACE)
    }

    pub fn number(&self) -> Option<f64> {
        match self.data {
            Some(NativeData::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn string(&self) -> Option<&str> {
        match &self.data {
            Some(NativeData::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&[Value]> {
        match &self.data {
            Some(NativeData::Array(items)) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = Object::new(Vec::new(), None);
        let b = Object::new(Vec::new(), None);
        assert!(b.id > a.id);
    }

    #[test]
    fn payload_accessors() {
        let n = Object::new(Vec::new(), Some(NativeData::Number(2.5)));
        assert_eq!(n.number(), Some(2.5));
        assert_eq!(n.string(), None);
        let s = Object::new(Vec::new(), Some(NativeData::String("hi".into())));
        assert_eq!(s.string(), Some("hi"));
        assert_eq!(s.data.as_ref().map(NativeData::kind), Some("string"));
    }

    #[test]
    fn code_sets_flags() {
        let block = Object::new(Vec::new(), None).with_code(Code::Primitive(
            PrimitiveMessage::new("noop", 0, |ctx| Ok(ctx.receiver)),
        ));
        assert!(block.is_block());
        assert!(block.is_built_in());
        assert!(!block.is_space());
    }
}
