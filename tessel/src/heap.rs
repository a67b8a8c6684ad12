use std::sync::Arc;

use crate::{
    BlockCode, Code, NativeData, Object, ObjectFlags, PrimitiveMessage,
    SpecialObjects, Value, special,
};

#[derive(Debug, Clone)]
pub struct HeapCreateInfo {
    /// Number of object records reserved up front.
    pub initial_capacity: usize,
}

impl Default for HeapCreateInfo {
    fn default() -> Self {
        Self {
            initial_capacity: 4096,
        }
    }
}

/// Arena of every object created during a run.
///
/// Objects are never freed individually; parents and slots refer to each
/// other through [`Value`] handles, so cycles in the graph are harmless.
#[derive(Debug)]
pub struct Heap {
    objects: Vec<Object>,
    pub specials: SpecialObjects,
}

impl Heap {
    pub fn new(info: HeapCreateInfo) -> Self {
        let mut heap = Self {
            objects: Vec::with_capacity(info.initial_capacity),
            specials: SpecialObjects::dangling(),
        };
        special::bootstrap(&mut heap);
        heap
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, value: Value) -> bool {
        value.index() < self.objects.len()
    }

    pub fn get(&self, value: Value) -> &Object {
        &self.objects[value.index()]
    }

    pub fn get_mut(&mut self, value: Value) -> &mut Object {
        &mut self.objects[value.index()]
    }

    fn push(&mut self, object: Object) -> Value {
        let value = Value(self.objects.len() as u32);
        self.objects.push(object);
        value
    }

    pub fn allocate(
        &mut self,
        parent: Option<Value>,
        data: Option<NativeData>,
    ) -> Value {
        self.push(Object::new(parent.into_iter().collect(), data))
    }

    pub fn allocate_with_parents(
        &mut self,
        parents: Vec<Value>,
        data: Option<NativeData>,
    ) -> Value {
        self.push(Object::new(parents, data))
    }

    /// A fresh scope object parented on `target`, then on `previous`.
    pub fn allocate_space(&mut self, target: Value, previous: Value) -> Value {
        let mut parents = vec![target];
        if previous != target {
            parents.push(previous);
        }
        let mut space = Object::new(parents, None);
        space.flags |= ObjectFlags::SPACE;
        self.push(space)
    }

    pub fn allocate_block(&mut self, block: Arc<BlockCode>, scope: Value) -> Value {
        let traits = self.specials.block;
        let object = Object::new(vec![traits], None)
            .with_code(Code::Interpreted { block, scope });
        self.push(object)
    }

    pub fn allocate_primitive(&mut self, message: PrimitiveMessage) -> Value {
        let traits = self.specials.block;
        let object =
            Object::new(vec![traits], None).with_code(Code::Primitive(message));
        self.push(object)
    }

    // ───────────────────────────────────────────────────────────
    //  Wrappers
    // ───────────────────────────────────────────────────────────

    pub fn null(&self) -> Value {
        self.specials.null
    }

    pub fn boolean(&self, value: bool) -> Value {
        if value {
            self.specials.true_object
        } else {
            self.specials.false_object
        }
    }

    pub fn number(&mut self, value: f64) -> Value {
        let traits = self.specials.number;
        self.allocate(Some(traits), Some(NativeData::Number(value)))
    }

    pub fn string(&mut self, value: impl Into<String>) -> Value {
        let traits = self.specials.string;
        self.allocate(Some(traits), Some(NativeData::String(value.into())))
    }

    pub fn array(&mut self, items: Vec<Value>) -> Value {
        let traits = self.specials.array;
        self.allocate(Some(traits), Some(NativeData::Array(items)))
    }

    pub fn number_value(&self, value: Value) -> Option<f64> {
        self.get(value).number()
    }

    pub fn string_value(&self, value: Value) -> Option<&str> {
        self.get(value).string()
    }

    pub fn array_value(&self, value: Value) -> Option<&[Value]> {
        self.get(value).array()
    }

    pub fn is_block(&self, value: Value) -> bool {
        self.get(value).is_block()
    }

    pub fn is_null(&self, value: Value) -> bool {
        value == self.specials.null
    }

    // ───────────────────────────────────────────────────────────
    //  Slots
    // ───────────────────────────────────────────────────────────

    /// Bind a slot without touching the meta layer.
    pub fn set_slot(
        &mut self,
        receiver: Value,
        name: impl Into<Arc<str>>,
        value: Value,
    ) {
        self.get_mut(receiver).slots.insert(name.into(), value);
    }

    /// Bind a slot and (re)build its Slot metaobject.
    pub fn add_slot(
        &mut self,
        receiver: Value,
        name: impl Into<Arc<str>>,
        value: Value,
        comment: Option<&str>,
    ) {
        let name: Arc<str> = name.into();
        let slot_traits = self.specials.slot;
        let meta = self.allocate(Some(slot_traits), None);
        let name_value = self.string(&*name);
        let comment_value = match comment {
            Some(text) => self.string(text),
            None => self.null(),
        };
        self.set_slot(meta, "name", name_value);
        self.set_slot(meta, "value", value);
        self.set_slot(meta, "comment", comment_value);

        let object = self.get_mut(receiver);
        object.slots.insert(name.clone(), value);
        object.meta_slots.insert(name, meta);
    }

    /// The Slot metaobject for `name` on `receiver` itself, or null.
    pub fn slot_meta(&self, receiver: Value, name: &str) -> Value {
        self.get(receiver)
            .meta_slots
            .get(name)
            .unwrap_or(self.specials.null)
    }

    pub fn add_parent(&mut self, receiver: Value, parent: Value) {
        self.get_mut(receiver).parents.push(parent);
    }
}
