use crate::{Heap, NativeData, Value, primitives};

/// Singletons and root prototypes, created once per heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialObjects {
    /// Root of every prototype chain.
    pub object: Value,
    pub null: Value,
    pub true_object: Value,
    pub false_object: Value,
    pub number: Value,
    pub string: Value,
    pub array: Value,
    pub slot: Value,
    pub block: Value,
    pub io: Value,
    /// Top-level scope; binds the prototypes by name.
    pub world: Value,
}

impl SpecialObjects {
    /// Placeholder used until [`bootstrap`] has run.
    pub(crate) const fn dangling() -> Self {
        let v = Value(0);
        Self {
            object: v,
            null: v,
            true_object: v,
            false_object: v,
            number: v,
            string: v,
            array: v,
            slot: v,
            block: v,
            io: v,
            world: v,
        }
    }
}

/// Allocate the root objects, bind them in the world and install the
/// built-in library.
pub(crate) fn bootstrap(heap: &mut Heap) {
    let object = heap.allocate(None, None);
    let null = heap.allocate(Some(object), None);
    let true_object = heap.allocate(Some(object), Some(NativeData::Boolean(true)));
    let false_object =
        heap.allocate(Some(object), Some(NativeData::Boolean(false)));
    let number = heap.allocate(Some(object), None);
    let string = heap.allocate(Some(object), None);
    let array = heap.allocate(Some(object), None);
    let slot = heap.allocate(Some(object), None);
    let block = heap.allocate(Some(object), None);
    let io = heap.allocate(Some(object), None);
    let world = heap.allocate(Some(object), None);

    heap.specials = SpecialObjects {
        object,
        null,
        true_object,
        false_object,
        number,
        string,
        array,
        slot,
        block,
        io,
        world,
    };

    let bindings = [
        ("Object", object),
        ("Number", number),
        ("String", string),
        ("Array", array),
        ("Slot", slot),
        ("Block", block),
        ("IO", io),
        ("World", world),
    ];
    for (name, value) in bindings {
        heap.add_slot(world, name, value, None);
    }

    primitives::install(heap);
    log::debug!("bootstrapped {} objects", heap.len());
}
