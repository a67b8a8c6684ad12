use crate::{PrimitiveContext, RuntimeErrorKind, Value, format};

pub fn clone(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    Ok(ctx.heap.allocate(Some(ctx.receiver), None))
}

pub fn identical(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    Ok(ctx.heap.boolean(ctx.receiver == ctx.argument(0)))
}

pub fn not_identical(
    ctx: &mut PrimitiveContext,
) -> Result<Value, RuntimeErrorKind> {
    Ok(ctx.heap.boolean(ctx.receiver != ctx.argument(0)))
}

/// Slot metaobject of an own slot, or null.
pub fn meta(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let name = ctx.expect_string(ctx.argument(0), "slot name")?;
    Ok(ctx.heap.slot_meta(ctx.receiver, &name))
}

/// Strict lookup: unlike a plain send, a miss is an error.
pub fn get(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let name = ctx.expect_string(ctx.argument(0), "slot name")?;
    ctx.heap
        .lookup(ctx.receiver, &name)
        .value()
        .ok_or(RuntimeErrorKind::SlotNotFound { name })
}

pub fn parents(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let parents = ctx.heap.get(ctx.receiver).parents.clone();
    Ok(ctx.heap.array(parents))
}

pub fn add_parent(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    ctx.heap.add_parent(ctx.receiver, ctx.argument(0));
    Ok(ctx.receiver)
}

/// `<object #7> { x, y }`: the inspected receiver and its own slot names.
pub fn describe(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let mut text = format::inspect(ctx.heap, ctx.receiver);
    let names: Vec<&str> = ctx.heap.get(ctx.receiver).slots.names().collect();
    if !names.is_empty() {
        text.push_str(" { ");
        text.push_str(&names.join(", "));
        text.push_str(" }");
    }
    Ok(ctx.heap.string(text))
}

#[cfg(test)]
mod tests {
    use crate::primitives::tests::{Recorder, call};
    use crate::{Heap, HeapCreateInfo, RuntimeErrorKind};

    #[test]
    fn clone_delegates_to_the_original() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let proto = heap.allocate(Some(heap.specials.object), None);
        let x = heap.number(1.0);
        heap.add_slot(proto, "x", x, None);
        let copy = call(&mut heap, &platform, proto, "clone", &[]).unwrap();
        assert_ne!(copy, proto);
        assert_eq!(heap.get(copy).parents, vec![proto]);
        assert_eq!(heap.dispatch(copy, "x"), x);
    }

    #[test]
    fn identity_comparison() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let a = heap.allocate(Some(heap.specials.object), None);
        let b = heap.allocate(Some(heap.specials.object), None);
        assert_eq!(
            call(&mut heap, &platform, a, "==", &[a]).unwrap(),
            heap.specials.true_object
        );
        assert_eq!(
            call(&mut heap, &platform, a, "!=", &[b]).unwrap(),
            heap.specials.true_object
        );
    }

    #[test]
    fn meta_and_get() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let obj = heap.allocate(Some(heap.specials.object), None);
        let v = heap.number(3.0);
        heap.add_slot(obj, "v", v, Some("three"));
        let name = heap.string("v");
        let meta = call(&mut heap, &platform, obj, "meta", &[name]).unwrap();
        let comment = heap.dispatch(meta, "comment");
        assert_eq!(heap.string_value(comment), Some("three"));
        assert_eq!(call(&mut heap, &platform, obj, "get", &[name]).unwrap(), v);

        let missing = heap.string("w");
        assert_eq!(
            call(&mut heap, &platform, obj, "get", &[missing]),
            Err(RuntimeErrorKind::SlotNotFound { name: "w".into() })
        );
        assert_eq!(
            call(&mut heap, &platform, obj, "meta", &[missing]).unwrap(),
            heap.null()
        );
    }

    #[test]
    fn parents_and_add_parent() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let root = heap.specials.object;
        let obj = heap.allocate(Some(root), None);
        let mixin = heap.allocate(Some(root), None);
        let back = call(&mut heap, &platform, obj, "addParent", &[mixin]).unwrap();
        assert_eq!(back, obj);
        let parents = call(&mut heap, &platform, obj, "parents", &[]).unwrap();
        assert_eq!(heap.array_value(parents), Some(&[root, mixin][..]));
    }

    #[test]
    fn describe_lists_own_slots() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let obj = heap.allocate(Some(heap.specials.object), None);
        let id = heap.get(obj).id;
        let one = heap.number(1.0);
        heap.add_slot(obj, "a", one, None);
        heap.add_slot(obj, "b", one, None);
        let text = call(&mut heap, &platform, obj, "describe", &[]).unwrap();
        assert_eq!(
            heap.string_value(text),
            Some(format!("<object #{id}> {{ a, b }}").as_str())
        );
    }
}
