use crate::{PrimitiveContext, RuntimeErrorKind, Value};

fn items(ctx: &PrimitiveContext) -> Result<Vec<Value>, RuntimeErrorKind> {
    ctx.heap
        .array_value(ctx.receiver)
        .map(<[Value]>::to_vec)
        .ok_or_else(|| {
            RuntimeErrorKind::TypeError(format!(
                "receiver must be an array, got a {}",
                ctx.heap.kind_name(ctx.receiver)
            ))
        })
}

pub fn length(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let len = items(ctx)?.len();
    Ok(ctx.heap.number(len as f64))
}

pub fn at(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let items = items(ctx)?;
    let index = ctx.expect_number(ctx.argument(0), "index")?;
    if index.fract() != 0.0 || index < 0.0 || index >= items.len() as f64 {
        return Err(RuntimeErrorKind::TypeError(format!(
            "index {index} out of range for an array of length {}",
            items.len()
        )));
    }
    Ok(items[index as usize])
}

#[cfg(test)]
mod tests {
    use crate::primitives::tests::{Recorder, call};
    use crate::{Heap, HeapCreateInfo, RuntimeErrorKind};

    #[test]
    fn length_and_indexing() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let a = heap.string("a");
        let b = heap.string("b");
        let arr = heap.array(vec![a, b]);
        let len = call(&mut heap, &platform, arr, "length", &[]).unwrap();
        assert_eq!(heap.number_value(len), Some(2.0));
        let one = heap.number(1.0);
        assert_eq!(call(&mut heap, &platform, arr, "at", &[one]).unwrap(), b);
    }

    #[test]
    fn out_of_range() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let arr = heap.array(Vec::new());
        let zero = heap.number(0.0);
        assert_eq!(
            call(&mut heap, &platform, arr, "at", &[zero]),
            Err(RuntimeErrorKind::TypeError(
                "index 0 out of range for an array of length 0".into()
            ))
        );
    }
}
