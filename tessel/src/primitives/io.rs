use crate::{PrimitiveContext, RuntimeErrorKind, Value, format};

pub fn puts(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let mut line = format::display(ctx.heap, ctx.argument(0));
    line.push('\n');
    ctx.platform.write_output(&line);
    Ok(ctx.heap.null())
}

#[cfg(test)]
mod tests {
    use crate::primitives::tests::{Recorder, call};
    use crate::{Heap, HeapCreateInfo};

    #[test]
    fn puts_writes_display_text() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let io = heap.specials.io;
        let s = heap.string("hello");
        let n = heap.number(2.5);
        assert_eq!(call(&mut heap, &platform, io, "puts", &[s]).unwrap(), heap.null());
        call(&mut heap, &platform, io, "puts", &[n]).unwrap();
        assert_eq!(&*platform.output.lock(), "hello\n2.5\n");
    }
}
