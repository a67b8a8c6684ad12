use crate::{PrimitiveContext, RuntimeErrorKind, Value, format};

/// Concatenation converts the argument to display text; the result is
/// always a fresh string object.
pub fn concat(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let mut text = ctx.expect_string(ctx.receiver, "receiver")?;
    text.push_str(&format::display(ctx.heap, ctx.argument(0)));
    Ok(ctx.heap.string(text))
}

fn equal(ctx: &PrimitiveContext) -> bool {
    match (
        ctx.heap.string_value(ctx.receiver),
        ctx.heap.string_value(ctx.argument(0)),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub fn eq(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let result = equal(ctx);
    Ok(ctx.heap.boolean(result))
}

pub fn neq(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let result = !equal(ctx);
    Ok(ctx.heap.boolean(result))
}

/// Length in characters.
pub fn length(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let count = ctx.expect_string(ctx.receiver, "receiver")?.chars().count();
    Ok(ctx.heap.number(count as f64))
}
