use crate::{PrimitiveContext, RuntimeErrorKind, Value};

type NumberOp = fn(f64, f64) -> f64;
type CompareOp = fn(f64, f64) -> bool;

fn operands(
    ctx: &PrimitiveContext,
) -> Result<(f64, f64), RuntimeErrorKind> {
    let a = ctx.expect_number(ctx.receiver, "receiver")?;
    let b = ctx.expect_number(ctx.argument(0), "argument")?;
    Ok((a, b))
}

fn number_binop(
    ctx: &mut PrimitiveContext,
    op: NumberOp,
) -> Result<Value, RuntimeErrorKind> {
    let (a, b) = operands(ctx)?;
    Ok(ctx.heap.number(op(a, b)))
}

fn number_compare(
    ctx: &mut PrimitiveContext,
    op: CompareOp,
) -> Result<Value, RuntimeErrorKind> {
    let (a, b) = operands(ctx)?;
    Ok(ctx.heap.boolean(op(a, b)))
}

pub fn add(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_binop(ctx, |a, b| a + b)
}

pub fn sub(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_binop(ctx, |a, b| a - b)
}

pub fn mul(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_binop(ctx, |a, b| a * b)
}

// host float semantics: x / 0 is infinite, 0 / 0 is NaN
pub fn div(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_binop(ctx, |a, b| a / b)
}

pub fn rem(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_binop(ctx, |a, b| a % b)
}

pub fn gt(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_compare(ctx, |a, b| a > b)
}

pub fn geq(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_compare(ctx, |a, b| a >= b)
}

pub fn lt(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_compare(ctx, |a, b| a < b)
}

pub fn leq(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    number_compare(ctx, |a, b| a <= b)
}

/// Equality never fails: a number is simply unequal to anything else.
pub fn eq(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let equal = match (
        ctx.heap.number_value(ctx.receiver),
        ctx.heap.number_value(ctx.argument(0)),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    Ok(ctx.heap.boolean(equal))
}

pub fn neq(ctx: &mut PrimitiveContext) -> Result<Value, RuntimeErrorKind> {
    let equal = eq(ctx)? == ctx.heap.boolean(true);
    Ok(ctx.heap.boolean(!equal))
}

#[cfg(test)]
mod tests {
    use crate::primitives::tests::{Recorder, call};
    use crate::{Heap, HeapCreateInfo, RuntimeErrorKind};

    fn binary(heap: &mut Heap, a: f64, op: &str, b: f64) -> crate::Value {
        let platform = Recorder::default();
        let a = heap.number(a);
        let b = heap.number(b);
        call(heap, &platform, a, op, &[b]).unwrap()
    }

    #[test]
    fn arithmetic() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let cases = [
            (1.0, "+", 1.0, 2.0),
            (1.0, "-", 1.0, 0.0),
            (1.0, "*", 3.0, 3.0),
            (10.0, "/", 2.0, 5.0),
            (7.0, "%", 4.0, 3.0),
        ];
        for (a, op, b, expected) in cases {
            let result = binary(&mut heap, a, op, b);
            assert_eq!(heap.number_value(result), Some(expected), "{a} {op} {b}");
            assert_eq!(heap.get(result).parents, vec![heap.specials.number]);
        }
    }

    #[test]
    fn comparisons_return_singletons() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let t = heap.specials.true_object;
        let f = heap.specials.false_object;
        assert_eq!(binary(&mut heap, 1.0, ">=", 1.0), t);
        assert_eq!(binary(&mut heap, 1.0, ">", 2.0), f);
        assert_eq!(binary(&mut heap, 1.0, "<", 2.0), t);
        assert_eq!(binary(&mut heap, 2.0, "<=", 1.0), f);
        assert_eq!(binary(&mut heap, 3.0, "==", 3.0), t);
        assert_eq!(binary(&mut heap, 3.0, "!=", 3.0), f);
    }

    #[test]
    fn non_numbers_are_type_errors_except_for_equality() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let platform = Recorder::default();
        let one = heap.number(1.0);
        let text = heap.string("1");
        let err = call(&mut heap, &platform, one, "+", &[text]).unwrap_err();
        assert_eq!(
            err,
            RuntimeErrorKind::TypeError("argument must be a number, got a string".into())
        );
        let eq = call(&mut heap, &platform, one, "==", &[text]).unwrap();
        assert_eq!(eq, heap.specials.false_object);
        let neq = call(&mut heap, &platform, one, "!=", &[text]).unwrap();
        assert_eq!(neq, heap.specials.true_object);
    }
}
