use std::fmt::Write;

use crate::{Heap, NativeData, Value};

fn number_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn render(heap: &Heap, value: Value, quoted: bool) -> String {
    if heap.is_null(value) {
        return "null".to_string();
    }
    let object = heap.get(value);
    match &object.data {
        Some(NativeData::Number(n)) => number_text(*n),
        Some(NativeData::String(s)) if quoted => quote(s),
        Some(NativeData::String(s)) => s.clone(),
        Some(NativeData::Boolean(b)) => b.to_string(),
        Some(NativeData::Array(items)) => {
            let mut out = String::from("[");
            for (i, &item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render(heap, item, true));
            }
            out.push(']');
            out
        }
        None if object.is_block() => "<block>".to_string(),
        None => {
            let mut out = String::new();
            let _ = write!(out, "<object #{}>", object.id);
            out
        }
    }
}

/// Text written by `IO.puts` and produced by string concatenation.
pub fn display(heap: &Heap, value: Value) -> String {
    render(heap, value, false)
}

/// Like [`display`], but strings are quoted.
pub fn inspect(heap: &Heap, value: Value) -> String {
    render(heap, value, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeapCreateInfo;

    #[test]
    fn numbers_print_without_trailing_fraction() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let two = heap.number(2.0);
        let half = heap.number(0.5);
        let neg = heap.number(-3.0);
        assert_eq!(display(&heap, two), "2");
        assert_eq!(display(&heap, half), "0.5");
        assert_eq!(display(&heap, neg), "-3");
    }

    #[test]
    fn strings_quote_only_when_inspected() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let s = heap.string("say \"hi\"\n");
        assert_eq!(display(&heap, s), "say \"hi\"\n");
        assert_eq!(inspect(&heap, s), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn singletons_and_containers() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let one = heap.number(1.0);
        let s = heap.string("x");
        let arr = heap.array(vec![one, s, heap.null()]);
        assert_eq!(display(&heap, arr), "[1, \"x\", null]");
        assert_eq!(display(&heap, heap.specials.true_object), "true");
        assert_eq!(display(&heap, heap.null()), "null");
        let plus = heap.dispatch(heap.specials.number, "+");
        assert_eq!(display(&heap, plus), "<block>");
        let plain = heap.allocate(None, None);
        let id = heap.get(plain).id;
        assert_eq!(display(&heap, plain), format!("<object #{id}>"));
    }
}
