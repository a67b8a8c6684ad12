use std::sync::Arc;

use ahash::AHashMap;
use parser::{Expr, ExprKind};

use crate::{
    ArgumentCode, AssignCode, BlockCode, Heap, Node, NodeKind, NodeRef,
    ParamCode, SendCode, Source, Value,
};

// ── Environment ─────────────────────────────────────────────────────

struct MaterializeEnv<'a> {
    heap: &'a mut Heap,
    source: Arc<Source>,
    /// keyed by bit pattern so that `0.5` and `0.50` share an object
    numbers: AHashMap<u64, Value>,
    strings: AHashMap<String, Value>,
}

impl MaterializeEnv<'_> {
    fn node(&self, kind: NodeKind, expr: &Expr) -> NodeRef {
        Arc::new(Node {
            kind,
            span: expr.span,
            source: self.source.clone(),
        })
    }

    fn number(&mut self, n: f64) -> Value {
        if let Some(&value) = self.numbers.get(&n.to_bits()) {
            return value;
        }
        let value = self.heap.number(n);
        self.numbers.insert(n.to_bits(), value);
        value
    }

    fn string(&mut self, s: &str) -> Value {
        if let Some(&value) = self.strings.get(s) {
            return value;
        }
        let value = self.heap.string(s);
        self.strings.insert(s.to_string(), value);
        value
    }

    // ── Lowering ─────────────────────────────────────────────────

    fn lower(&mut self, expr: &Expr) -> NodeRef {
        let kind = match &expr.kind {
            ExprKind::Number(n) => NodeKind::Constant(self.number(*n)),
            ExprKind::String(s) => NodeKind::Constant(self.string(s)),
            ExprKind::Boolean(b) => NodeKind::Constant(self.heap.boolean(*b)),
            ExprKind::Null => NodeKind::Constant(self.heap.null()),
            ExprKind::Identifier(name) => NodeKind::Identifier(name.as_str().into()),
            ExprKind::Block { params, body } => {
                let params = params
                    .iter()
                    .map(|p| ParamCode {
                        name: p.name.as_str().into(),
                        default: p.default.as_ref().map(|d| self.lower(d)),
                    })
                    .collect();
                let body = body.iter().map(|e| self.lower(e)).collect();
                NodeKind::Block(Arc::new(BlockCode { params, body }))
            }
            ExprKind::Assignment {
                receiver,
                name,
                value,
                comment,
            } => NodeKind::Assignment(Arc::new(AssignCode {
                receiver: receiver.as_deref().map(|r| self.lower(r)),
                name: name.as_str().into(),
                value: self.lower(value),
                comment: comment.as_deref().map(Arc::from),
            })),
            ExprKind::MessageSend {
                receiver,
                selector,
                arguments,
                ..
            } => {
                let receiver = receiver.as_deref().map(|r| self.lower(r));
                let arguments = arguments
                    .iter()
                    .map(|a| ArgumentCode {
                        name: a.name.as_deref().map(Arc::from),
                        value: self.lower(&a.value),
                    })
                    .collect();
                NodeKind::Send(Arc::new(SendCode {
                    receiver,
                    selector: selector.as_str().into(),
                    arguments,
                }))
            }
        };
        self.node(kind, expr)
    }
}

/// Lower one source unit's expressions into executable nodes.
///
/// Number and string literals are interned per distinct value within the
/// unit: every occurrence of `"A"` in `source` shares one object.
pub fn materialize(heap: &mut Heap, source: Arc<Source>, exprs: &[Expr]) -> Vec<NodeRef> {
    let mut env = MaterializeEnv {
        heap,
        source,
        numbers: AHashMap::new(),
        strings: AHashMap::new(),
    };
    exprs.iter().map(|e| env.lower(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeapCreateInfo;

    fn lower(heap: &mut Heap, text: &str) -> Vec<NodeRef> {
        let exprs = parser::parse_source(text, None).unwrap();
        materialize(heap, Source::new(text, None), &exprs)
    }

    fn constant(node: &NodeRef) -> Value {
        match &node.kind {
            NodeKind::Constant(v) => *v,
            other => panic!("expected constant, got {other:?}"),
        }
    }

    #[test]
    fn literals_are_interned_per_unit() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let nodes = lower(&mut heap, "\"A\"; \"A\"; 1; 1.0; \"B\"");
        assert_eq!(constant(&nodes[0]), constant(&nodes[1]));
        assert_eq!(constant(&nodes[2]), constant(&nodes[3]));
        assert_ne!(constant(&nodes[0]), constant(&nodes[4]));

        let again = lower(&mut heap, "\"A\"");
        assert_ne!(constant(&again[0]), constant(&nodes[0]));
    }

    #[test]
    fn booleans_and_null_are_singletons() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let nodes = lower(&mut heap, "true; false; null");
        assert_eq!(constant(&nodes[0]), heap.specials.true_object);
        assert_eq!(constant(&nodes[1]), heap.specials.false_object);
        assert_eq!(constant(&nodes[2]), heap.specials.null);
    }

    #[test]
    fn nodes_keep_source_and_span() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let text = "x = 1\nfoo.bar(2, by: 3)";
        let exprs = parser::parse_source(text, Some("demo.tsl")).unwrap();
        let nodes = materialize(&mut heap, Source::new(text, Some("demo.tsl")), &exprs);
        assert_eq!(nodes[1].span.start.line, 2);
        assert_eq!(nodes[1].source.label.as_deref(), Some("demo.tsl"));
        match &nodes[1].kind {
            NodeKind::Send(send) => {
                assert_eq!(&*send.selector, "bar");
                assert!(send.receiver.is_some());
                assert_eq!(send.arguments[1].name.as_deref(), Some("by"));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn comments_travel_with_assignments() {
        let mut heap = Heap::new(HeapCreateInfo::default());
        let nodes = lower(&mut heap, "// documented\nx = 1");
        match &nodes[0].kind {
            NodeKind::Assignment(assign) => {
                assert_eq!(assign.comment.as_deref(), Some("documented"));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }
}
