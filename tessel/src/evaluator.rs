//! Synchronous reference interpreter.
//!
//! A plain recursive walk over the same nodes the cooperative engine runs.
//! Scopes are the same heap spaces the engine builds, so a block created
//! here can be called by the engine and the other way round. It blocks
//! until the program finishes and serves as the oracle the engine is
//! tested against.
//!
//! Recursion uses the native stack, one bounded level per nested node, so
//! callers run it on a thread sized for `max_depth` (see [`crate::VM`]).

use crate::{
    ArgumentValue, BlockCode, Code, Heap, Location, NodeKind, NodeRef, Platform,
    PrimitiveContext, RuntimeError, RuntimeErrorKind, SendCode, Value,
    activation::{bind_arguments, check_primitive_arity},
    format,
};

#[derive(Debug)]
pub struct Evaluator {
    world: Value,
    depth: usize,
    max_depth: usize,
}

impl Evaluator {
    pub fn new(world: Value, max_depth: usize) -> Self {
        Self {
            world,
            depth: 0,
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluate `nodes` in the world, returning the last value.
    pub fn evaluate(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        nodes: &[NodeRef],
    ) -> Result<Value, RuntimeError> {
        self.depth = 0;
        self.eval_sequence(heap, platform, nodes, self.world)
    }

    pub fn call_block(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        block: Value,
        receiver: Option<Value>,
        arguments: Vec<ArgumentValue>,
    ) -> Result<Value, RuntimeError> {
        self.depth = 0;
        if !heap.is_block(block) {
            return Err(RuntimeError::new(RuntimeErrorKind::NotABlock {
                selector: format::inspect(heap, block),
            }));
        }
        self.invoke(heap, platform, block, receiver, &arguments, self.world, None)
    }

    // ── Evaluation ──────────────────────────────────────────────────

    fn eval_sequence(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        nodes: &[NodeRef],
        space: Value,
    ) -> Result<Value, RuntimeError> {
        let mut last = heap.null();
        for node in nodes {
            last = self.eval(heap, platform, node, space)?;
        }
        Ok(last)
    }

    fn eval(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        node: &NodeRef,
        space: Value,
    ) -> Result<Value, RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::at(
                RuntimeErrorKind::StackOverflow {
                    limit: self.max_depth,
                },
                node.location(),
            ));
        }
        self.depth += 1;
        let result = self.eval_kind(heap, platform, node, space);
        self.depth -= 1;
        result
    }

    fn eval_kind(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        node: &NodeRef,
        space: Value,
    ) -> Result<Value, RuntimeError> {
        match &node.kind {
            NodeKind::Constant(value) => Ok(*value),
            // a name bound nowhere reads as null
            NodeKind::Identifier(name) => Ok(heap.dispatch(space, name)),
            NodeKind::Block(code) => Ok(heap.allocate_block(code.clone(), space)),
            NodeKind::Assignment(assign) => {
                let target = match &assign.receiver {
                    Some(receiver) => self.eval(heap, platform, receiver, space)?,
                    None => space,
                };
                let value = self.eval(heap, platform, &assign.value, space)?;
                heap.add_slot(target, assign.name.clone(), value, assign.comment.as_deref());
                Ok(value)
            }
            NodeKind::Send(send) => self.send(heap, platform, send, space, node.location()),
        }
    }

    fn send(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        send: &SendCode,
        space: Value,
        location: Location,
    ) -> Result<Value, RuntimeError> {
        let receiver = match &send.receiver {
            Some(receiver) => Some(self.eval(heap, platform, receiver, space)?),
            None => None,
        };
        let mut arguments = Vec::with_capacity(send.arguments.len());
        for argument in &send.arguments {
            arguments.push(ArgumentValue {
                name: argument.name.clone(),
                value: self.eval(heap, platform, &argument.value, space)?,
            });
        }
        let target = receiver.unwrap_or(space);

        if receiver.is_some() && heap.is_block(target) && &*send.selector == "call" {
            return self.invoke(heap, platform, target, None, &arguments, space, Some(&location));
        }
        let Some(value) = heap.lookup(target, &send.selector).value() else {
            return Err(RuntimeError::at(
                RuntimeErrorKind::MessageNotUnderstood {
                    selector: send.selector.to_string(),
                    receiver: format::inspect(heap, target),
                },
                location,
            ));
        };
        if heap.is_block(value) {
            self.invoke(heap, platform, value, receiver, &arguments, space, Some(&location))
        } else if arguments.is_empty() {
            Ok(value)
        } else {
            Err(RuntimeError::at(
                RuntimeErrorKind::NotABlock {
                    selector: send.selector.to_string(),
                },
                location,
            ))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn invoke(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        block: Value,
        receiver: Option<Value>,
        arguments: &[ArgumentValue],
        space: Value,
        location: Option<&Location>,
    ) -> Result<Value, RuntimeError> {
        let located = |kind| match location {
            Some(location) => RuntimeError::at(kind, location.clone()),
            None => RuntimeError::new(kind),
        };
        match heap.get(block).code.clone() {
            Some(Code::Primitive(message)) => {
                check_primitive_arity(message.inputs, arguments).map_err(located)?;
                let values: Vec<Value> = arguments.iter().map(|a| a.value).collect();
                let mut ctx = PrimitiveContext {
                    heap,
                    platform,
                    receiver: receiver.unwrap_or(space),
                    arguments: &values,
                };
                (message.ptr)(&mut ctx).map_err(located)
            }
            Some(Code::Interpreted { block: code, scope }) => {
                let bound = bind_arguments(&code.params, arguments).map_err(located)?;
                let space = activate(heap, &code, scope, receiver, &bound);
                self.run_body(heap, platform, &code, &bound, space)
            }
            None => Err(located(RuntimeErrorKind::NotABlock {
                selector: format::inspect(heap, block),
            })),
        }
    }

    fn run_body(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        code: &BlockCode,
        bound: &[Option<Value>],
        space: Value,
    ) -> Result<Value, RuntimeError> {
        for (param, value) in code.params.iter().zip(bound) {
            if let (None, Some(default)) = (value, &param.default) {
                let value = self.eval(heap, platform, default, space)?;
                heap.set_slot(space, param.name.clone(), value);
            }
        }
        self.eval_sequence(heap, platform, &code.body, space)
    }
}

/// A fresh space for one block activation, laid out like the engine's.
fn activate(
    heap: &mut Heap,
    code: &BlockCode,
    scope: Value,
    receiver: Option<Value>,
    bound: &[Option<Value>],
) -> Value {
    let space = heap.allocate_space(receiver.unwrap_or(scope), scope);
    if let Some(receiver) = receiver {
        heap.set_slot(space, "self", receiver);
    }
    for (param, value) in code.params.iter().zip(bound) {
        if let Some(value) = value {
            heap.set_slot(space, param.name.clone(), *value);
        }
    }
    space
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        HeapCreateInfo, Source, materialize,
        platform::{HostPlatform, Libraries, Output},
    };

    struct Fixture {
        heap: Heap,
        evaluator: Evaluator,
        platform: HostPlatform,
        output: Arc<parking_lot::Mutex<String>>,
    }

    impl Fixture {
        fn new(max_depth: usize) -> Self {
            let heap = Heap::new(HeapCreateInfo::default());
            let evaluator = Evaluator::new(heap.specials.world, max_depth);
            let (output, buffer) = Output::buffer();
            let platform = HostPlatform::new()
                .with_libraries(Libraries::empty())
                .with_output(output);
            Self {
                heap,
                evaluator,
                platform,
                output: buffer,
            }
        }

        fn run(&mut self, text: &str) -> Result<Value, RuntimeError> {
            let exprs = parser::parse_source(text, None).unwrap();
            let nodes = materialize(&mut self.heap, Source::new(text, None), &exprs);
            self.evaluator.evaluate(&mut self.heap, &self.platform, &nodes)
        }

        fn number(&mut self, text: &str) -> f64 {
            let value = self.run(text).unwrap();
            self.heap.number_value(value).unwrap()
        }
    }

    #[test]
    fn top_level_definitions_land_in_the_world() {
        let mut fx = Fixture::new(1000);
        assert_eq!(fx.number("x = 2; x * 21"), 42.0);
        let world = fx.heap.specials.world;
        let x = fx.heap.dispatch(world, "x");
        assert_eq!(fx.heap.number_value(x), Some(2.0));
    }

    #[test]
    fn block_locals_stay_in_their_space() {
        let mut fx = Fixture::new(1000);
        assert_eq!(fx.number("f = {|a| t = a + 1; t * 2}; f(3)"), 8.0);
        assert_eq!(fx.run("t"), Ok(fx.heap.null()));
    }

    #[test]
    fn closures_and_receivers() {
        let mut fx = Fixture::new(1000);
        let text = "
            acc = Object.clone()
            acc.total = 10
            acc.adder = {|n| {|| self.total + n}}
            add5 = acc.adder(5)
            add5()
        ";
        assert_eq!(fx.number(text), 15.0);
    }

    #[test]
    fn closures_capture_a_heap_space() {
        let mut fx = Fixture::new(1000);
        let block = fx.run("mk = {|n| {|| n}}; mk(5)").unwrap();
        let Some(Code::Interpreted { scope, .. }) = fx.heap.get(block).code.clone() else {
            panic!("expected an interpreted block");
        };
        assert!(fx.heap.get(scope).is_space());
        let n = fx.heap.dispatch(scope, "n");
        assert_eq!(fx.heap.number_value(n), Some(5.0));
    }

    #[test]
    fn defaults_see_earlier_parameters() {
        let mut fx = Fixture::new(1000);
        assert_eq!(fx.number("f = {|a, b = a + 1| a * b}; f(3)"), 12.0);
        assert_eq!(fx.number("f(b: 2, 5)"), 10.0);
    }

    #[test]
    fn built_ins_and_output() {
        let mut fx = Fixture::new(1000);
        fx.run("IO.puts(\"sum: \" + (1 + 2))").unwrap();
        assert_eq!(&*fx.output.lock(), "sum: 3\n");
    }

    #[test]
    fn runtime_errors_carry_locations() {
        let mut fx = Fixture::new(1000);
        let err = fx.run("1\n2.nope").unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::MessageNotUnderstood { .. }));
        assert_eq!(err.location.map(|l| l.span.start.line), Some(2));
        let err = fx.run("missing(1)").unwrap_err();
        assert!(matches!(err.kind, RuntimeErrorKind::MessageNotUnderstood { .. }));
    }

    #[test]
    fn recursion_is_bounded() {
        let mut fx = Fixture::new(64);
        let err = fx.run("f = {|n| f(n + 1)}; f(0)").unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::StackOverflow { limit: 64 });
        assert_eq!(fx.number("1 + 1"), 2.0);
    }

    #[test]
    fn call_block_directly() {
        let mut fx = Fixture::new(1000);
        let block = fx.run("{|a, b| a - b}").unwrap();
        let seven = fx.heap.number(7.0);
        let two = fx.heap.number(2.0);
        let result = fx
            .evaluator
            .call_block(
                &mut fx.heap,
                &fx.platform,
                block,
                None,
                vec![
                    ArgumentValue::named("b", two),
                    ArgumentValue::positional(seven),
                ],
            )
            .unwrap();
        assert_eq!(fx.heap.number_value(result), Some(5.0));
    }
}
