//! The cooperative engine.
//!
//! Evaluation runs entirely on two explicit stacks: a code stack of pending
//! [`Step`]s and a data stack of results. A message send never recurses on
//! the native stack; it is decomposed into steps for its receiver, its
//! arguments and the final dispatch. Work proceeds in ticks bounded by a
//! time slice, and a tick only ends between whole steps, so the object graph
//! is consistent whenever the host gets control back.

use std::{sync::Arc, time::Duration};

use log::{debug, trace, warn};

use crate::{
    ArgumentValue, BlockCode, Code, ExecutionState, ExecutionStateInfo, Heap,
    Location, NodeKind, NodeRef, PendingResult, Platform, PrimitiveContext,
    RuntimeError, RuntimeErrorKind, SendCode, Step, Value,
    activation::{bind_arguments, check_primitive_arity},
    completion::{self, Completer},
    format,
};

/// Bookkeeping for one `evaluate` or `call_block` in flight.
#[derive(Debug)]
struct ActiveEvaluation {
    id: u64,
    completer: Completer,
    /// stack depths below this evaluation's ReturnValue marker
    code_depth: usize,
    data_depth: usize,
    /// space to restore once the evaluation ends
    space: Value,
}

fn located(kind: RuntimeErrorKind, location: Option<&Location>) -> RuntimeError {
    match location {
        Some(location) => RuntimeError::at(kind, location.clone()),
        None => RuntimeError::new(kind),
    }
}

#[derive(Debug)]
pub struct Engine {
    state: ExecutionState,
    current_space: Value,
    world: Value,
    evaluations: Vec<ActiveEvaluation>,
    next_evaluation: u64,
    tick_scheduled: bool,
    time_slice: Duration,
}

impl Engine {
    pub fn new(info: &ExecutionStateInfo, time_slice: Duration, world: Value) -> Self {
        Self {
            state: ExecutionState::new(info),
            current_space: world,
            world,
            evaluations: Vec::new(),
            next_evaluation: 0,
            tick_scheduled: false,
            time_slice,
        }
    }

    pub fn current_space(&self) -> Value {
        self.current_space
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn is_tick_scheduled(&self) -> bool {
        self.tick_scheduled
    }

    /// Evaluations started but not yet resolved.
    pub fn pending_evaluations(&self) -> usize {
        self.evaluations.len()
    }

    // ── Entry points ────────────────────────────────────────────────

    /// Queue `nodes` for evaluation in the world and return immediately.
    ///
    /// The result resolves with the value of the last node (null for an
    /// empty list) once enough ticks have run.
    pub fn evaluate(
        &mut self,
        heap: &Heap,
        platform: &dyn Platform,
        nodes: &[NodeRef],
    ) -> PendingResult {
        let (pending, completer) = completion::channel();
        if !self.begin(completer) {
            return pending;
        }
        self.current_space = self.world;

        let pushed = if nodes.is_empty() {
            self.state.push_code(Step::Push(heap.null()))
        } else {
            self.push_sequence(nodes)
        };
        if let Err(kind) = pushed {
            self.fail(RuntimeError::new(kind));
        }
        self.schedule(platform);
        pending
    }

    /// Invoke `block` outside of any source text.
    ///
    /// An explicit `receiver` is bound as `self`; without one the block
    /// runs in its captured scope only.
    pub fn call_block(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        block: Value,
        receiver: Option<Value>,
        arguments: Vec<ArgumentValue>,
    ) -> PendingResult {
        let (pending, completer) = completion::channel();
        if !self.begin(completer) {
            return pending;
        }

        let started = if heap.is_block(block) {
            self.invoke(heap, platform, block, receiver, arguments, None)
        } else {
            Err(RuntimeError::new(RuntimeErrorKind::NotABlock {
                selector: format::inspect(heap, block),
            }))
        };
        if let Err(err) = started {
            self.fail(err);
        }
        self.schedule(platform);
        pending
    }

    /// Register an evaluation and push its ReturnValue marker.
    fn begin(&mut self, completer: Completer) -> bool {
        let id = self.next_evaluation;
        self.next_evaluation += 1;
        let record = ActiveEvaluation {
            id,
            completer,
            code_depth: self.state.code_depth(),
            data_depth: self.state.data_depth(),
            space: self.current_space,
        };
        debug!("evaluation {id} started");
        self.evaluations.push(record);
        match self.state.push_code(Step::ReturnValue) {
            Ok(()) => true,
            Err(kind) => {
                self.fail(RuntimeError::new(kind));
                false
            }
        }
    }

    // ── Scheduling ──────────────────────────────────────────────────

    fn schedule(&mut self, platform: &dyn Platform) {
        if self.tick_scheduled || self.state.is_idle() {
            return;
        }
        self.tick_scheduled = true;
        trace!("deferring tick to the next turn");
        platform.defer_to_next_turn();
    }

    /// Process steps until the time slice is used up or no work is left.
    /// At least one step runs per tick. Returns whether work remains.
    pub fn run_tick(&mut self, heap: &mut Heap, platform: &dyn Platform) -> bool {
        self.tick_scheduled = false;
        let start = platform.now();
        let mut steps = 0usize;

        while !self.state.is_idle() {
            if steps > 0 && platform.now().saturating_sub(start) >= self.time_slice {
                break;
            }
            if self.unwind_cancelled() {
                steps += 1;
                continue;
            }
            let Some(step) = self.state.pop_code() else {
                break;
            };
            if let Err(err) = self.step(heap, platform, step) {
                self.fail(err);
            }
            steps += 1;
        }

        trace!(
            "tick: {steps} steps in {:?}, {} pending steps",
            platform.now().saturating_sub(start),
            self.state.code_depth()
        );
        self.schedule(platform);
        !self.state.is_idle()
    }

    // ── Completion ──────────────────────────────────────────────────

    fn fail(&mut self, err: RuntimeError) {
        let Some(record) = self.evaluations.pop() else {
            warn!("runtime error outside of any evaluation: {err}");
            self.state.truncate(0, 0);
            self.current_space = self.world;
            return;
        };
        self.state.truncate(record.code_depth, record.data_depth);
        self.current_space = record.space;
        warn!("evaluation {} failed: {err}", record.id);
        record.completer.resolve(Err(err));
    }

    /// Drop every evaluation from the lowest cancelled one upwards.
    fn unwind_cancelled(&mut self) -> bool {
        let Some(index) = self
            .evaluations
            .iter()
            .position(|record| record.completer.is_cancelled())
        else {
            return false;
        };
        while self.evaluations.len() > index {
            let Some(record) = self.evaluations.pop() else {
                break;
            };
            self.state.truncate(record.code_depth, record.data_depth);
            self.current_space = record.space;
            warn!("evaluation {} cancelled", record.id);
            record
                .completer
                .resolve(Err(RuntimeError::new(RuntimeErrorKind::Cancelled)));
        }
        true
    }

    fn finish(&mut self, heap: &Heap) {
        let value = self.state.pop().unwrap_or(heap.null());
        let Some(record) = self.evaluations.pop() else {
            return;
        };
        self.state.truncate(self.state.code_depth(), record.data_depth);
        self.current_space = record.space;
        debug!("evaluation {} resolved", record.id);
        record.completer.resolve(Ok(value));
    }

    // ── Steps ───────────────────────────────────────────────────────

    fn push_code(&mut self, step: Step, location: &Location) -> Result<(), RuntimeError> {
        self.state
            .push_code(step)
            .map_err(|kind| RuntimeError::at(kind, location.clone()))
    }

    fn push(&mut self, value: Value, location: Option<&Location>) -> Result<(), RuntimeError> {
        self.state.push(value).map_err(|kind| located(kind, location))
    }

    fn pop(&mut self, heap: &Heap) -> Value {
        let value = self.state.pop();
        debug_assert!(value.is_some(), "data stack underflow");
        value.unwrap_or(heap.null())
    }

    /// Push `nodes` so they run in order, dropping every result but the last.
    fn push_sequence(&mut self, nodes: &[NodeRef]) -> Result<(), RuntimeErrorKind> {
        for (i, node) in nodes.iter().enumerate().rev() {
            self.state.push_code(Step::Eval(node.clone()))?;
            if i > 0 {
                self.state.push_code(Step::Discard)?;
            }
        }
        Ok(())
    }

    fn step(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        step: Step,
    ) -> Result<(), RuntimeError> {
        match step {
            Step::Eval(node) => self.eval_node(heap, &node),
            Step::Send(send, location) => self.send(heap, platform, &send, &location),
            Step::Assign(assign, location) => {
                let value = self.pop(heap);
                let target = match assign.receiver {
                    Some(_) => self.pop(heap),
                    None => self.current_space,
                };
                heap.add_slot(target, assign.name.clone(), value, assign.comment.as_deref());
                self.push(value, Some(&location))
            }
            Step::Bind(name) => {
                let value = self.pop(heap);
                heap.set_slot(self.current_space, name, value);
                Ok(())
            }
            Step::Discard => {
                self.pop(heap);
                Ok(())
            }
            Step::Push(value) => self.push(value, None),
            Step::RestoreSpace(space) => {
                self.current_space = space;
                Ok(())
            }
            Step::ReturnValue => {
                self.finish(heap);
                Ok(())
            }
        }
    }

    fn eval_node(&mut self, heap: &mut Heap, node: &NodeRef) -> Result<(), RuntimeError> {
        match &node.kind {
            NodeKind::Constant(value) => self.push(*value, Some(&node.location())),
            NodeKind::Identifier(name) => {
                let value = heap.dispatch(self.current_space, name);
                self.push(value, Some(&node.location()))
            }
            NodeKind::Block(code) => {
                let block = heap.allocate_block(code.clone(), self.current_space);
                self.push(block, Some(&node.location()))
            }
            NodeKind::Assignment(assign) => {
                let location = node.location();
                self.push_code(Step::Assign(assign.clone(), location.clone()), &location)?;
                self.push_code(Step::Eval(assign.value.clone()), &location)?;
                if let Some(receiver) = &assign.receiver {
                    self.push_code(Step::Eval(receiver.clone()), &location)?;
                }
                Ok(())
            }
            NodeKind::Send(send) => {
                let location = node.location();
                self.push_code(Step::Send(send.clone(), location.clone()), &location)?;
                for argument in send.arguments.iter().rev() {
                    self.push_code(Step::Eval(argument.value.clone()), &location)?;
                }
                if let Some(receiver) = &send.receiver {
                    self.push_code(Step::Eval(receiver.clone()), &location)?;
                }
                Ok(())
            }
        }
    }

    fn send(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        send: &Arc<SendCode>,
        location: &Location,
    ) -> Result<(), RuntimeError> {
        let values = self.state.pop_n(send.arguments.len());
        let arguments: Vec<ArgumentValue> = send
            .arguments
            .iter()
            .zip(values)
            .map(|(code, value)| ArgumentValue {
                name: code.name.clone(),
                value,
            })
            .collect();
        let receiver = match send.receiver {
            Some(_) => Some(self.pop(heap)),
            None => None,
        };
        let target = receiver.unwrap_or(self.current_space);

        if receiver.is_some() && heap.is_block(target) && &*send.selector == "call" {
            return self.invoke(heap, platform, target, None, arguments, Some(location));
        }

        let Some(value) = heap.lookup(target, &send.selector).value() else {
            return Err(RuntimeError::at(
                RuntimeErrorKind::MessageNotUnderstood {
                    selector: send.selector.to_string(),
                    receiver: format::inspect(heap, target),
                },
                location.clone(),
            ));
        };
        if heap.is_block(value) {
            self.invoke(heap, platform, value, receiver, arguments, Some(location))
        } else if arguments.is_empty() {
            self.push(value, Some(location))
        } else {
            Err(RuntimeError::at(
                RuntimeErrorKind::NotABlock {
                    selector: send.selector.to_string(),
                },
                location.clone(),
            ))
        }
    }

    fn invoke(
        &mut self,
        heap: &mut Heap,
        platform: &dyn Platform,
        block: Value,
        receiver: Option<Value>,
        arguments: Vec<ArgumentValue>,
        location: Option<&Location>,
    ) -> Result<(), RuntimeError> {
        match heap.get(block).code.clone() {
            Some(Code::Primitive(message)) => {
                check_primitive_arity(message.inputs, &arguments)
                    .map_err(|kind| located(kind, location))?;
                let values: Vec<Value> = arguments.iter().map(|a| a.value).collect();
                let mut ctx = PrimitiveContext {
                    heap,
                    platform,
                    receiver: receiver.unwrap_or(self.current_space),
                    arguments: &values,
                };
                let result = (message.ptr)(&mut ctx).map_err(|kind| located(kind, location))?;
                self.push(result, location)
            }
            Some(Code::Interpreted { block: code, scope }) => {
                self.activate(heap, &code, scope, receiver, &arguments)
                    .map_err(|kind| located(kind, location))
            }
            None => Err(located(
                RuntimeErrorKind::NotABlock {
                    selector: format::inspect(heap, block),
                },
                location,
            )),
        }
    }

    /// Enter an interpreted block: new space, bound parameters, body queued.
    fn activate(
        &mut self,
        heap: &mut Heap,
        code: &BlockCode,
        scope: Value,
        receiver: Option<Value>,
        arguments: &[ArgumentValue],
    ) -> Result<(), RuntimeErrorKind> {
        let bound = bind_arguments(&code.params, arguments)?;

        let saved = self.current_space;
        let space = heap.allocate_space(receiver.unwrap_or(scope), scope);
        if let Some(receiver) = receiver {
            heap.set_slot(space, "self", receiver);
        }
        for (param, value) in code.params.iter().zip(&bound) {
            if let Some(value) = value {
                heap.set_slot(space, param.name.clone(), *value);
            }
        }
        self.current_space = space;

        // a pending restore means the caller ends right after us
        if !matches!(self.state.peek_code(), Some(Step::RestoreSpace(_))) {
            self.state.push_code(Step::RestoreSpace(saved))?;
        }
        if code.body.is_empty() {
            self.state.push_code(Step::Push(heap.null()))?;
        } else {
            self.push_sequence(&code.body)?;
        }
        for (param, value) in code.params.iter().zip(&bound).rev() {
            if let (None, Some(default)) = (value, &param.default) {
                self.state.push_code(Step::Bind(param.name.clone()))?;
                self.state.push_code(Step::Eval(default.clone()))?;
            }
        }
        Ok(())
    }
}
