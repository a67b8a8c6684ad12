use std::{sync::Arc, thread, time::Duration};

use log::debug;

use crate::{
    ArgumentValue, ConversionError, Engine, EvalError, Evaluator, ExecutionStateInfo,
    Heap, HeapCreateInfo, NativeValue, NodeRef, PendingResult, Platform, RuntimeError,
    RuntimeErrorKind, Source, Value, format, materialize,
};

/// Native stack reserved per level of `max_recursion_depth`.
const STACK_PER_LEVEL: usize = 16 * 1024;
const MIN_INTERPRETER_STACK: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Time-sliced, never blocks the caller.
    #[default]
    Cooperative,
    /// Recursive reference interpreter, runs to completion.
    Synchronous,
}

#[derive(Debug, Clone)]
pub struct VMCreateInfo {
    pub engine: EngineKind,
    pub heap: HeapCreateInfo,
    pub execution: ExecutionStateInfo,
    /// Upper bound on one tick of the cooperative engine.
    pub time_slice: Duration,
    /// Nesting limit of the reference interpreter. Its thread gets a
    /// native stack sized to this limit.
    pub max_recursion_depth: usize,
    pub load_libraries: bool,
}

impl Default for VMCreateInfo {
    fn default() -> Self {
        Self {
            engine: EngineKind::Cooperative,
            heap: HeapCreateInfo::default(),
            execution: ExecutionStateInfo::default(),
            time_slice: Duration::from_millis(10),
            max_recursion_depth: 10_000,
            load_libraries: true,
        }
    }
}

/// What an evaluation hands back: a value right away, or a handle that
/// resolves as the host keeps running ticks.
#[derive(Debug)]
pub enum Evaluation {
    Ready(Value),
    Pending(PendingResult),
}

pub struct VM {
    pub heap: Heap,
    engine: Engine,
    evaluator: Evaluator,
    platform: Arc<dyn Platform>,
    kind: EngineKind,
}

impl VM {
    /// Build the object graph and load the core then standard libraries.
    pub fn new(info: VMCreateInfo, platform: Arc<dyn Platform>) -> Result<Self, EvalError> {
        let heap = Heap::new(info.heap.clone());
        let world = heap.specials.world;
        let mut vm = Self {
            engine: Engine::new(&info.execution, info.time_slice, world),
            evaluator: Evaluator::new(world, info.max_recursion_depth),
            heap,
            platform,
            kind: info.engine,
        };
        if info.load_libraries {
            vm.load_libraries()?;
        }
        debug!("vm ready with {} objects", vm.heap.len());
        Ok(vm)
    }

    fn load_libraries(&mut self) -> Result<(), EvalError> {
        let mut libraries = Vec::new();
        self.platform
            .find_core_libs(&mut |path, text| libraries.push((path.to_string(), text.to_string())));
        self.platform
            .find_std_libs(&mut |path, text| libraries.push((path.to_string(), text.to_string())));

        for (path, text) in libraries {
            debug!("loading library {path}");
            let nodes = self.compile(&text, Some(&path))?;
            let pending = self.engine.evaluate(&self.heap, &*self.platform, &nodes);
            self.run_to_completion();
            outcome(&pending)?;
        }
        Ok(())
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.kind
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn world(&self) -> Value {
        self.heap.specials.world
    }

    fn compile(&mut self, text: &str, label: Option<&str>) -> Result<Vec<NodeRef>, EvalError> {
        let source = Source::new(text, label);
        let exprs = parser::parse_source(text, label).map_err(|error| EvalError::Parse {
            error,
            source: source.clone(),
        })?;
        Ok(materialize(&mut self.heap, source, &exprs))
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Parse and run `text` with the configured engine.
    pub fn evaluate(&mut self, text: &str, label: Option<&str>) -> Result<Evaluation, EvalError> {
        let nodes = self.compile(text, label)?;
        match self.kind {
            EngineKind::Synchronous => {
                let value = self.run_synchronously(|evaluator, heap, platform| {
                    evaluator.evaluate(heap, platform, &nodes)
                })?;
                Ok(Evaluation::Ready(value))
            }
            EngineKind::Cooperative => {
                let pending = self.engine.evaluate(&self.heap, &*self.platform, &nodes);
                Ok(Evaluation::Pending(pending))
            }
        }
    }

    /// Parse and run `text` on the reference interpreter, whatever the
    /// configured engine.
    pub fn eval_sync(&mut self, text: &str, label: Option<&str>) -> Result<Value, EvalError> {
        let nodes = self.compile(text, label)?;
        self.run_synchronously(|evaluator, heap, platform| {
            evaluator.evaluate(heap, platform, &nodes)
        })
    }

    /// Evaluate and drive the engine until the result is available.
    pub fn eval(&mut self, text: &str, label: Option<&str>) -> Result<Value, EvalError> {
        let evaluation = self.evaluate(text, label)?;
        self.settle(evaluation)
    }

    /// Invoke `block` with `receiver` bound as `self`.
    pub fn eval_block_with_args(
        &mut self,
        receiver: Value,
        block: Value,
        arguments: Vec<ArgumentValue>,
    ) -> Result<Evaluation, EvalError> {
        match self.kind {
            EngineKind::Synchronous => {
                let value = self.run_synchronously(move |evaluator, heap, platform| {
                    evaluator.call_block(heap, platform, block, Some(receiver), arguments)
                })?;
                Ok(Evaluation::Ready(value))
            }
            EngineKind::Cooperative => {
                let pending = self.engine.call_block(
                    &mut self.heap,
                    &*self.platform,
                    block,
                    Some(receiver),
                    arguments,
                );
                Ok(Evaluation::Pending(pending))
            }
        }
    }

    /// Run the reference interpreter on a scoped thread whose stack fits
    /// its recursion limit, so deep programs fail with `StackOverflow`
    /// instead of exhausting the caller's stack.
    fn run_synchronously<T, F>(&mut self, run: F) -> Result<T, EvalError>
    where
        T: Send,
        F: FnOnce(&mut Evaluator, &mut Heap, &dyn Platform) -> Result<T, RuntimeError> + Send,
    {
        let stack_size = self
            .evaluator
            .max_depth()
            .saturating_mul(STACK_PER_LEVEL)
            .max(MIN_INTERPRETER_STACK);
        let evaluator = &mut self.evaluator;
        let heap = &mut self.heap;
        let platform: &dyn Platform = &*self.platform;

        thread::scope(|scope| {
            let runner = thread::Builder::new()
                .name("tessel-interpreter".to_string())
                .stack_size(stack_size)
                .spawn_scoped(scope, move || run(evaluator, heap, platform))
                .map_err(|err| EvalError::Spawn(Arc::new(err)))?;
            match runner.join() {
                Ok(result) => Ok(result?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        })
    }

    /// Block until an [`Evaluation`] has a value, running ticks as needed.
    pub fn settle(&mut self, evaluation: Evaluation) -> Result<Value, EvalError> {
        match evaluation {
            Evaluation::Ready(value) => Ok(value),
            Evaluation::Pending(pending) => {
                while !pending.is_resolved() && self.run_tick() {}
                outcome(&pending)
            }
        }
    }

    // ── Ticks ───────────────────────────────────────────────────────

    /// One bounded burst of cooperative work. Returns whether work remains.
    pub fn run_tick(&mut self) -> bool {
        self.engine.run_tick(&mut self.heap, &*self.platform)
    }

    pub fn is_idle(&self) -> bool {
        self.engine.is_idle()
    }

    /// Run ticks until the engine is idle; returns the number of ticks.
    pub fn run_to_completion(&mut self) -> usize {
        let mut ticks = 0;
        while !self.engine.is_idle() {
            self.run_tick();
            ticks += 1;
        }
        ticks
    }

    // ── Values ──────────────────────────────────────────────────────

    pub fn display(&self, value: Value) -> String {
        format::display(&self.heap, value)
    }

    pub fn inspect(&self, value: Value) -> String {
        format::inspect(&self.heap, value)
    }

    pub fn bridge(&mut self, native: NativeValue) -> Result<Value, ConversionError> {
        self.heap.bridge(native)
    }

    pub fn to_native(&self, value: Value) -> NativeValue {
        self.heap.to_native(value)
    }
}

fn outcome(pending: &PendingResult) -> Result<Value, EvalError> {
    match pending.try_get() {
        Some(result) => Ok(result?),
        None => Err(RuntimeError::new(RuntimeErrorKind::Cancelled).into()),
    }
}
