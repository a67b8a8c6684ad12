//! Host services the runtime depends on: library discovery, the
//! next-turn scheduling primitive, a monotonic clock and an output sink.

use std::{
    fs, io,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::scheduler::LoopShared;

pub trait Platform: Send + Sync {
    /// Enumerate core library sources as `(path, text)`, in load order.
    fn find_core_libs(&self, visitor: &mut dyn FnMut(&str, &str));
    /// Enumerate standard library sources, loaded after the core.
    fn find_std_libs(&self, visitor: &mut dyn FnMut(&str, &str));
    /// Arrange for the engine to run one tick on the host's next turn.
    fn defer_to_next_turn(&self);
    /// Monotonic time since some fixed origin.
    fn now(&self) -> Duration;
    fn write_output(&self, text: &str);
}

// ── Clocks ──────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Deterministic clock for tests: every reading advances it by `step`.
#[derive(Debug)]
pub struct ManualClock {
    nanos: AtomicU64,
    step: Duration,
}

impl ManualClock {
    pub fn new(step: Duration) -> Self {
        Self {
            nanos: AtomicU64::new(0),
            step,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let step = self.step.as_nanos() as u64;
        Duration::from_nanos(self.nanos.fetch_add(step, Ordering::Relaxed))
    }
}

// ── Libraries ───────────────────────────────────────────────────────

const CORE_LIBS: &[(&str, &str)] = &[
    ("core/boolean.tsl", include_str!("../lib/core/boolean.tsl")),
    ("core/block.tsl", include_str!("../lib/core/block.tsl")),
    ("core/number.tsl", include_str!("../lib/core/number.tsl")),
];

const STD_LIBS: &[(&str, &str)] = &[
    ("std/math.tsl", include_str!("../lib/std/math.tsl")),
    ("std/object.tsl", include_str!("../lib/std/object.tsl")),
];

/// Core and standard library sources, in load order.
#[derive(Debug, Clone, Default)]
pub struct Libraries {
    pub core: Vec<(String, String)>,
    pub std: Vec<(String, String)>,
}

fn owned(libs: &[(&str, &str)]) -> Vec<(String, String)> {
    libs.iter()
        .map(|(path, text)| (path.to_string(), text.to_string()))
        .collect()
}

fn read_dir_sorted(dir: &Path) -> io::Result<Vec<(String, String)>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tsl") {
            paths.push(path);
        }
    }
    paths.sort();
    paths
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path)?;
            Ok((path.display().to_string(), text))
        })
        .collect()
}

impl Libraries {
    /// The libraries compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            core: owned(CORE_LIBS),
            std: owned(STD_LIBS),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Read `<dir>/core/*.tsl` and `<dir>/std/*.tsl`, sorted by path.
    /// A missing subdirectory contributes nothing.
    pub fn from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let load = |sub: &str| {
            let path = dir.join(sub);
            if path.is_dir() {
                read_dir_sorted(&path)
            } else {
                Ok(Vec::new())
            }
        };
        Ok(Self {
            core: load("core")?,
            std: load("std")?,
        })
    }
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    /// Collect output in memory.
    Buffer(Arc<Mutex<String>>),
}

impl Output {
    pub fn buffer() -> (Self, Arc<Mutex<String>>) {
        let buffer = Arc::new(Mutex::new(String::new()));
        (Self::Buffer(buffer.clone()), buffer)
    }
}

// ── Host platform ───────────────────────────────────────────────────

/// The stock [`Platform`].
///
/// Standalone, `defer_to_next_turn` only records the request and the
/// embedder drives ticks itself (see [`crate::VM::run_to_completion`]).
/// Attached to an [`crate::EventLoop`], every request queues an engine turn.
pub struct HostPlatform {
    libraries: Libraries,
    clock: Arc<dyn Clock>,
    output: Output,
    event_loop: Option<Arc<LoopShared>>,
    deferrals: AtomicU64,
}

impl HostPlatform {
    pub fn new() -> Self {
        Self {
            libraries: Libraries::embedded(),
            clock: Arc::new(SystemClock::new()),
            output: Output::Stdout,
            event_loop: None,
            deferrals: AtomicU64::new(0),
        }
    }

    pub fn with_libraries(mut self, libraries: Libraries) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub(crate) fn with_event_loop(mut self, shared: Arc<LoopShared>) -> Self {
        self.event_loop = Some(shared);
        self
    }

    /// How many times the engine asked for another turn.
    pub fn deferrals(&self) -> u64 {
        self.deferrals.load(Ordering::Relaxed)
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HostPlatform {
    fn find_core_libs(&self, visitor: &mut dyn FnMut(&str, &str)) {
        for (path, text) in &self.libraries.core {
            visitor(path, text);
        }
    }

    fn find_std_libs(&self, visitor: &mut dyn FnMut(&str, &str)) {
        for (path, text) in &self.libraries.std {
            visitor(path, text);
        }
    }

    fn defer_to_next_turn(&self) {
        self.deferrals.fetch_add(1, Ordering::Relaxed);
        if let Some(shared) = &self.event_loop {
            shared.request_engine_turn();
        }
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn write_output(&self, text: &str) {
        match &self.output {
            Output::Stdout => {
                use std::io::Write;
                let mut stdout = io::stdout().lock();
                if let Err(err) = stdout.write_all(text.as_bytes()) {
                    log::warn!("failed to write output: {err}");
                }
            }
            Output::Buffer(buffer) => buffer.lock().push_str(text),
        }
    }
}
