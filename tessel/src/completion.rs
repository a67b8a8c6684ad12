use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::{Condvar, Mutex};

use crate::{RuntimeError, RuntimeErrorKind, Value};

pub type Outcome = Result<Value, RuntimeError>;

#[derive(Debug, Default)]
struct Shared {
    outcome: Mutex<Option<Outcome>>,
    resolved: Condvar,
    cancelled: AtomicBool,
}

/// Handle to the result of one cooperative evaluation.
///
/// Resolved exactly once by the engine. Cloning shares the same channel, so
/// a result can be awaited from another thread while the VM thread keeps
/// running ticks.
#[derive(Debug, Clone)]
pub struct PendingResult {
    shared: Arc<Shared>,
}

/// Write side of a [`PendingResult`], held by the engine.
#[derive(Debug)]
pub(crate) struct Completer {
    shared: Arc<Shared>,
    done: bool,
}

pub(crate) fn channel() -> (PendingResult, Completer) {
    let shared = Arc::new(Shared::default());
    (
        PendingResult {
            shared: shared.clone(),
        },
        Completer {
            shared,
            done: false,
        },
    )
}

impl PendingResult {
    pub fn is_resolved(&self) -> bool {
        self.shared.outcome.lock().is_some()
    }

    pub fn try_get(&self) -> Option<Outcome> {
        self.shared.outcome.lock().clone()
    }

    /// Block until resolved.
    pub fn wait(&self) -> Outcome {
        let mut outcome = self.shared.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.shared.resolved.wait(&mut outcome);
        }
    }

    /// Block until resolved or until `timeout` passes.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let mut outcome = self.shared.outcome.lock();
        if outcome.is_none() {
            self.shared.resolved.wait_for(&mut outcome, timeout);
        }
        outcome.clone()
    }

    /// Ask the engine to abandon this evaluation at its next step boundary.
    /// The channel then resolves with [`RuntimeErrorKind::Cancelled`].
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }
}

impl Completer {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn resolve(mut self, outcome: Outcome) {
        self.fulfil(outcome);
    }

    fn fulfil(&mut self, outcome: Outcome) {
        if self.done {
            return;
        }
        self.done = true;
        *self.shared.outcome.lock() = Some(outcome);
        self.shared.resolved.notify_all();
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        // engine torn down mid-evaluation
        self.fulfil(Err(RuntimeError::new(RuntimeErrorKind::Cancelled)));
    }
}
