use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::{Condvar, Mutex};

use crate::{HostPlatform, VM};

type HostTask = Box<dyn FnOnce(&mut VM) + Send>;

enum Turn {
    /// Run one engine tick.
    Engine,
    /// Host work queued with [`EventLoop::post`].
    Host(HostTask),
}

pub(crate) struct LoopShared {
    queue: Mutex<VecDeque<Turn>>,
    has_work: Condvar,
}

impl LoopShared {
    fn push(&self, turn: Turn) {
        {
            let mut queue = self.queue.lock();
            queue.push_back(turn);
        }
        self.has_work.notify_one();
    }

    pub(crate) fn request_engine_turn(&self) {
        self.push(Turn::Engine);
    }
}

/// A single-threaded host loop: a FIFO of turns, each either one engine
/// tick or a posted host task. Engine ticks are interleaved with host work
/// in arrival order, so no script holds the loop for longer than a slice.
#[derive(Clone)]
pub struct EventLoop {
    shared: Arc<LoopShared>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(LoopShared {
                queue: Mutex::new(VecDeque::new()),
                has_work: Condvar::new(),
            }),
        }
    }

    /// Route the platform's next-turn requests into this loop.
    pub fn attach(&self, platform: HostPlatform) -> HostPlatform {
        platform.with_event_loop(self.shared.clone())
    }

    pub fn post(&self, task: impl FnOnce(&mut VM) + Send + 'static) {
        self.shared.push(Turn::Host(Box::new(task)));
    }

    pub fn pending_turns(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Run the oldest turn. Returns false if there was none.
    pub fn run_once(&self, vm: &mut VM) -> bool {
        // released before running, the turn may queue more turns
        let turn = self.shared.queue.lock().pop_front();
        match turn {
            Some(Turn::Engine) => {
                vm.run_tick();
                true
            }
            Some(Turn::Host(task)) => {
                task(vm);
                true
            }
            None => false,
        }
    }

    /// Run turns until the queue is empty; returns how many ran.
    pub fn run_until_idle(&self, vm: &mut VM) -> usize {
        let mut turns = 0;
        while self.run_once(vm) {
            turns += 1;
        }
        turns
    }

    /// Block until a turn is queued or `timeout` passes.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let mut queue = self.shared.queue.lock();
        if queue.is_empty() {
            self.shared.has_work.wait_for(&mut queue, timeout);
        }
        !queue.is_empty()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Evaluation, ManualClock, VMCreateInfo};

    fn attached_vm(event_loop: &EventLoop) -> VM {
        let platform = event_loop
            .attach(HostPlatform::new())
            .with_clock(Arc::new(ManualClock::new(Duration::from_millis(1))));
        let mut vm = VM::new(VMCreateInfo::default(), Arc::new(platform)).unwrap();
        // turns queued while the libraries loaded
        event_loop.run_until_idle(&mut vm);
        vm
    }

    #[test]
    fn evaluation_is_driven_by_engine_turns() {
        let event_loop = EventLoop::new();
        let mut vm = attached_vm(&event_loop);
        let Evaluation::Pending(pending) = vm.evaluate("20 + 22", None).unwrap() else {
            panic!("expected a pending result");
        };
        assert_eq!(event_loop.pending_turns(), 1);
        assert!(!pending.is_resolved());
        event_loop.run_until_idle(&mut vm);
        let value = pending.try_get().unwrap().unwrap();
        assert_eq!(vm.inspect(value), "42");
    }

    #[test]
    fn host_tasks_interleave_with_ticks() {
        let event_loop = EventLoop::new();
        let mut vm = attached_vm(&event_loop);
        let text = (0..100).map(|i| format!("x = {i}")).collect::<Vec<_>>().join("; ");
        let Evaluation::Pending(pending) = vm.evaluate(&text, None).unwrap() else {
            panic!("expected a pending result");
        };

        let seen_unresolved = Arc::new(AtomicUsize::new(0));
        let counter = seen_unresolved.clone();
        let watched = pending.clone();
        event_loop.post(move |_| {
            if !watched.is_resolved() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let turns = event_loop.run_until_idle(&mut vm);
        assert!(turns > 2);
        assert_eq!(seen_unresolved.load(Ordering::SeqCst), 1);
        assert!(pending.is_resolved());
    }

    #[test]
    fn wait_for_work_times_out_on_an_empty_queue() {
        let event_loop = EventLoop::new();
        assert!(!event_loop.wait_for_work(Duration::from_millis(5)));
        event_loop.shared.request_engine_turn();
        assert!(event_loop.wait_for_work(Duration::from_millis(5)));
    }
}
