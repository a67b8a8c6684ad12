//! # Tessel
//!
//! A prototype-object runtime whose scripts run in bounded time slices, so
//! a host event loop is never blocked by a long or runaway program.
//!
//! ## Architecture
//!
//! ```text
//!  source ──▶ parser ──▶ materialize ──▶ Vec<NodeRef>
//!                                            │
//!                   ┌────────────────────────┴──────────────┐
//!                   ▼                                       ▼
//!        ┌────────────────────┐                  ┌────────────────────┐
//!        │ Engine             │                  │ Evaluator          │
//!        │ code + data stacks │                  │ recursive, spaces  │
//!        │ ticks, pending     │                  │ blocks until done  │
//!        └─────────┬──────────┘                  └─────────┬──────────┘
//!                  └───────────────┬───────────────────────┘
//!                                  ▼
//!                   Heap: objects, parents, slots, spaces
//! ```
//!
//! ```rust
//! use std::sync::Arc;
//! use tessel::{HostPlatform, VM, VMCreateInfo};
//!
//! let mut vm = VM::new(VMCreateInfo::default(), Arc::new(HostPlatform::new())).unwrap();
//! let value = vm.eval("square = {|x| x * x}; square(4)", None).unwrap();
//! assert_eq!(vm.inspect(value), "16");
//! ```

pub mod activation;
pub mod bridge;
pub mod code;
pub mod completion;
pub mod error;
pub mod evaluator;
pub mod execution;
pub mod format;
pub mod heap;
pub mod interpreter;
pub mod lookup;
pub mod materialize;
pub mod object;
pub mod platform;
pub mod primitives;
pub mod scheduler;
pub mod slots;
pub mod special;
pub mod vm;

pub use activation::{ArgumentValue, bind_arguments};
pub use bridge::{ConversionError, NativeValue};
pub use code::{
    ArgumentCode, AssignCode, BlockCode, Location, Node, NodeKind, NodeRef, ParamCode,
    SendCode, Source,
};
pub use completion::{Outcome, PendingResult};
pub use error::{EvalError, RuntimeError, RuntimeErrorKind};
pub use evaluator::Evaluator;
pub use execution::{ExecutionState, ExecutionStateInfo, Step};
pub use heap::{Heap, HeapCreateInfo};
pub use interpreter::Engine;
pub use lookup::LookupResult;
pub use materialize::materialize;
pub use object::{Code, NativeData, Object, ObjectFlags, Value};
pub use platform::{
    Clock, HostPlatform, Libraries, ManualClock, Output, Platform, SystemClock,
};
pub use primitives::{PrimitiveContext, PrimitiveFunction, PrimitiveMessage};
pub use scheduler::EventLoop;
pub use slots::{SlotInfo, SlotMap};
pub use special::SpecialObjects;
pub use vm::{EngineKind, Evaluation, VM, VMCreateInfo};
