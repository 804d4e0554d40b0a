//! Deferred-value runtime: Settlables, continuations, and microtask
//! scheduling.
//!
//! This crate provides a single-assignment deferred value with
//! Promise/A+-style resolution semantics:
//!
//! - [`Settlable`] - the deferred value: state machine, settlement entry
//!   points, and the chaining operation
//! - [`Thenable`] - the capability foreign objects implement to
//!   interoperate with the resolution procedure
//! - [`TaskScheduler`] / [`MicrotaskQueue`] - the injected
//!   deferred-execution facility and its shipped deterministic
//!   implementation
//! - [`Value`] / [`Function`] - the dynamic payload and callable types
//!
//! Continuations attached with [`Settlable::then`] run asynchronously,
//! exactly once, in attachment order, whether they were attached before or
//! after the outcome became known.
//!
//! # Examples
//!
//! ```
//! use settle_runtime::{Function, MicrotaskQueue, Settlable, SettleState, Value};
//!
//! let queue = MicrotaskQueue::new();
//!
//! let greeting = Settlable::new(queue.scheduler(), |settle_fulfilled, _settle_rejected| {
//!     settle_fulfilled(Value::String("How are u?".to_string()));
//!     Ok(())
//! });
//!
//! let length = greeting.then(
//!     Some(Function::new(|args| match args.first() {
//!         Some(Value::String(text)) => Ok(Value::Smi(text.len() as i32)),
//!         _ => Ok(Value::Smi(0)),
//!     })),
//!     None,
//! );
//!
//! // Handlers never run on the attaching stack.
//! assert_eq!(length.state(), SettleState::Pending);
//!
//! queue.run_until_done();
//! assert_eq!(length.value(), Some(Value::Smi(11)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod settlable;
pub mod task_queue;
pub mod thenable;
pub mod value;

// Re-export main types at crate root
pub use settlable::{Fate, SettleFn, SettleState, Settlable};
pub use task_queue::{MicroTask, MicrotaskQueue, TaskScheduler};
pub use thenable::Thenable;
pub use value::{Function, Value};
