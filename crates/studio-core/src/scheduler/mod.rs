//! The debounced, single-flight update scheduler.
//!
//! Producers call [`SchedulerHandle::notify`] from any thread. One worker task
//! folds notifications into the accumulated state, waits for the debounce gate
//! and keeps at most one gateway request outstanding. A separate liveness
//! reporter publishes heartbeats, and all status writes go through the
//! scheduler's [`StatusPublisher`](crate::status::StatusPublisher).

mod liveness;
mod service;
pub mod state;
mod worker;

pub use service::{Scheduler, SchedulerHandle};
pub use state::{FoldOutcome, InFlight, SchedulerState};
