//! Incoming change notifications and the queue that buffers them.
//!
//! Producers push through a cloneable [`PendingSender`]; the scheduler's
//! consumer task owns the single [`PendingList`] and drains it head-first.

mod notification;
mod pending;

pub use notification::*;
pub use pending::*;
