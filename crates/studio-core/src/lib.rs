//! Canvas Studio Core - the debounced, single-flight update scheduler.
//!
//! This crate turns a stream of `(key, value)` notifications from the Studio
//! feed into serialized gateway requests. Bursts of field edits are coalesced
//! behind a debounce gate, at most one request is outstanding at a time, and
//! liveness and error status are published through a pluggable sink.
//!
//! Transports are not part of this crate: the gateway and the status sink are
//! traits implemented by the runtime (see the `canvas-studio-listener` app).

pub mod classifier;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod errors;
pub mod fields;
pub mod gateway;
pub mod model;
pub mod notifications;
pub mod scheduler;
pub mod status;

pub use config::SchedulerConfig;
pub use fields::FieldMap;
pub use model::{ModelReference, ModelTarget, UpdateIntent};
pub use notifications::Notification;
pub use scheduler::{Scheduler, SchedulerHandle};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
