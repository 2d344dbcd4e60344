//! Status sink trait and implementations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{Error, Result};

/// Destination for status writes (heartbeat, working flag, errors).
///
/// Only the [`StatusPublisher`](super::StatusPublisher) worker calls this, one
/// write at a time and in the order the updates were queued. A `None` value
/// clears the node.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn publish(&self, path: &str, value: Option<&Value>) -> Result<()>;
}

/// No-op implementation for tests or contexts that don't report status.
#[derive(Clone, Default)]
pub struct NoOpStatusSink;

#[async_trait]
impl StatusSink for NoOpStatusSink {
    async fn publish(&self, _path: &str, _value: Option<&Value>) -> Result<()> {
        Ok(())
    }
}

/// Mock sink for testing - collects published updates.
#[derive(Clone, Default)]
pub struct MockStatusSink {
    updates: Arc<Mutex<Vec<(String, Option<Value>)>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected updates in publish order.
    pub fn updates(&self) -> Vec<(String, Option<Value>)> {
        self.updates.lock().unwrap().clone()
    }

    /// Values published to `path`, oldest first.
    pub fn values_for(&self, path: &str) -> Vec<Option<Value>> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Most recent value published to `path`; outer `None` if never written.
    pub fn last_value(&self, path: &str) -> Option<Option<Value>> {
        self.values_for(path).pop()
    }

    pub fn count_for(&self, path: &str) -> usize {
        self.values_for(path).len()
    }

    pub fn clear(&self) {
        self.updates.lock().unwrap().clear();
    }

    /// While set, `publish` records nothing and returns an error.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl StatusSink for MockStatusSink {
    async fn publish(&self, path: &str, value: Option<&Value>) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(Error::status("Intentional publish failure"));
        }
        self.updates
            .lock()
            .unwrap()
            .push((path.to_string(), value.cloned()));
        Ok(())
    }
}
