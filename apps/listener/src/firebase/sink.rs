use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use canvas_studio_core::errors::{Error, Result};
use canvas_studio_core::status::StatusSink;

use super::FirebaseSession;

/// Writes status nodes with `PUT`. A `None` value writes `null`, which
/// removes the node.
pub struct FirebaseStatusSink {
    session: FirebaseSession,
    timeout: Duration,
}

impl FirebaseStatusSink {
    pub fn new(session: FirebaseSession, timeout: Duration) -> Self {
        Self { session, timeout }
    }
}

#[async_trait]
impl StatusSink for FirebaseStatusSink {
    async fn publish(&self, path: &str, value: Option<&Value>) -> Result<()> {
        let body = value.cloned().unwrap_or(Value::Null);
        let response = self
            .session
            .request(Method::PUT, path)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::status(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::status(format!("{} returned {}", path, status)));
        }
        tracing::trace!("PUT {} -> {}", path, status);
        Ok(())
    }
}
