use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{GatewayClient, GatewayRequest};
use crate::errors::{Error, Result};

/// Mock gateway for testing - records submitted requests.
///
/// Replies are not generated; tests deliver them through the reply channel.
#[derive(Clone, Default)]
pub struct MockGatewayClient {
    requests: Arc<Mutex<Vec<GatewayRequest>>>,
    fail_on_submit: Arc<Mutex<Option<String>>>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all submitted requests in order.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<GatewayRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().unwrap().is_empty()
    }

    /// Makes every following `submit` fail with `message` (or succeed again
    /// with `None`).
    pub fn set_fail_on_submit(&self, message: Option<&str>) {
        *self.fail_on_submit.lock().unwrap() = message.map(str::to_string);
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn submit(&self, request: &GatewayRequest) -> Result<()> {
        if let Some(message) = self.fail_on_submit.lock().unwrap().clone() {
            return Err(Error::gateway(message));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}
