//! Traits defining the contract with the execution gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::GatewayRequest;
use crate::errors::Result;

/// Client for the execution gateway.
///
/// `submit` only issues the request. Completion is reported later by the
/// transport on the reply channel handed to the scheduler.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn submit(&self, request: &GatewayRequest) -> Result<()>;
}

/// Outcome of a gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReply {
    pub success: bool,
    pub messages: Vec<String>,
}

impl GatewayReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    pub fn failure(messages: Vec<String>) -> Self {
        Self {
            success: false,
            messages,
        }
    }

    pub fn failure_message(message: impl Into<String>) -> Self {
        Self::failure(vec![message.into()])
    }
}

pub type ReplySender = mpsc::UnboundedSender<GatewayReply>;
pub type ReplyReceiver = mpsc::UnboundedReceiver<GatewayReply>;

/// Channel the gateway transport uses to deliver replies to the scheduler.
pub fn reply_channel() -> (ReplySender, ReplyReceiver) {
    mpsc::unbounded_channel()
}
