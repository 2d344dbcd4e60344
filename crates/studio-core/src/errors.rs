//! Core error types for the scheduler.
//!
//! Nothing inside the running scheduler is allowed to fail the process; these
//! errors surface at construction time or at collaborator boundaries, where
//! the scheduler converts them into published status messages.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the scheduler core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    #[error("Gateway request failed: {0}")]
    Gateway(String),

    #[error("Gateway connection closed")]
    GatewayClosed,

    #[error("Status publish failed: {0}")]
    Status(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a gateway error
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway(message.into())
    }

    /// Create a status sink error
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status(message.into())
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
