use serde::{Deserialize, Serialize};

/// A single `(key, value)` change event from the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub key: String,
    pub value: Option<String>,
}

impl Notification {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Notification carrying a value.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Some(value.into()))
    }

    /// Notification for a node that was cleared.
    pub fn cleared(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }
}
