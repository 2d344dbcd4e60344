//! Target selection and pending intent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The pending high-level action to perform once the debounce gate opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateIntent {
    #[default]
    None,
    /// Commit accumulated fields plus the reference.
    Update,
    /// Discard local edits and reload the target from scratch.
    Reset,
    /// Restore the gateway's last saved working copy.
    Revert,
}

impl UpdateIntent {
    pub fn is_none(&self) -> bool {
        matches!(self, UpdateIntent::None)
    }

    /// Reset and revert are explicit commands that skip the quiet period.
    pub fn is_discrete(&self) -> bool {
        matches!(self, UpdateIntent::Reset | UpdateIntent::Revert)
    }
}

impl fmt::Display for UpdateIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateIntent::None => write!(f, "none"),
            UpdateIntent::Update => write!(f, "update"),
            UpdateIntent::Reset => write!(f, "reset"),
            UpdateIntent::Revert => write!(f, "revert"),
        }
    }
}

/// A model folder plus the state file loaded within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTarget {
    pub name: String,
    pub state: String,
}

impl ModelTarget {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }
}

impl fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.state)
    }
}

/// Selection metadata written by Studio and forwarded with each request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReference {
    pub name: Option<String>,
    pub state: Option<String>,
    /// Block refreshed after a commit.
    pub source_block: Option<String>,
    /// Free-form reference forwarded downstream on commit.
    pub reference: Option<String>,
}

impl ModelReference {
    /// The selected target, once both name and state are known.
    pub fn target(&self) -> Option<ModelTarget> {
        match (&self.name, &self.state) {
            (Some(name), Some(state)) if !name.is_empty() && !state.is_empty() => {
                Some(ModelTarget::new(name.clone(), state.clone()))
            }
            _ => None,
        }
    }
}
