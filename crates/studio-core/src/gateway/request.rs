use crate::fields::FieldMap;
use crate::model::{ModelTarget, UpdateIntent};

/// One dispatch to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    /// Monotonic per scheduler, for log correlation.
    pub id: u64,
    /// Target to load before the operation runs, when the selection changed.
    pub load: Option<ModelTarget>,
    pub operation: GatewayOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOperation {
    /// Apply accumulated fields, refresh the source block and save.
    Commit {
        fields: FieldMap,
        reference: Option<String>,
        source_block: Option<String>,
    },
    /// Drop the working state and reload the target.
    Reset,
    /// Restore the last saved working state.
    Revert,
}

impl GatewayOperation {
    pub fn intent(&self) -> UpdateIntent {
        match self {
            GatewayOperation::Commit { .. } => UpdateIntent::Update,
            GatewayOperation::Reset => UpdateIntent::Reset,
            GatewayOperation::Revert => UpdateIntent::Revert,
        }
    }

    /// Fields carried by a commit, if any.
    pub fn fields(&self) -> Option<&FieldMap> {
        match self {
            GatewayOperation::Commit { fields, .. } => Some(fields),
            _ => None,
        }
    }
}
