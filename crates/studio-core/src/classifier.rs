//! Classifies notification keys into scheduler actions.
//!
//! Keys arrive relative to the Studio callback node, usually with a leading
//! slash (`/reference`, `/update/Block/Tunable`). The slash is optional.

use crate::notifications::Notification;

pub const KEY_TARGET_NAME: &str = "FolderName";
pub const KEY_TARGET_STATE: &str = "StateFile";
pub const KEY_SOURCE_BLOCK: &str = "SourceBlock";
pub const KEY_REFERENCE: &str = "reference";
pub const KEY_RESET: &str = "reset";
pub const KEY_REVERT: &str = "revert";
pub const FIELD_PREFIX: &str = "update";

/// What a notification means to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    TargetName(Option<String>),
    TargetState(Option<String>),
    SourceBlock(Option<String>),
    /// Reference bump; makes pending edits actionable.
    Reference(Option<String>),
    /// Reset command; `armed` is false for a zero/empty flag.
    Reset { armed: bool },
    Revert { armed: bool },
    Field {
        block: String,
        tunable: String,
        value: String,
    },
    Unhandled,
}

pub fn classify(notification: &Notification) -> Classified {
    let path = notification
        .key
        .strip_prefix('/')
        .unwrap_or(notification.key.as_str());
    let value = notification.value.clone();

    match path {
        KEY_TARGET_NAME => return Classified::TargetName(value),
        KEY_TARGET_STATE => return Classified::TargetState(value),
        KEY_SOURCE_BLOCK => return Classified::SourceBlock(value),
        KEY_REFERENCE => return Classified::Reference(value),
        KEY_RESET => {
            return Classified::Reset {
                armed: is_flag_set(value.as_deref()),
            }
        }
        KEY_REVERT => {
            return Classified::Revert {
                armed: is_flag_set(value.as_deref()),
            }
        }
        _ => {}
    }

    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [FIELD_PREFIX, block, tunable] if !block.is_empty() && !tunable.is_empty() => {
            Classified::Field {
                block: (*block).to_string(),
                tunable: (*tunable).to_string(),
                value: value.unwrap_or_default(),
            }
        }
        _ => Classified::Unhandled,
    }
}

/// A flag is set when it parses as a non-zero integer or reads `true`.
fn is_flag_set(value: Option<&str>) -> bool {
    let Some(raw) = value.map(str::trim) else {
        return false;
    };
    if raw.eq_ignore_ascii_case("true") {
        return true;
    }
    raw.parse::<i64>().map(|n| n != 0).unwrap_or(false)
}
