//! JSON action protocol spoken by the canvas gateway.
//!
//! Each request is written as one action object, or as a `steps` action
//! wrapping several:
//!
//! ```json
//! { "action": "steps", "data": [
//!     { "action": "loadState", "data": { "model": "API Test", "state": "State (3)" } },
//!     { "action": "update", "data": { "block": "BlockA", "tunables": [ { "name": "Tunable1", "value": "7" } ] } },
//!     { "action": "saveWorkingState" }
//! ] }
//! ```
//!
//! Replies are `{ "success": bool, "reply": string | [string] }`.

use log::warn;
use serde::{Deserialize, Serialize};

use super::{GatewayOperation, GatewayReply, GatewayRequest};
use crate::constants::UNREADABLE_REPLY_MESSAGE;
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum GatewayAction {
    LoadState {
        model: String,
        state: String,
    },
    Update {
        block: String,
        tunables: Vec<TunableValue>,
    },
    Refresh {
        block: String,
        external: String,
    },
    ClearWorkingState,
    LoadWorkingState,
    SaveWorkingState,
    Steps(Vec<GatewayAction>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunableValue {
    pub name: String,
    pub value: String,
}

/// Expands a request into the ordered list of gateway actions.
pub fn actions_for(request: &GatewayRequest) -> Vec<GatewayAction> {
    let mut actions = Vec::new();

    match &request.operation {
        GatewayOperation::Commit {
            fields,
            reference,
            source_block,
        } => {
            push_load(&mut actions, request);
            for (block, tunables) in fields.blocks() {
                actions.push(GatewayAction::Update {
                    block: block.to_string(),
                    tunables: tunables
                        .iter()
                        .map(|(name, value)| TunableValue {
                            name: name.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                });
            }
            if let Some(block) = source_block.as_ref().filter(|b| !b.is_empty()) {
                actions.push(GatewayAction::Refresh {
                    block: block.clone(),
                    external: reference.clone().unwrap_or_default(),
                });
            }
            actions.push(GatewayAction::SaveWorkingState);
        }
        GatewayOperation::Reset => {
            actions.push(GatewayAction::ClearWorkingState);
            push_load(&mut actions, request);
        }
        GatewayOperation::Revert => {
            push_load(&mut actions, request);
            actions.push(GatewayAction::LoadWorkingState);
        }
    }

    actions
}

fn push_load(actions: &mut Vec<GatewayAction>, request: &GatewayRequest) {
    if let Some(target) = &request.load {
        actions.push(GatewayAction::LoadState {
            model: target.name.clone(),
            state: target.state.clone(),
        });
    }
}

/// Encodes a request as a single JSON document (no trailing newline).
pub fn encode_request(request: &GatewayRequest) -> Result<String> {
    let mut actions = actions_for(request);
    let action = if actions.len() == 1 {
        actions.remove(0)
    } else {
        GatewayAction::Steps(actions)
    };
    Ok(serde_json::to_string(&action)?)
}

#[derive(Deserialize)]
struct RawReply {
    success: bool,
    #[serde(default)]
    reply: Option<ReplyBody>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplyBody {
    One(String),
    Many(Vec<String>),
}

/// Decodes a reply document. Anything unreadable becomes a failure reply.
pub fn decode_reply(raw: &str) -> GatewayReply {
    match serde_json::from_str::<RawReply>(raw.trim()) {
        Ok(reply) => {
            let messages = match reply.reply {
                Some(ReplyBody::One(message)) if message.is_empty() => Vec::new(),
                Some(ReplyBody::One(message)) => vec![message],
                Some(ReplyBody::Many(messages)) => messages,
                None => Vec::new(),
            };
            GatewayReply {
                success: reply.success,
                messages,
            }
        }
        Err(e) => {
            warn!("Unreadable gateway reply ({}): {}", e, raw);
            GatewayReply::failure_message(UNREADABLE_REPLY_MESSAGE)
        }
    }
}
