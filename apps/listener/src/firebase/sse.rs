//! Server-sent event framing and Firebase streaming payloads.

use serde::Deserialize;
use serde_json::Value;

use canvas_studio_core::Notification;

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental decoder: push raw chunks, pull complete events.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    pub fn next_event(&mut self) -> Option<SseEvent> {
        loop {
            let newline = self.buffer.iter().position(|&b| b == b'\n')?;
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if line.is_empty() {
                if self.event.is_none() && self.data.is_empty() {
                    continue;
                }
                return Some(SseEvent {
                    event: self.event.take(),
                    data: std::mem::take(&mut self.data).join("\n"),
                });
            }
            if line.starts_with(b":") {
                continue;
            }

            let line = String::from_utf8_lossy(&line);
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_ref(), ""),
            };
            match field {
                "event" => self.event = Some(value.trim().to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }
    }
}

/// What a Firebase stream event means for the listener.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Changes(Vec<Notification>),
    KeepAlive,
    /// The server ended the stream (`cancel` or `auth_revoked`).
    Closed(String),
    Ignored,
}

#[derive(Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

impl FeedMessage {
    pub fn from_event(event: &SseEvent) -> Self {
        match event.event.as_deref() {
            Some("put") | Some("patch") => match serde_json::from_str::<ChangePayload>(&event.data)
            {
                Ok(payload) => {
                    let mut out = Vec::new();
                    flatten(&payload.path, &payload.data, &mut out);
                    FeedMessage::Changes(out)
                }
                Err(e) => {
                    tracing::warn!("Unreadable change payload: {}", e);
                    FeedMessage::Ignored
                }
            },
            Some("keep-alive") => FeedMessage::KeepAlive,
            Some(kind @ ("cancel" | "auth_revoked")) => FeedMessage::Closed(kind.to_string()),
            other => {
                tracing::debug!("Ignoring stream event {:?}", other);
                FeedMessage::Ignored
            }
        }
    }
}

/// Expands a subtree written at `path` into one notification per leaf.
///
/// `null` clears the node at `path`. Non-string scalars are passed on in
/// their JSON text form.
pub fn flatten(path: &str, data: &Value, out: &mut Vec<Notification>) {
    match data {
        Value::Object(children) => {
            for (key, child) in children {
                flatten(&join(path, key), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(&join(path, &index.to_string()), child, out);
            }
        }
        Value::Null => {
            if path != "/" {
                out.push(Notification::cleared(path));
            }
        }
        Value::String(text) => out.push(Notification::set(path, text.clone())),
        scalar => out.push(Notification::set(path, scalar.to_string())),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.ends_with('/') {
        format!("{}{}", path, key)
    } else {
        format!("{}/{}", path, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::default();
        decoder.push(b"event: put\ndata: {\"path\":\"/\",");
        assert!(decoder.next_event().is_none());

        decoder.push(b"\"data\":null}\r\n\r\nevent: keep-alive\ndata: null\n\n");
        assert_eq!(
            decoder.next_event(),
            Some(SseEvent {
                event: Some("put".into()),
                data: "{\"path\":\"/\",\"data\":null}".into(),
            })
        );
        assert_eq!(
            decoder.next_event().unwrap().event.as_deref(),
            Some("keep-alive")
        );
        assert!(decoder.next_event().is_none());
    }

    #[test]
    fn test_decoder_skips_comments_and_joins_data_lines() {
        let mut decoder = SseDecoder::default();
        decoder.push(b": ping\n\nevent: patch\ndata: a\ndata: b\n\n");

        let event = decoder.next_event().unwrap();
        assert_eq!(event.event.as_deref(), Some("patch"));
        assert_eq!(event.data, "a\nb");
    }

    #[test]
    fn test_flatten_initial_snapshot() {
        let mut out = Vec::new();
        flatten(
            "/",
            &json!({
                "FolderName": "ModelA",
                "reset": 0,
                "update": { "Block1": { "A": "7", "B": 1.5 } }
            }),
            &mut out,
        );

        assert_eq!(
            out,
            vec![
                Notification::set("/FolderName", "ModelA"),
                Notification::set("/reset", "0"),
                Notification::set("/update/Block1/A", "7"),
                Notification::set("/update/Block1/B", "1.5"),
            ]
        );
    }

    #[test]
    fn test_flatten_leaf_and_null() {
        let mut out = Vec::new();
        flatten("/reference", &json!("R1"), &mut out);
        flatten("/update/Block1/A", &Value::Null, &mut out);
        flatten("/", &Value::Null, &mut out);

        assert_eq!(
            out,
            vec![
                Notification::set("/reference", "R1"),
                Notification::cleared("/update/Block1/A"),
            ]
        );
    }

    #[test]
    fn test_stream_events() {
        let patch = SseEvent {
            event: Some("patch".into()),
            data: json!({ "path": "/update/Block2", "data": { "C": "3" } }).to_string(),
        };
        assert_eq!(
            FeedMessage::from_event(&patch),
            FeedMessage::Changes(vec![Notification::set("/update/Block2/C", "3")])
        );

        let cancel = SseEvent {
            event: Some("cancel".into()),
            data: "null".into(),
        };
        assert_eq!(
            FeedMessage::from_event(&cancel),
            FeedMessage::Closed("cancel".into())
        );

        let garbage = SseEvent {
            event: Some("put".into()),
            data: "not json".into(),
        };
        assert_eq!(FeedMessage::from_event(&garbage), FeedMessage::Ignored);
    }
}
