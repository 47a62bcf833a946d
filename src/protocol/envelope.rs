//! Outbound message envelope.
//!
//! Every message the parent sends travels in an [`Envelope`]: the message
//! type, the target window, the target URL, and a `data` object stamped with
//! the connection id.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "seamless_data",
//!   "target": "child-window",
//!   "url": "https://child.example/page",
//!   "data": { "__id": "...", ... }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::identifiers::{ConnectionId, WindowRef};

use super::message::{CONNECT, ConnectData, DATA, ID_KEY};

// ============================================================================
// Envelope
// ============================================================================

/// A normalized outbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Message type, `seamless_data` unless set.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Child window the message is addressed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<WindowRef>,

    /// URL of the child page.
    pub url: String,

    /// Payload, always an object so `__id` can be stamped.
    pub data: Map<String, Value>,
}

impl Envelope {
    /// Creates an unaddressed envelope of the given type.
    #[must_use]
    pub fn new(message_type: impl Into<String>, data: Value) -> Self {
        let message_type = message_type.into();
        Self {
            message_type: if message_type.is_empty() {
                DATA.to_string()
            } else {
                message_type
            },
            target: None,
            url: String::new(),
            data: into_object(data),
        }
    }

    /// Creates the `seamless_connect` envelope for a handshake.
    #[must_use]
    pub fn connect(payload: &ConnectData) -> Self {
        Self::new(
            CONNECT,
            json!({ "id": payload.id, "styles": payload.styles }),
        )
    }

    /// Addresses the envelope and stamps the connection id.
    ///
    /// An unassigned id is stamped as the empty string.
    pub fn stamp(&mut self, target: Option<&WindowRef>, url: &str, id: Option<&ConnectionId>) {
        self.target = target.cloned();
        self.url = url.to_string();
        let id = id.map(|id| id.as_str().to_string()).unwrap_or_default();
        self.data.insert(ID_KEY.to_string(), Value::String(id));
    }

    /// Returns the stamped connection id, if any.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.data
            .get(ID_KEY)
            .and_then(Value::as_str)
            .and_then(ConnectionId::from_wire)
    }
}

impl From<Value> for Envelope {
    /// Normalizes a payload or a partial envelope.
    ///
    /// An object with a `data` key is read as `{type?, data}`; anything else
    /// becomes the `data` of a `seamless_data` message.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("data") => {
                let message_type = map
                    .remove("type")
                    .and_then(|t| t.as_str().map(str::to_string))
                    .unwrap_or_default();
                let data = map.remove("data").unwrap_or(Value::Null);
                Self::new(message_type, data)
            }
            other => Self::new(DATA, other),
        }
    }
}

/// Coerces a payload into an object.
fn into_object(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_payload_defaults_to_data_type() {
        let envelope = Envelope::from(json!({"greeting": "hi"}));
        assert_eq!(envelope.message_type, DATA);
        assert_eq!(envelope.data["greeting"], json!("hi"));
    }

    #[test]
    fn test_partial_envelope_keeps_type() {
        let envelope = Envelope::from(json!({"type": "chat", "data": {"text": "hi"}}));
        assert_eq!(envelope.message_type, "chat");
        assert_eq!(envelope.data["text"], json!("hi"));
    }

    #[test]
    fn test_partial_envelope_without_type() {
        let envelope = Envelope::from(json!({"data": {"n": 1}}));
        assert_eq!(envelope.message_type, DATA);
    }

    #[test]
    fn test_scalar_payload_is_wrapped() {
        let envelope = Envelope::from(json!(42));
        assert_eq!(envelope.data["value"], json!(42));
    }

    #[test]
    fn test_stamp() {
        let id = ConnectionId::generate();
        let target = WindowRef::new("child");
        let mut envelope = Envelope::from(json!({"n": 1}));

        envelope.stamp(Some(&target), "https://child.example/page", Some(&id));

        assert_eq!(envelope.target, Some(target));
        assert_eq!(envelope.url, "https://child.example/page");
        assert_eq!(envelope.connection_id(), Some(id));
    }

    #[test]
    fn test_stamp_without_id() {
        let mut envelope = Envelope::from(json!({}));
        envelope.stamp(None, "/child", None);
        assert_eq!(envelope.data[ID_KEY], json!(""));
        assert_eq!(envelope.connection_id(), None);
    }

    #[test]
    fn test_connect_envelope_serialization() {
        let id = ConnectionId::from_wire("abc").expect("non-empty");
        let envelope = Envelope::connect(&ConnectData {
            id,
            styles: vec!["body { margin: 0 }".to_string()],
        });
        let json = serde_json::to_value(&envelope).expect("serialize");

        assert_eq!(json["type"], json!("seamless_connect"));
        assert_eq!(json["data"]["id"], json!("abc"));
        assert_eq!(json["data"]["styles"], json!(["body { margin: 0 }"]));
        assert!(json.get("target").is_none());
    }
}
