//! Typed message payloads.
//!
//! Inbound traffic arrives as a [`RawMessage`] (`{type, data}`) and is
//! parsed into an [`InboundMessage`] with one variant per protocol type.
//!
//! # Message Types
//!
//! | Type | Direction | Payload |
//! |------|-----------|---------|
//! | `seamless_ready` | child → parent | none required |
//! | `seamless_connect` | parent → child | [`ConnectData`] |
//! | `seamless_update` | child → parent | [`UpdateData`] |
//! | `seamless_error` | child → parent | [`ErrorData`] |
//! | `seamless_noiframe` | child → parent | [`NoIframeData`] |
//! | `seamless_data` | both | free-form, default for user messages |

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// Message Type Names
// ============================================================================

/// Child announces DOM readiness.
pub const READY: &str = "seamless_ready";

/// Parent assigns the connection id and pushes styles.
pub const CONNECT: &str = "seamless_connect";

/// Child reports its content height.
pub const UPDATE: &str = "seamless_update";

/// Child reports a failure.
pub const ERROR: &str = "seamless_error";

/// Child asks the top-level page to reload without the iframe.
pub const NOIFRAME: &str = "seamless_noiframe";

/// Default type for user messages sent over a connection.
pub const DATA: &str = "seamless_data";

/// Wire key carrying the connection id inside `data`.
pub const ID_KEY: &str = "__id";

// ============================================================================
// RawMessage
// ============================================================================

/// An untyped inbound message as delivered by the transport.
///
/// # Format
///
/// ```json
/// { "type": "seamless_update", "data": { "__id": "...", "height": 240 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message type.
    #[serde(rename = "type")]
    pub message_type: String,

    /// Message payload.
    #[serde(default)]
    pub data: Value,
}

impl RawMessage {
    /// Creates a raw message.
    #[inline]
    #[must_use]
    pub fn new(message_type: impl Into<String>, data: Value) -> Self {
        Self {
            message_type: message_type.into(),
            data,
        }
    }

    /// Parses a raw message from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not a `{type, data}` object.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Payload of `seamless_connect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectData {
    /// The connection id assigned by the parent.
    pub id: ConnectionId,

    /// CSS rules the child should inject.
    pub styles: Vec<String>,
}

/// Payload of `seamless_update`.
///
/// Unknown fields are kept so the payload can be echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateData {
    /// Connection id as sent on the wire (may be empty).
    #[serde(rename = "__id", default, deserialize_with = "wire_id")]
    pub id: String,

    /// Reported content height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpdateData {
    /// Creates an update for the given id and height.
    #[must_use]
    pub fn new(id: impl Into<String>, height: f64) -> Self {
        Self {
            id: id.into(),
            height: Some(height),
            extra: Map::new(),
        }
    }

    /// Returns the connection id, or `None` if the wire id is empty.
    #[inline]
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        ConnectionId::from_wire(&self.id)
    }

    /// Returns the height to apply, if any.
    ///
    /// Absent, negative, and non-finite heights mean "do not resize".
    /// Zero is a valid target.
    #[inline]
    #[must_use]
    pub fn resize_target(&self) -> Option<f64> {
        self.height.filter(|h| h.is_finite() && *h >= 0.0)
    }

    /// Converts the payload back into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = self.extra;
        map.insert(ID_KEY.to_string(), Value::String(self.id));
        if let Some(height) = self.height {
            map.insert("height".to_string(), Value::from(height));
        }
        Value::Object(map)
    }
}

/// Payload of `seamless_error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    /// Connection id as sent on the wire.
    #[serde(rename = "__id", default, deserialize_with = "wire_id")]
    pub id: String,

    /// Message shown before the link.
    #[serde(default)]
    pub msg: String,

    /// Text of the fallback link.
    #[serde(default)]
    pub link_text: String,

    /// Text shown after the link.
    #[serde(default)]
    pub after_text: String,
}

/// Payload of `seamless_noiframe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoIframeData {
    /// Location the top-level page should load instead.
    pub href: String,
}

// ============================================================================
// InboundMessage
// ============================================================================

/// Parsed inbound message for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `seamless_ready`, with whatever payload the child attached.
    Ready(Value),

    /// `seamless_update`.
    Update(UpdateData),

    /// `seamless_error`.
    Error(ErrorData),

    /// `seamless_noiframe`.
    NoIframe(NoIframeData),

    /// Any other type, including `seamless_data` and user-defined types.
    Other(RawMessage),
}

impl InboundMessage {
    /// Parses a raw message into its typed variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a protocol message carries a payload
    /// that does not match its type.
    pub fn parse(raw: RawMessage) -> Result<Self> {
        let RawMessage { message_type, data } = raw;

        let parsed = match message_type.as_str() {
            READY => Self::Ready(data),
            UPDATE => Self::Update(payload(&message_type, data)?),
            ERROR => Self::Error(payload(&message_type, data)?),
            NOIFRAME => Self::NoIframe(payload(&message_type, data)?),
            _ => Self::Other(RawMessage { message_type, data }),
        };

        Ok(parsed)
    }

    /// Returns the wire type name of this message.
    #[must_use]
    pub fn message_type(&self) -> &str {
        match self {
            Self::Ready(_) => READY,
            Self::Update(_) => UPDATE,
            Self::Error(_) => ERROR,
            Self::NoIframe(_) => NOIFRAME,
            Self::Other(raw) => &raw.message_type,
        }
    }
}

/// Reads `__id` as a string.
///
/// A child that has not completed the handshake sends a placeholder such as
/// `0` or `null`; anything that is not a string reads as the empty id.
fn wire_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => id,
        _ => String::new(),
    })
}

/// Deserializes a typed payload, treating `null` as an empty object.
fn payload<T: DeserializeOwned>(message_type: &str, data: Value) -> Result<T> {
    let data = if data.is_null() {
        Value::Object(Map::new())
    } else {
        data
    };

    serde_json::from_value(data)
        .map_err(|e| Error::protocol(format!("invalid {message_type} payload: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
