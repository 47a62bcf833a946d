//! Type-safe identifiers for frames, windows, and connections.
//!
//! Newtype wrappers keep a connection id, a window handle, and an iframe
//! handle from being mixed up even though all three are strings on the wire.
//!
//! | Type | Identifies |
//! |------|------------|
//! | [`ConnectionId`] | One parent/child channel, assigned during the handshake |
//! | [`WindowRef`] | A child window as understood by the transport |
//! | [`IframeRef`] | An iframe element as understood by the DOM helper |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// Constants
// ============================================================================

/// Symbols a connection id is drawn from.
pub const CONNECTION_ID_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of a generated connection id.
pub const CONNECTION_ID_LEN: usize = 32;

// ============================================================================
// ConnectionId
// ============================================================================

/// Identifier correlating messages to one [`Connection`](crate::transport::Connection).
///
/// Never empty. An unassigned id is modelled as `Option<ConnectionId>::None`,
/// so "no id yet" can never compare equal to a real one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generates a fresh id of [`CONNECTION_ID_LEN`] symbols, each drawn
    /// uniformly from [`CONNECTION_ID_ALPHABET`].
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..CONNECTION_ID_LEN)
            .map(|_| {
                let index = rng.gen_range(0..CONNECTION_ID_ALPHABET.len());
                char::from(CONNECTION_ID_ALPHABET[index])
            })
            .collect();
        Self(id)
    }

    /// Wraps an id received on the wire.
    ///
    /// Returns `None` for the empty string.
    #[inline]
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(Error::protocol("connection id must not be empty"))
        } else {
            Ok(Self(value))
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// WindowRef
// ============================================================================

/// Opaque handle to a child window, interpreted by the [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowRef(String);

impl WindowRef {
    /// Creates a window handle.
    #[inline]
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// IframeRef
// ============================================================================

/// Opaque handle to an iframe element, interpreted by the [`Dom`](crate::Dom).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IframeRef(String);

impl IframeRef {
    /// Creates an iframe handle.
    #[inline]
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IframeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
