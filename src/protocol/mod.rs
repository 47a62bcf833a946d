//! Cross-window protocol message types.
//!
//! This module defines the messages exchanged between the parent page and
//! the child page loaded in a seamless iframe.
//!
//! # Handshake
//!
//! ```text
//! child                                   parent
//!   │ ── seamless_ready ─────────────────► │  assign id
//!   │ ◄───────────── seamless_connect ──── │  {id, styles}
//!   │ ── seamless_update {__id, height} ─► │  activate, resize
//!   │ ◄───────────── seamless_data ─────── │  queued sends drained
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Outbound [`Envelope`] normalization and stamping |
//! | `message` | Type names, typed payloads, [`InboundMessage`] |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound message envelope.
pub mod envelope;

/// Message type names and payloads.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::Envelope;
pub use message::{
    CONNECT, ConnectData, DATA, ERROR, ErrorData, ID_KEY, InboundMessage, NOIFRAME, NoIframeData,
    READY, RawMessage, UPDATE, UpdateData,
};
