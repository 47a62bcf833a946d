//! Seamless Frame - Borderless, auto-resizing iframe embedding.
//!
//! This library implements the parent side of the seamless iframe protocol:
//! a handshake with the child page, height synchronisation, a queued message
//! channel, and a fallback link when the child cannot be shown inline.
//!
//! # Architecture
//!
//! The library is host-agnostic. The embedding application supplies two
//! collaborators:
//!
//! - **[`Transport`]**: delivers envelopes to a child window (`postMessage`)
//! - **[`Dom`]**: element lookup, styling, loading indicator, fallback box
//!
//! and feeds every inbound message to [`Seamless::dispatch`].
//!
//! Key design principles:
//!
//! - One [`Seamless`] coordinator per page owns the frame registry
//! - Each [`SeamlessFrame`] owns one connection with its own send queue
//! - Messages sent before the handshake completes are queued, never dropped
//! - Locks are never held while calling the transport or the DOM
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use seamless_frame::{IframeRef, Result, Seamless, SeamlessOptions};
//!
//! async fn embed(
//!     transport: Arc<dyn seamless_frame::Transport>,
//!     dom: Arc<dyn seamless_frame::Dom>,
//! ) -> Result<()> {
//!     let seamless = Seamless::new(transport, dom);
//!
//!     let frame = seamless.attach(
//!         IframeRef::new("content"),
//!         SeamlessOptions::new().with_styles(["body { background: none }"]),
//!     )?;
//!
//!     // Queued until the child reports its first height
//!     frame.send(serde_json::json!({"greeting": "hello"}));
//!
//!     // Wire every inbound message into the coordinator
//!     seamless.dispatch_json(r#"{"type": "seamless_ready"}"#)?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Connection ids and host references |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | Connections, routing, and the [`Transport`] trait |
//! | [`widget`] | [`Seamless`], [`SeamlessFrame`], options and fallback |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers keep connection ids and host references apart.
pub mod identifiers;

/// Wire protocol message types.
pub mod protocol;

/// Transport layer.
///
/// Per-frame connections, the frame registry, and custom message handlers.
pub mod transport;

/// The seamless iframe widget.
pub mod widget;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Widget types
pub use widget::{
    Dom, Fallback, FallbackLink, FallbackReason, FrameState, LoadingIndicator, OnConnect,
    Seamless, SeamlessFrame, SeamlessOptions, filter_text,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, IframeRef, WindowRef};

// Protocol types
pub use protocol::{Envelope, RawMessage};

// Transport types
pub use transport::{SuccessCallback, Transport};
