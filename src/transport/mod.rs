//! Cross-window transport layer.
//!
//! The actual delivery of messages between windows (`postMessage` or any
//! equivalent) is supplied by the embedding application through the
//! [`Transport`] trait. This module holds everything layered on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   Transport::send   ┌─────────────────┐
//! │  Connection      │ ──────────────────► │  child window   │
//! │  (queue, id)     │                     │                 │
//! │                  │ ◄────────────────── │                 │
//! │  Registry        │   MessageBus        │                 │
//! │  (routers)       │   ::dispatch        │                 │
//! └──────────────────┘                     └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | Inbound handler bindings |
//! | `connection` | Per-iframe connection state and send queue |
//! | `registry` | Attached frames and protocol routers |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::protocol::Envelope;

// ============================================================================
// Submodules
// ============================================================================

/// Inbound handler bindings.
pub mod bus;

/// Per-iframe connection state.
pub mod connection;

/// Frame registry and routers.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{MessageBus, MessageHandler, Outcome};
pub use connection::{Connection, Delivery};
pub use registry::{FrameHandler, Registry};

// ============================================================================
// Transport
// ============================================================================

/// Called with the child's reply once a sent message has been handled.
pub type SuccessCallback = Box<dyn FnOnce(Value) + Send>;

/// Delivers envelopes to child windows.
///
/// Delivery is assumed reliable and in order. Inbound traffic is fed back
/// through [`Seamless::dispatch`](crate::Seamless::dispatch). Frames never
/// hold a lock while calling `send`, so an implementation may dispatch
/// synchronously.
pub trait Transport: Send + Sync {
    /// Sends an envelope, invoking `on_success` with the reply if given.
    fn send(&self, envelope: Envelope, on_success: Option<SuccessCallback>);
}
