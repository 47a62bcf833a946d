//! Typed handler bindings for inbound messages.
//!
//! Handlers are bound per message type and tried in bind order. A handler
//! that returns [`Outcome::Declined`] lets the next one have a go; the first
//! [`Outcome::Handled`] wins and its value is the dispatch result.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::trace;

// ============================================================================
// Types
// ============================================================================

/// Result of offering a message to one handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler took the message; the value is its response.
    Handled(Value),
    /// The message was not for this handler.
    Declined,
}

/// Handler callback type.
pub type MessageHandler = Arc<dyn Fn(&Value) -> Outcome + Send + Sync>;

// ============================================================================
// MessageBus
// ============================================================================

/// Registry of inbound message handlers keyed by message type.
#[derive(Default)]
pub struct MessageBus {
    handlers: RwLock<FxHashMap<String, Vec<MessageHandler>>>,
}

impl MessageBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a handler for a message type.
    pub fn bind<F>(&self, message_type: impl Into<String>, handler: F)
    where
        F: Fn(&Value) -> Outcome + Send + Sync + 'static,
    {
        let message_type = message_type.into();
        trace!(%message_type, "Handler bound");
        self.handlers
            .write()
            .entry(message_type)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Offers a message to the handlers bound for its type.
    ///
    /// Returns the first handled response, or `None` if every handler
    /// declined or none is bound. Handlers run without the bus lock held,
    /// so they may bind or dispatch themselves.
    pub fn dispatch(&self, message_type: &str, data: &Value) -> Option<Value> {
        let handlers = self
            .handlers
            .read()
            .get(message_type)
            .cloned()
            .unwrap_or_default();

        for handler in handlers {
            if let Outcome::Handled(response) = handler(data) {
                return Some(response);
            }
        }

        trace!(message_type, "Message declined by all handlers");
        None
    }

    /// Returns the number of handlers bound for a type.
    #[must_use]
    pub fn handler_count(&self, message_type: &str) -> usize {
        self.handlers
            .read()
            .get(message_type)
            .map_or(0, Vec::len)
    }
}

// ============================================================================
// Tests
// ============================================================================
