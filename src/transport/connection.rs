//! Per-iframe connection state.
//!
//! A [`Connection`] pairs a child window with its URL, the id assigned during
//! the handshake, an activation flag, and a queue of messages sent before the
//! child was ready to receive them.
//!
//! The connection never touches the transport itself. [`Connection::send`]
//! and [`Connection::set_active`] return the envelopes that are due, and the
//! owner transmits them after releasing its lock.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

use crate::identifiers::{ConnectionId, WindowRef};
use crate::protocol::Envelope;

// ============================================================================
// Delivery
// ============================================================================

/// What [`Connection::send`] did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The connection is active and addressed: transmit this envelope now.
    Transmit(Envelope),
    /// The message was appended to the queue.
    Queued,
}

// ============================================================================
// Connection
// ============================================================================

/// One logical channel between the parent and a specific child frame.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Assigned once, on the first `seamless_ready`.
    id: Option<ConnectionId>,
    /// Child window; may be unknown until the iframe has loaded.
    target: Option<WindowRef>,
    /// Child URL.
    url: String,
    /// Whether sends bypass the queue.
    active: bool,
    /// Pending envelopes in insertion order.
    queue: Vec<Envelope>,
}

impl Connection {
    /// Creates an inactive connection with no id.
    #[must_use]
    pub fn new(target: Option<WindowRef>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            target,
            url: url.into(),
            active: false,
            queue: Vec::new(),
        }
    }

    /// Returns the connection id, if the handshake has assigned one.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&ConnectionId> {
        self.id.as_ref()
    }

    /// Returns the id, generating it on first use.
    pub fn ensure_id(&mut self) -> &ConnectionId {
        self.id.get_or_insert_with(ConnectionId::generate)
    }

    /// Returns the child window handle.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&WindowRef> {
        self.target.as_ref()
    }

    /// Sets the child window handle unless one is already known.
    pub fn set_target_if_unset(&mut self, target: Option<WindowRef>) {
        if self.target.is_none() {
            self.target = target;
        }
    }

    /// Returns the child URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` once the connection has been activated.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the messages waiting for activation.
    #[inline]
    #[must_use]
    pub fn queued(&self) -> &[Envelope] {
        &self.queue
    }

    /// Returns `true` if a wire id refers to this connection.
    ///
    /// An empty wire id never matches, and neither does anything before the
    /// handshake has assigned an id.
    #[must_use]
    pub fn matches(&self, wire_id: &str) -> bool {
        !wire_id.is_empty() && self.id.as_ref().is_some_and(|id| id.as_str() == wire_id)
    }

    /// Normalizes and addresses a message, then queues or releases it.
    ///
    /// Accepts a raw payload or a partial `{type, data}` envelope. Messages
    /// are released only while the connection is active and its target is
    /// known; otherwise they wait in the queue.
    pub fn send(&mut self, message: impl Into<Envelope>) -> Delivery {
        let mut envelope = message.into();
        envelope.stamp(self.target.as_ref(), &self.url, self.id.as_ref());

        if self.active && self.target.is_some() {
            Delivery::Transmit(envelope)
        } else {
            trace!(
                message_type = %envelope.message_type,
                queued = self.queue.len() + 1,
                "Message queued"
            );
            self.queue.push(envelope);
            Delivery::Queued
        }
    }

    /// Sets the activation flag.
    ///
    /// Activating drains the queue in insertion order and returns the
    /// envelopes to transmit, re-addressed with the current target and id.
    /// Entries that still cannot be delivered (no target yet) stay queued.
    /// Deactivating only clears the flag.
    pub fn set_active(&mut self, active: bool) -> Vec<Envelope> {
        self.active = active;

        if !active || self.queue.is_empty() {
            return Vec::new();
        }

        std::mem::take(&mut self.queue)
            .into_iter()
            .filter_map(|envelope| match self.send(envelope) {
                Delivery::Transmit(envelope) => Some(envelope),
                Delivery::Queued => None,
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    fn connection() -> Connection {
        Connection::new(
            Some(WindowRef::new("child")),
            "https://child.example/page",
        )
    }

    #[test]
    fn test_new_connection_is_inactive() {
        let conn = connection();
        assert!(!conn.is_active());
        assert!(conn.id().is_none());
        assert!(conn.queued().is_empty());
    }

    #[test]
    fn test_send_while_inactive_queues() {
        let mut conn = connection();
        assert_eq!(conn.send(json!({"n": 1})), Delivery::Queued);
        assert_eq!(conn.queued().len(), 1);
    }

    #[test]
    fn test_send_while_active_transmits() {
        let mut conn = connection();
        let id = conn.ensure_id().clone();
        assert!(conn.set_active(true).is_empty());

        let Delivery::Transmit(envelope) = conn.send(json!({"n": 1})) else {
            panic!("expected transmit");
        };
        assert_eq!(envelope.connection_id(), Some(id));
        assert_eq!(envelope.url, "https://child.example/page");
        assert!(conn.queued().is_empty());
    }

    #[test]
    fn test_active_without_target_queues() {
        let mut conn = Connection::new(None, "/child");
        conn.set_active(true);
        assert_eq!(conn.send(json!({})), Delivery::Queued);
    }

    #[test]
    fn test_drain_stamps_assigned_id() {
        let mut conn = connection();
        conn.send(json!({"n": 1}));
        let id = conn.ensure_id().clone();

        let drained = conn.set_active(true);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].connection_id(), Some(id));
        assert!(conn.queued().is_empty());
    }

    #[test]
    fn test_drain_keeps_undeliverable_messages() {
        let mut conn = Connection::new(None, "/child");
        conn.send(json!({"n": 1}));
        conn.send(json!({"n": 2}));

        assert!(conn.set_active(true).is_empty());
        assert_eq!(conn.queued().len(), 2);

        conn.set_target_if_unset(Some(WindowRef::new("late")));
        let drained = conn.set_active(true);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].target, Some(WindowRef::new("late")));
    }

    #[test]
    fn test_deactivate_has_no_side_effect() {
        let mut conn = connection();
        conn.send(json!({"n": 1}));
        assert!(conn.set_active(false).is_empty());
        assert_eq!(conn.queued().len(), 1);
        assert_eq!(conn.send(json!({"n": 2})), Delivery::Queued);
        assert_eq!(conn.queued().len(), 2);
    }

    #[test]
    fn test_id_is_assigned_once() {
        let mut conn = connection();
        let first = conn.ensure_id().clone();
        let second = conn.ensure_id().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_target_is_set_once() {
        let mut conn = connection();
        conn.set_target_if_unset(Some(WindowRef::new("other")));
        assert_eq!(conn.target(), Some(&WindowRef::new("child")));
    }

    #[test]
    fn test_matches() {
        let mut conn = connection();
        assert!(!conn.matches(""));
        assert!(!conn.matches("anything"));

        let id = conn.ensure_id().clone();
        assert!(conn.matches(id.as_str()));
        assert!(!conn.matches(""));
        assert!(!conn.matches("other"));
    }

    proptest! {
        #[test]
        fn prop_drain_preserves_insertion_order(values in proptest::collection::vec(any::<i64>(), 0..32)) {
            let mut conn = connection();
            for value in &values {
                prop_assert_eq!(conn.send(json!({ "n": value })), Delivery::Queued);
            }
            conn.ensure_id();

            let drained: Vec<i64> = conn
                .set_active(true)
                .iter()
                .filter_map(|envelope| envelope.data["n"].as_i64())
                .collect();

            prop_assert_eq!(drained, values);
            prop_assert!(conn.queued().is_empty());
        }
    }
}
