//! Registry of attached frames and the protocol routers.
//!
//! Inbound protocol messages are not addressed to a frame directly; the
//! routers here decide which registered frames see them.
//!
//! | Router | Message | Delivery |
//! |--------|---------|----------|
//! | [`Registry::route_ready`] | `seamless_ready` | every frame, guarded against reentry |
//! | [`Registry::route_update`] | `seamless_update` | first frame whose id matches `__id` |
//! | [`Registry::route_error`] | `seamless_error` | every frame, unfiltered |
//! | [`Registry::route_page_error`] | page-level error | every frame |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::identifiers::ConnectionId;
use crate::protocol::{ErrorData, UpdateData};

// ============================================================================
// FrameHandler
// ============================================================================

/// Per-frame protocol callbacks invoked by the routers.
pub trait FrameHandler: Send + Sync {
    /// Returns the frame's connection id, if assigned.
    fn connection_id(&self) -> Option<ConnectionId>;

    /// Handles `seamless_ready`.
    fn on_ready(&self, data: &Value);

    /// Handles a `seamless_update` addressed to this frame.
    fn on_update(&self, data: UpdateData) -> UpdateData;

    /// Handles `seamless_error`.
    fn on_error(&self, data: &ErrorData);

    /// Handles a page-level script error.
    fn on_page_error(&self);
}

// ============================================================================
// Registry
// ============================================================================

/// Append-only list of frames in registration order.
#[derive(Default)]
pub struct Registry {
    frames: RwLock<Vec<Arc<dyn FrameHandler>>>,
    connecting: AtomicBool,
}

/// Clears the connecting flag when the ready broadcast ends.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame.
    pub fn register(&self, frame: Arc<dyn FrameHandler>) {
        let mut frames = self.frames.write();
        frames.push(frame);
        debug!(count = frames.len(), "Frame registered");
    }

    /// Returns the number of registered frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    /// Returns `true` if no frame is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }

    /// Returns `true` while a ready broadcast is running.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::Acquire)
    }

    /// Broadcasts `seamless_ready` to every frame in registration order.
    ///
    /// A ready event raised while the broadcast is still running is ignored.
    pub fn route_ready(&self, data: &Value) {
        if self.connecting.swap(true, Ordering::AcqRel) {
            trace!("Nested ready ignored");
            return;
        }
        let _guard = ConnectingGuard(&self.connecting);

        for frame in self.snapshot() {
            frame.on_ready(data);
        }
    }

    /// Delivers `seamless_update` to the first frame whose id matches.
    ///
    /// When no frame matches, the data comes back with `height` forced to 0
    /// and no handler runs.
    pub fn route_update(&self, mut data: UpdateData) -> UpdateData {
        if let Some(id) = data.connection_id()
            && let Some(frame) = self
                .snapshot()
                .into_iter()
                .find(|frame| frame.connection_id().as_ref() == Some(&id))
        {
            return frame.on_update(data);
        }

        debug!(id = %data.id, "Update matched no frame");
        data.height = Some(0.0);
        data
    }

    /// Broadcasts `seamless_error` to every frame in registration order.
    pub fn route_error(&self, data: &ErrorData) {
        for frame in self.snapshot() {
            frame.on_error(data);
        }
    }

    /// Broadcasts a page-level error to every frame in registration order.
    pub fn route_page_error(&self) {
        for frame in self.snapshot() {
            frame.on_page_error();
        }
    }

    /// Copies the frame list so handlers run without the lock held.
    fn snapshot(&self) -> Vec<Arc<dyn FrameHandler>> {
        self.frames.read().clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
