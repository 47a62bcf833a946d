//! A seamless iframe and its handshake state machine.
//!
//! # States
//!
//! ```text
//! Uninitialized ── seamless_ready ──► Connecting ── first seamless_update ──► Active
//!        │                                 │                                   │
//!        └──── seamless_error / timeout / page error ─────────────────────────►┴─► Failed
//! ```
//!
//! `Failed` is terminal: later ready messages do not restart the handshake
//! and later updates neither activate nor resize.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::identifiers::{ConnectionId, IframeRef, WindowRef};
use crate::protocol::{ConnectData, DATA, Envelope, ErrorData, UpdateData};
use crate::transport::{
    Connection, Delivery, FrameHandler, MessageBus, Outcome, SuccessCallback, Transport,
};

use super::dom::{Dom, LoadingIndicator};
use super::fallback::{
    Fallback, FallbackLink, FallbackReason, PAGE_ERROR_MESSAGE, TIMEOUT_MESSAGE,
};
use super::options::SeamlessOptions;

// ============================================================================
// Constants
// ============================================================================

/// Attributes set on every attached iframe.
const IFRAME_ATTRIBUTES: &[(&str, &str)] = &[
    ("scrolling", "no"),
    ("seamless", "seamless"),
    ("width", "100%"),
    ("height", "0px"),
    ("marginheight", "0"),
    ("marginwidth", "0"),
    ("frameborder", "0"),
    ("horizontalscrolling", "no"),
    ("verticalscrolling", "no"),
];

/// Inline CSS set on every attached iframe.
const IFRAME_CSS: &[(&str, &str)] = &[("border", "none"), ("overflow-y", "hidden")];

/// Event fired on the iframe after the handshake is sent.
pub const CONNECTED_EVENT: &str = "connected";

// ============================================================================
// FrameState
// ============================================================================

/// Handshake state of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Attached, waiting for `seamless_ready`.
    Uninitialized,
    /// `seamless_connect` sent, waiting for the first update.
    Connecting,
    /// First update received; sends go straight to the child.
    Active,
    /// Fallback shown; the handshake will not be retried.
    Failed,
}

// ============================================================================
// Types
// ============================================================================

/// Mutable per-frame state.
struct FrameCore {
    connection: Connection,
    state: FrameState,
    loading: bool,
    height: Option<f64>,
}

/// Internal shared state for a frame.
pub(crate) struct FrameInner {
    /// Unique identifier for this widget instance (logging only).
    uuid: Uuid,
    iframe: IframeRef,
    options: SeamlessOptions,
    fallback_link: FallbackLink,
    core: Mutex<FrameCore>,
    transport: Arc<dyn Transport>,
    dom: Arc<dyn Dom>,
    bus: Arc<MessageBus>,
}

// ============================================================================
// SeamlessFrame
// ============================================================================

/// Handle to an attached iframe.
///
/// Created by [`Seamless::attach`](crate::Seamless::attach). Cloning is
/// cheap and all clones share state.
#[derive(Clone)]
pub struct SeamlessFrame {
    pub(crate) inner: Arc<FrameInner>,
}

impl fmt::Debug for SeamlessFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeamlessFrame")
            .field("uuid", &self.inner.uuid)
            .field("iframe", &self.inner.iframe)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SeamlessFrame - Setup
// ============================================================================

impl SeamlessFrame {
    /// Builds the frame and its DOM scaffolding.
    ///
    /// Registration, the shared stylesheet, and the watchdog are the
    /// coordinator's job.
    pub(crate) fn new(
        iframe: IframeRef,
        src: String,
        options: SeamlessOptions,
        transport: Arc<dyn Transport>,
        dom: Arc<dyn Dom>,
        bus: Arc<MessageBus>,
    ) -> Self {
        let window = dom.content_window(&iframe);
        let fallback_link = FallbackLink::new(&src, &options);

        let inner = Arc::new(FrameInner {
            uuid: Uuid::new_v4(),
            iframe,
            options,
            fallback_link,
            core: Mutex::new(FrameCore {
                connection: Connection::new(window, src),
                state: FrameState::Uninitialized,
                loading: true,
                height: None,
            }),
            transport,
            dom,
            bus,
        });

        inner.scaffold();
        Self { inner }
    }

    /// Returns this frame as a router target.
    pub(crate) fn handler(&self) -> Arc<dyn FrameHandler> {
        Arc::clone(&self.inner) as Arc<dyn FrameHandler>
    }

    /// Fails the frame if it is still loading.
    pub(crate) fn on_timeout(&self) {
        self.inner.on_timeout();
    }
}

impl FrameInner {
    /// Sets iframe attributes, inserts the loading indicator, and shows the
    /// configured fallback text.
    fn scaffold(&self) {
        self.dom.set_attributes(&self.iframe, IFRAME_ATTRIBUTES);
        self.dom.set_css(&self.iframe, IFRAME_CSS);
        self.dom.show_loading(
            &self.iframe,
            &LoadingIndicator {
                text: self.options.loading.clone(),
                spinner: self.options.spinner.clone(),
            },
        );

        if self.options.fallback && !self.options.fallback_text.is_empty() {
            self.show_fallback(FallbackReason::Configured, &self.options.fallback_text, false);
        }

        debug!(frame = %self.uuid, iframe = %self.iframe, "Frame scaffolded");
    }
}

// ============================================================================
// SeamlessFrame - Public API
// ============================================================================

impl SeamlessFrame {
    /// Returns the iframe this widget is attached to.
    #[inline]
    #[must_use]
    pub fn iframe(&self) -> &IframeRef {
        &self.inner.iframe
    }

    /// Returns the widget instance id.
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    /// Returns the options the frame was attached with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SeamlessOptions {
        &self.inner.options
    }

    /// Returns the current handshake state.
    #[must_use]
    pub fn state(&self) -> FrameState {
        self.inner.core.lock().state
    }

    /// Returns `true` while the loading indicator is shown.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.core.lock().loading
    }

    /// Returns `true` once the connection is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.core.lock().connection.is_active()
    }

    /// Returns the connection id, once the handshake has assigned one.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.inner.core.lock().connection.id().cloned()
    }

    /// Returns the child window handle, if known.
    #[must_use]
    pub fn target(&self) -> Option<WindowRef> {
        self.inner.core.lock().connection.target().cloned()
    }

    /// Returns the last height applied to the iframe.
    #[must_use]
    pub fn height(&self) -> Option<f64> {
        self.inner.core.lock().height
    }

    /// Returns the number of messages waiting for activation.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.inner.core.lock().connection.queued().len()
    }

    /// Sends a message to the child.
    ///
    /// Accepts a raw payload or a `{type, data}` object. Until the connection
    /// is active the message is queued and delivered, in order, on activation.
    pub fn send(&self, message: impl Into<Envelope>) {
        let delivery = self.inner.core.lock().connection.send(message);
        if let Delivery::Transmit(envelope) = delivery {
            self.inner.transmit(vec![envelope]);
        }
    }

    /// Receives `seamless_data` messages addressed to this connection.
    pub fn receive<F>(&self, callback: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.receive_type(DATA, callback);
    }

    /// Receives messages of the given type addressed to this connection.
    ///
    /// Messages whose `__id` does not match are declined so other handlers
    /// bound for the same type get a chance.
    pub fn receive_type<F>(&self, message_type: impl Into<String>, callback: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let frame = Arc::downgrade(&self.inner);
        self.inner.bus.bind(message_type, move |data| {
            let wire_id = data
                .get(crate::protocol::ID_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default();

            let matches = frame
                .upgrade()
                .is_some_and(|frame| frame.core.lock().connection.matches(wire_id));

            if matches {
                Outcome::Handled(callback(data))
            } else {
                Outcome::Declined
            }
        });
    }
}

// ============================================================================
// FrameInner - Helpers
// ============================================================================

impl FrameInner {
    /// Hands envelopes to the transport. Must be called without the core lock.
    fn transmit(&self, envelopes: Vec<Envelope>) {
        for envelope in envelopes {
            trace!(frame = %self.uuid, message_type = %envelope.message_type, "Transmitting");
            self.transport.send(envelope, None);
        }
    }

    /// Renders a fallback message built from the frame's options.
    fn show_fallback(&self, reason: FallbackReason, message: &str, styled: bool) {
        self.render_fallback(
            reason,
            message,
            &self.options.fallback_link_text,
            &self.options.fallback_link_after,
            styled,
        );
    }

    fn render_fallback(
        &self,
        reason: FallbackReason,
        message: &str,
        link_text: &str,
        after_text: &str,
        styled: bool,
    ) {
        let fallback = Fallback::new(
            reason,
            message,
            link_text,
            after_text,
            self.fallback_link.clone(),
            styled,
        );
        info!(frame = %self.uuid, ?reason, "Showing fallback");
        self.dom.render_fallback(&self.iframe, &fallback);
    }

    /// Watchdog expiry.
    fn on_timeout(&self) {
        {
            let mut core = self.core.lock();
            if !core.loading {
                return;
            }
            core.loading = false;
            core.state = FrameState::Failed;
        }

        warn!(frame = %self.uuid, "Child did not report a height in time");
        self.dom.remove_loading(&self.iframe);
        self.show_fallback(FallbackReason::Timeout, TIMEOUT_MESSAGE, true);
    }
}

// ============================================================================
// FrameInner - Protocol Handlers
// ============================================================================

impl FrameHandler for FrameInner {
    fn connection_id(&self) -> Option<ConnectionId> {
        self.core.lock().connection.id().cloned()
    }

    fn on_ready(&self, _data: &Value) {
        let window = self.dom.content_window(&self.iframe);

        let envelope = {
            let mut core = self.core.lock();
            if core.state == FrameState::Failed {
                debug!(frame = %self.uuid, "Ready ignored after failure");
                return;
            }

            let id = core.connection.ensure_id().clone();
            core.connection.set_target_if_unset(window);
            if core.state == FrameState::Uninitialized {
                core.state = FrameState::Connecting;
            }

            let mut envelope = Envelope::connect(&ConnectData {
                id,
                styles: self.options.styles.clone(),
            });
            envelope.target = core.connection.target().cloned();
            envelope.url = core.connection.url().to_string();
            envelope
        };

        debug!(frame = %self.uuid, target = ?envelope.target, "Sending handshake");

        let on_success = self.options.on_connect.clone().map(|callback| {
            Box::new(move |reply: Value| callback.call(reply)) as SuccessCallback
        });
        self.transport.send(envelope, on_success);
        self.dom.trigger(&self.iframe, CONNECTED_EVENT);
    }

    fn on_update(&self, data: UpdateData) -> UpdateData {
        let resize = data.resize_target();

        let (activated, drained) = {
            let mut core = self.core.lock();
            if core.state == FrameState::Failed {
                debug!(frame = %self.uuid, "Update ignored after failure");
                return data;
            }

            let activation = if core.loading {
                core.loading = false;
                core.state = FrameState::Active;
                (true, core.connection.set_active(true))
            } else {
                (false, Vec::new())
            };

            if resize.is_some() {
                core.height = resize;
            }
            activation
        };

        if activated {
            self.dom.remove_loading(&self.iframe);
            info!(frame = %self.uuid, drained = drained.len(), "Connection active");
            self.transmit(drained);
        }

        if let Some(height) = resize {
            trace!(frame = %self.uuid, height, "Resizing");
            self.dom.set_height(&self.iframe, height);
        }

        data
    }

    fn on_error(&self, data: &ErrorData) {
        let was_loading = {
            let mut core = self.core.lock();
            core.state = FrameState::Failed;
            std::mem::replace(&mut core.loading, false)
        };

        warn!(frame = %self.uuid, msg = %data.msg, "Child reported an error");
        if was_loading {
            self.dom.remove_loading(&self.iframe);
        }
        self.dom.hide(&self.iframe);

        if self.options.fallback {
            self.render_fallback(
                FallbackReason::ChildError,
                &data.msg,
                &data.link_text,
                &data.after_text,
                true,
            );
        }
    }

    fn on_page_error(&self) {
        if !self.options.fallback {
            return;
        }

        self.core.lock().state = FrameState::Failed;
        self.show_fallback(FallbackReason::PageError, PAGE_ERROR_MESSAGE, true);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::testing::{DomOp, RecordingDom, RecordingTransport};

    const SRC: &str = "https://child.example/page";

    fn frame_with(options: SeamlessOptions) -> (SeamlessFrame, Arc<RecordingTransport>, Arc<RecordingDom>) {
        let transport = Arc::new(RecordingTransport::default());
        let dom = Arc::new(RecordingDom::with_iframe("child", SRC, Some("child-window")));
        let frame = SeamlessFrame::new(
            IframeRef::new("child"),
            SRC.to_string(),
            options,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&dom) as Arc<dyn Dom>,
            Arc::new(MessageBus::new()),
        );
        (frame, transport, dom)
    }

    fn connected_frame() -> (SeamlessFrame, Arc<RecordingTransport>, Arc<RecordingDom>, ConnectionId) {
        let (frame, transport, dom) = frame_with(SeamlessOptions::default());
        frame.inner.on_ready(&Value::Null);
        let id = frame.connection_id().expect("id assigned");
        (frame, transport, dom, id)
    }

    #[test]
    fn test_scaffold() {
        let (frame, _transport, dom) = frame_with(SeamlessOptions::default());
        let ops = dom.ops();

        assert!(ops.iter().any(|op| matches!(
            op,
            DomOp::SetAttributes(_, attrs) if attrs.contains(&("height".into(), "0px".into()))
        )));
        assert!(ops.contains(&DomOp::ShowLoading(IframeRef::new("child"), "Loading ...".into())));
        assert_eq!(frame.state(), FrameState::Uninitialized);
        assert!(frame.is_loading());
        assert_eq!(frame.target(), Some(WindowRef::new("child-window")));
    }

    #[test]
    fn test_configured_fallback_text_is_unstyled() {
        let (_frame, _transport, dom) =
            frame_with(SeamlessOptions::new().with_fallback_text("Having trouble?"));

        let fallback = dom.last_fallback().expect("fallback rendered");
        assert_eq!(fallback.reason, FallbackReason::Configured);
        assert!(!fallback.styled);
        assert_eq!(fallback.text(), "Having trouble? Click here to open in a separate window.");
    }

    #[test]
    fn test_ready_sends_handshake() {
        let (frame, transport, dom, id) = connected_frame();

        assert_eq!(frame.state(), FrameState::Connecting);
        assert_eq!(id.as_str().len(), 32);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_type, "seamless_connect");
        assert_eq!(sent[0].data["id"], json!(id.as_str()));
        assert_eq!(sent[0].data["styles"], json!([]));
        assert_eq!(sent[0].target, Some(WindowRef::new("child-window")));
        assert_eq!(sent[0].url, SRC);
        assert!(dom.ops().contains(&DomOp::Trigger(IframeRef::new("child"), "connected".into())));
    }

    #[test]
    fn test_second_ready_keeps_id() {
        let (frame, transport, _dom, id) = connected_frame();
        frame.inner.on_ready(&Value::Null);

        assert_eq!(frame.connection_id(), Some(id));
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn test_on_connect_receives_reply() {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        let (frame, transport, _dom) = frame_with(
            SeamlessOptions::new().with_on_connect(move |reply| sink.lock().push(reply)),
        );

        frame.inner.on_ready(&Value::Null);
        transport.complete_all(json!({"ok": true}));

        assert_eq!(*replies.lock(), vec![json!({"ok": true})]);
    }

    #[test]
    fn test_first_update_activates_and_drains() {
        let (frame, transport, dom, id) = connected_frame();
        frame.send(json!({"n": 1}));
        frame.send(json!({"n": 2}));
        assert_eq!(frame.queued_len(), 2);

        frame.inner.on_update(UpdateData::new(id.as_str(), 300.0));

        assert_eq!(frame.state(), FrameState::Active);
        assert!(frame.is_active());
        assert!(!frame.is_loading());
        assert_eq!(frame.height(), Some(300.0));
        assert_eq!(frame.queued_len(), 0);

        let sent = transport.sent();
        let drained: Vec<_> = sent[1..].iter().map(|e| e.data["n"].clone()).collect();
        assert_eq!(drained, vec![json!(1), json!(2)]);
        assert!(sent[1..].iter().all(|e| e.connection_id() == Some(id.clone())));

        let ops = dom.ops();
        assert!(ops.contains(&DomOp::RemoveLoading(IframeRef::new("child"))));
        assert!(ops.contains(&DomOp::SetHeight(IframeRef::new("child"), 300.0)));
    }

    #[test]
    fn test_send_after_activation_is_direct() {
        let (frame, transport, _dom, id) = connected_frame();
        frame.inner.on_update(UpdateData::new(id.as_str(), 10.0));

        frame.send(json!({"type": "chat", "data": {"text": "hi"}}));

        let last = transport.sent().pop().expect("sent");
        assert_eq!(last.message_type, "chat");
        assert_eq!(frame.queued_len(), 0);
    }

    #[test]
    fn test_height_semantics() {
        let (frame, _transport, dom, id) = connected_frame();

        frame.inner.on_update(UpdateData::new(id.as_str(), 240.0));
        frame.inner.on_update(UpdateData::new(id.as_str(), -1.0));
        assert_eq!(frame.height(), Some(240.0));

        frame.inner.on_update(UpdateData::new(id.as_str(), 0.0));
        assert_eq!(frame.height(), Some(0.0));

        let heights: Vec<f64> = dom
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                DomOp::SetHeight(_, h) => Some(h),
                _ => None,
            })
            .collect();
        assert_eq!(heights, vec![240.0, 0.0]);
    }

    #[test]
    fn test_negative_first_update_still_activates() {
        let (frame, _transport, dom, id) = connected_frame();
        frame.inner.on_update(UpdateData::new(id.as_str(), -1.0));

        assert!(frame.is_active());
        assert_eq!(frame.height(), None);
        assert!(!dom.ops().iter().any(|op| matches!(op, DomOp::SetHeight(..))));
    }

    #[test]
    fn test_error_hides_and_renders_fallback() {
        let (frame, _transport, dom, id) = connected_frame();
        frame.inner.on_error(&ErrorData {
            id: id.to_string(),
            msg: "X".into(),
            link_text: "<Y>".into(),
            after_text: "Z".into(),
        });

        assert_eq!(frame.state(), FrameState::Failed);
        assert!(!frame.is_loading());
        let ops = dom.ops();
        assert!(ops.contains(&DomOp::Hide(IframeRef::new("child"))));
        assert!(ops.contains(&DomOp::RemoveLoading(IframeRef::new("child"))));

        let fallback = dom.last_fallback().expect("fallback rendered");
        assert_eq!(fallback.text(), "X YZ");
        assert!(fallback.styled);
        assert_eq!(fallback.link.href, SRC);
    }

    #[test]
    fn test_error_without_fallback_renders_nothing() {
        let (frame, _transport, dom) = frame_with(SeamlessOptions::new().without_fallback());
        frame.inner.on_error(&ErrorData::default());

        assert!(dom.ops().contains(&DomOp::Hide(IframeRef::new("child"))));
        assert!(dom.last_fallback().is_none());
    }

    #[test]
    fn test_failed_is_terminal() {
        let (frame, transport, dom, id) = connected_frame();
        frame.inner.on_error(&ErrorData::default());

        frame.inner.on_ready(&Value::Null);
        let echoed = frame.inner.on_update(UpdateData::new(id.as_str(), 50.0));

        assert_eq!(echoed.height, Some(50.0));
        assert_eq!(frame.state(), FrameState::Failed);
        assert!(!frame.is_active());
        assert_eq!(transport.sent().len(), 1);
        assert!(!dom.ops().iter().any(|op| matches!(op, DomOp::SetHeight(..))));
    }

    #[test]
    fn test_timeout_while_loading() {
        let (frame, _transport, dom) = frame_with(SeamlessOptions::default());
        frame.on_timeout();

        assert_eq!(frame.state(), FrameState::Failed);
        assert!(!frame.is_loading());
        let fallback = dom.last_fallback().expect("fallback rendered");
        assert_eq!(fallback.reason, FallbackReason::Timeout);
        assert_eq!(fallback.message, format!("{TIMEOUT_MESSAGE} "));
    }

    #[test]
    fn test_timeout_after_activation_is_noop() {
        let (frame, _transport, dom, id) = connected_frame();
        frame.inner.on_update(UpdateData::new(id.as_str(), 10.0));
        frame.on_timeout();

        assert_eq!(frame.state(), FrameState::Active);
        assert!(dom.last_fallback().is_none());
    }

    #[test]
    fn test_page_error() {
        let (frame, _transport, dom) = frame_with(SeamlessOptions::default());
        frame.inner.on_page_error();

        assert_eq!(frame.state(), FrameState::Failed);
        assert!(frame.is_loading());
        let fallback = dom.last_fallback().expect("fallback rendered");
        assert_eq!(fallback.reason, FallbackReason::PageError);
        assert!(fallback.styled);
    }

    #[test]
    fn test_receive_filters_by_id() {
        let (frame, _transport, _dom, id) = connected_frame();
        frame.receive(|data| json!({"got": data["text"]}));

        let bus = Arc::clone(&frame.inner.bus);
        assert_eq!(
            bus.dispatch(DATA, &json!({"__id": id.as_str(), "text": "hi"})),
            Some(json!({"got": "hi"}))
        );
        assert_eq!(bus.dispatch(DATA, &json!({"__id": "other", "text": "hi"})), None);
        assert_eq!(bus.dispatch(DATA, &json!({"text": "hi"})), None);
    }

    #[test]
    fn test_receive_before_handshake_declines() {
        let (frame, _transport, _dom) = frame_with(SeamlessOptions::default());
        frame.receive_type("chat", |_| Value::Null);

        assert_eq!(frame.inner.bus.dispatch("chat", &json!({"__id": ""})), None);
        assert_eq!(frame.inner.bus.dispatch("chat", &json!({"__id": 0})), None);
    }
}
