//! Seamless coordinator.
//!
//! The [`Seamless`] struct is the single entry point an embedding page
//! holds. It owns the frame registry and the message bus, attaches iframes,
//! and is where the transport delivers inbound messages.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use seamless_frame::{IframeRef, RawMessage, Seamless, SeamlessOptions};
//!
//! # async fn example(transport: Arc<dyn seamless_frame::Transport>, dom: Arc<dyn seamless_frame::Dom>) -> seamless_frame::Result<()> {
//! let seamless = Seamless::new(transport, dom);
//! let frame = seamless.attach(IframeRef::new("content"), SeamlessOptions::default())?;
//!
//! // Called by the transport for every message from a child window
//! seamless.dispatch_json(r#"{"type": "seamless_ready"}"#)?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::IframeRef;
use crate::protocol::{InboundMessage, RawMessage};
use crate::transport::{MessageBus, Registry, Transport};

use super::dom::Dom;
use super::fallback;
use super::frame::SeamlessFrame;
use super::options::SeamlessOptions;

// ============================================================================
// Constants
// ============================================================================

/// How long a frame may stay loading before the fallback is shown.
pub const FALLBACK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

static NOIFRAME_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"noiframe=[^&?#]+").expect("valid noiframe pattern"));

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the coordinator.
pub(crate) struct SeamlessInner {
    transport: Arc<dyn Transport>,
    dom: Arc<dyn Dom>,
    bus: Arc<MessageBus>,
    registry: Registry,
    /// Set once the shared fallback stylesheet has been handed to the DOM.
    styles_installed: AtomicBool,
}

// ============================================================================
// Seamless
// ============================================================================

/// Coordinator for every seamless iframe on a page.
///
/// Create one per page and keep it for the page's lifetime. Cloning is cheap
/// and all clones share the same registry.
#[derive(Clone)]
pub struct Seamless {
    pub(crate) inner: Arc<SeamlessInner>,
}

impl fmt::Debug for Seamless {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seamless")
            .field("frame_count", &self.frame_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Seamless - Public API
// ============================================================================

impl Seamless {
    /// Creates a coordinator over the given collaborators.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, dom: Arc<dyn Dom>) -> Self {
        Self {
            inner: Arc::new(SeamlessInner {
                transport,
                dom,
                bus: Arc::new(MessageBus::new()),
                registry: Registry::new(),
                styles_installed: AtomicBool::new(false),
            }),
        }
    }

    /// Attaches the widget to an iframe.
    ///
    /// Sets up the iframe, shows the loading indicator, and registers the
    /// frame for protocol routing. With the fallback enabled, also installs
    /// the shared fallback stylesheet and arms the 30 second watchdog.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::MissingSource`] if the iframe has no `src`
    /// - [`Error::NoRuntime`] if the fallback is enabled outside a tokio runtime
    pub fn attach(&self, iframe: IframeRef, options: SeamlessOptions) -> Result<SeamlessFrame> {
        options.validate()?;

        let src = self
            .inner
            .dom
            .iframe_src(&iframe)
            .filter(|src| !src.is_empty())
            .ok_or_else(|| Error::missing_source(iframe.clone()))?;

        let runtime = if options.fallback {
            Some(Handle::try_current().map_err(|_| Error::NoRuntime)?)
        } else {
            None
        };

        if options.fallback && !self.inner.styles_installed.swap(true, Ordering::AcqRel) {
            self.inner
                .dom
                .install_fallback_styles(&fallback::stylesheet(&options));
        }

        let frame = SeamlessFrame::new(
            iframe,
            src,
            options,
            Arc::clone(&self.inner.transport),
            Arc::clone(&self.inner.dom),
            Arc::clone(&self.inner.bus),
        );

        if let Some(runtime) = runtime {
            let watched = Arc::downgrade(&frame.inner);
            runtime.spawn(async move {
                tokio::time::sleep(FALLBACK_TIMEOUT).await;
                if let Some(inner) = watched.upgrade() {
                    SeamlessFrame { inner }.on_timeout();
                }
            });
        }

        self.inner.registry.register(frame.handler());
        info!(frame = %frame.uuid(), iframe = %frame.iframe(), "Frame attached");

        Ok(frame)
    }

    /// Dispatches an inbound message from a child window.
    ///
    /// Protocol messages go to the registry routers; everything else is
    /// offered to handlers bound through [`SeamlessFrame::receive`]. Returns
    /// the response value, if any: the (possibly rewritten) update payload for
    /// `seamless_update`, or the first accepting handler's result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a protocol message has a malformed payload.
    pub fn dispatch(&self, message: RawMessage) -> Result<Option<Value>> {
        let message = InboundMessage::parse(message)?;
        debug!(message_type = message.message_type(), "Dispatching");

        let response = match message {
            InboundMessage::Ready(data) => {
                self.inner.registry.route_ready(&data);
                None
            }
            InboundMessage::Update(data) => {
                Some(self.inner.registry.route_update(data).into_value())
            }
            InboundMessage::Error(data) => {
                self.inner.registry.route_error(&data);
                None
            }
            InboundMessage::NoIframe(data) => {
                let href = strip_noiframe(&data.href);
                info!(%href, "Leaving iframe mode");
                self.inner.dom.replace_location(&href);
                None
            }
            InboundMessage::Other(raw) => self.inner.bus.dispatch(&raw.message_type, &raw.data),
        };

        Ok(response)
    }

    /// Parses and dispatches an inbound JSON message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed JSON and [`Error::Protocol`] for
    /// a malformed protocol payload.
    pub fn dispatch_json(&self, text: &str) -> Result<Option<Value>> {
        self.dispatch(RawMessage::from_json(text)?)
    }

    /// Reports a script error on the page.
    ///
    /// Every frame with the fallback enabled shows the generic error message.
    pub fn report_page_error(&self) {
        info!("Page error reported");
        self.inner.registry.route_page_error();
    }

    /// Returns the number of attached frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.inner.registry.len()
    }
}

/// Removes the first `noiframe=...` parameter from a location.
#[must_use]
pub fn strip_noiframe(href: &str) -> String {
    NOIFRAME_PARAM.replace(href, "").into_owned()
}

// ============================================================================
// Tests
// ============================================================================
