//! Recording test doubles for the transport and DOM collaborators.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::identifiers::{IframeRef, WindowRef};
use crate::protocol::Envelope;
use crate::transport::{SuccessCallback, Transport};
use crate::widget::{Dom, Fallback, LoadingIndicator};

// ============================================================================
// RecordingTransport
// ============================================================================

/// Transport that records every envelope and holds success callbacks.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<Envelope>>,
    callbacks: Mutex<Vec<SuccessCallback>>,
}

impl RecordingTransport {
    pub(crate) fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().clone()
    }

    /// Runs and clears all pending success callbacks.
    pub(crate) fn complete_all(&self, reply: Value) {
        let callbacks: Vec<_> = self.callbacks.lock().drain(..).collect();
        for callback in callbacks {
            callback(reply.clone());
        }
    }
}

impl Transport for RecordingTransport {
    fn send(&self, envelope: Envelope, on_success: Option<SuccessCallback>) {
        self.sent.lock().push(envelope);
        if let Some(callback) = on_success {
            self.callbacks.lock().push(callback);
        }
    }
}

// ============================================================================
// RecordingDom
// ============================================================================

/// A recorded DOM operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DomOp {
    SetAttributes(IframeRef, Vec<(String, String)>),
    SetCss(IframeRef, Vec<(String, String)>),
    ShowLoading(IframeRef, String),
    RemoveLoading(IframeRef),
    SetHeight(IframeRef, f64),
    Hide(IframeRef),
    InstallFallbackStyles(String),
    RenderFallback(IframeRef, Fallback),
    Trigger(IframeRef, String),
    ReplaceLocation(String),
}

/// DOM that knows a fixed set of iframes and records every operation.
#[derive(Default)]
pub(crate) struct RecordingDom {
    iframes: Mutex<FxHashMap<IframeRef, (String, Option<WindowRef>)>>,
    ops: Mutex<Vec<DomOp>>,
}

impl RecordingDom {
    pub(crate) fn with_iframe(name: &str, src: &str, window: Option<&str>) -> Self {
        let dom = Self::default();
        dom.add_iframe(name, src, window);
        dom
    }

    pub(crate) fn add_iframe(&self, name: &str, src: &str, window: Option<&str>) {
        self.iframes.lock().insert(
            IframeRef::new(name),
            (src.to_string(), window.map(WindowRef::new)),
        );
    }

    pub(crate) fn ops(&self) -> Vec<DomOp> {
        self.ops.lock().clone()
    }

    pub(crate) fn last_fallback(&self) -> Option<Fallback> {
        self.ops.lock().iter().rev().find_map(|op| match op {
            DomOp::RenderFallback(_, fallback) => Some(fallback.clone()),
            _ => None,
        })
    }

    fn record(&self, op: DomOp) {
        self.ops.lock().push(op);
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

impl Dom for RecordingDom {
    fn iframe_src(&self, iframe: &IframeRef) -> Option<String> {
        self.iframes.lock().get(iframe).map(|(src, _)| src.clone())
    }

    fn content_window(&self, iframe: &IframeRef) -> Option<WindowRef> {
        self.iframes
            .lock()
            .get(iframe)
            .and_then(|(_, window)| window.clone())
    }

    fn set_attributes(&self, iframe: &IframeRef, attributes: &[(&str, &str)]) {
        self.record(DomOp::SetAttributes(iframe.clone(), owned(attributes)));
    }

    fn set_css(&self, iframe: &IframeRef, properties: &[(&str, &str)]) {
        self.record(DomOp::SetCss(iframe.clone(), owned(properties)));
    }

    fn show_loading(&self, iframe: &IframeRef, indicator: &LoadingIndicator) {
        self.record(DomOp::ShowLoading(iframe.clone(), indicator.text.clone()));
    }

    fn remove_loading(&self, iframe: &IframeRef) {
        self.record(DomOp::RemoveLoading(iframe.clone()));
    }

    fn set_height(&self, iframe: &IframeRef, height: f64) {
        self.record(DomOp::SetHeight(iframe.clone(), height));
    }

    fn hide(&self, iframe: &IframeRef) {
        self.record(DomOp::Hide(iframe.clone()));
    }

    fn install_fallback_styles(&self, css: &str) {
        self.record(DomOp::InstallFallbackStyles(css.to_string()));
    }

    fn render_fallback(&self, iframe: &IframeRef, fallback: &Fallback) {
        self.record(DomOp::RenderFallback(iframe.clone(), fallback.clone()));
    }

    fn trigger(&self, iframe: &IframeRef, event: &str) {
        self.record(DomOp::Trigger(iframe.clone(), event.to_string()));
    }

    fn replace_location(&self, href: &str) {
        self.record(DomOp::ReplaceLocation(href.to_string()));
    }
}
