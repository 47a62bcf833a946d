//! DOM collaborator interface.
//!
//! The widget never manipulates a document directly. Element lookup,
//! attribute and style changes, insertion of the loading indicator and the
//! fallback box, and top-level navigation all go through [`Dom`].

use crate::identifiers::{IframeRef, WindowRef};

use super::fallback::Fallback;

/// Loading indicator inserted before the iframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingIndicator {
    /// Loading text.
    pub text: String,
    /// Spinner image URL.
    pub spinner: String,
}

/// Document operations the widget relies on.
pub trait Dom: Send + Sync {
    /// Returns the iframe's `src` attribute.
    fn iframe_src(&self, iframe: &IframeRef) -> Option<String>;

    /// Returns the iframe's live content window, if it has one yet.
    fn content_window(&self, iframe: &IframeRef) -> Option<WindowRef>;

    /// Sets attributes on the iframe.
    fn set_attributes(&self, iframe: &IframeRef, attributes: &[(&str, &str)]);

    /// Sets inline CSS properties on the iframe.
    fn set_css(&self, iframe: &IframeRef, properties: &[(&str, &str)]);

    /// Inserts the loading indicator before the iframe.
    fn show_loading(&self, iframe: &IframeRef, indicator: &LoadingIndicator);

    /// Removes the loading indicator.
    fn remove_loading(&self, iframe: &IframeRef);

    /// Sets the visible height and the `height` attribute (`"<n>px"`).
    fn set_height(&self, iframe: &IframeRef, height: f64);

    /// Hides the iframe.
    fn hide(&self, iframe: &IframeRef);

    /// Installs the shared fallback stylesheet. Called once per coordinator.
    fn install_fallback_styles(&self, css: &str);

    /// Renders (or replaces) the fallback box after the iframe.
    fn render_fallback(&self, iframe: &IframeRef, fallback: &Fallback);

    /// Fires a custom event on the iframe, e.g. `connected`.
    fn trigger(&self, iframe: &IframeRef, event: &str);

    /// Navigates the top-level page, replacing the current history entry.
    fn replace_location(&self, href: &str);
}
