//! Widget configuration.
//!
//! [`SeamlessOptions`] mirrors the options object an embedding page passes
//! when attaching the widget. It can be built fluently or deserialized from
//! JSON with camelCase keys; missing keys keep their defaults.
//!
//! # Example
//!
//! ```ignore
//! use seamless_frame::SeamlessOptions;
//!
//! let options = SeamlessOptions::new()
//!     .with_styles(["body { background: #fff; }"])
//!     .with_fallback_params("seamless=1")
//!     .with_on_connect(|reply| println!("child connected: {reply}"));
//!
//! let from_page = SeamlessOptions::from_json(r#"{"loading": "Please wait"}"#)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Defaults
// ============================================================================

const DEFAULT_LOADING: &str = "Loading ...";

const DEFAULT_SPINNER: &str = "http://www.travistidwell.com/seamless.js/src/loader.gif";

const DEFAULT_FALLBACK_LINK_TEXT: &str = "Click here";

const DEFAULT_FALLBACK_LINK_AFTER: &str = " to open in a separate window.";

const DEFAULT_FALLBACK_STYLES: &[&str] = &[
    "padding: 15px",
    "border: 1px solid transparent",
    "border-radius: 4px",
    "color: #3a87ad",
    "background-color: #d9edf7",
    "border-color: #bce8f1",
];

const DEFAULT_FALLBACK_LINK_STYLES: &[&str] = &[
    "display: inline-block",
    "color: #333",
    "border: 1px solid #ccc",
    "background-color: #fff",
    "padding: 5px 10px",
    "text-decoration: none",
    "font-size: 12px",
    "line-height: 1.5",
    "border-radius: 6px",
    "font-weight: 400",
    "cursor: pointer",
    "-webkit-user-select: none",
    "-moz-user-select: none",
    "-ms-user-select: none",
    "user-select: none",
];

const DEFAULT_FALLBACK_LINK_HOVER_STYLES: &[&str] =
    &["background-color:#ebebeb", "border-color:#adadad"];

const DEFAULT_FALLBACK_WINDOW_WIDTH: u32 = 960;

const DEFAULT_FALLBACK_WINDOW_HEIGHT: u32 = 800;

// ============================================================================
// OnConnect
// ============================================================================

/// Callback run with the child's reply to `seamless_connect`.
#[derive(Clone)]
pub struct OnConnect(Arc<dyn Fn(Value) + Send + Sync>);

impl OnConnect {
    /// Wraps a callback.
    pub fn new(callback: impl Fn(Value) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Invokes the callback.
    #[inline]
    pub fn call(&self, reply: Value) {
        (self.0)(reply);
    }
}

impl fmt::Debug for OnConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnConnect(..)")
    }
}

// ============================================================================
// SeamlessOptions
// ============================================================================

/// Options for one attached iframe.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeamlessOptions {
    /// Text shown while the child loads.
    pub loading: String,

    /// Spinner image shown next to the loading text.
    pub spinner: String,

    /// Called with the child's reply to the handshake.
    #[serde(skip)]
    pub on_connect: Option<OnConnect>,

    /// CSS rules pushed to the child on connect.
    pub styles: Vec<String>,

    /// Whether to offer the open-in-a-window fallback.
    pub fallback: bool,

    /// Query string appended to the fallback URL.
    pub fallback_params: String,

    /// Message shown under the iframe from the start, if non-empty.
    pub fallback_text: String,

    /// Text of the fallback link.
    pub fallback_link_text: String,

    /// Text after the fallback link.
    pub fallback_link_after: String,

    /// CSS rules for the fallback box.
    pub fallback_styles: Vec<String>,

    /// CSS rules for the fallback link.
    pub fallback_link_styles: Vec<String>,

    /// CSS rules for the hovered fallback link.
    pub fallback_link_hover_styles: Vec<String>,

    /// Popup width in pixels.
    pub fallback_window_width: u32,

    /// Popup height in pixels.
    pub fallback_window_height: u32,
}

impl Default for SeamlessOptions {
    fn default() -> Self {
        Self {
            loading: DEFAULT_LOADING.to_string(),
            spinner: DEFAULT_SPINNER.to_string(),
            on_connect: None,
            styles: Vec::new(),
            fallback: true,
            fallback_params: String::new(),
            fallback_text: String::new(),
            fallback_link_text: DEFAULT_FALLBACK_LINK_TEXT.to_string(),
            fallback_link_after: DEFAULT_FALLBACK_LINK_AFTER.to_string(),
            fallback_styles: to_strings(DEFAULT_FALLBACK_STYLES),
            fallback_link_styles: to_strings(DEFAULT_FALLBACK_LINK_STYLES),
            fallback_link_hover_styles: to_strings(DEFAULT_FALLBACK_LINK_HOVER_STYLES),
            fallback_window_width: DEFAULT_FALLBACK_WINDOW_WIDTH,
            fallback_window_height: DEFAULT_FALLBACK_WINDOW_HEIGHT,
        }
    }
}

fn to_strings(rules: &[&str]) -> Vec<String> {
    rules.iter().map(|rule| (*rule).to_string()).collect()
}

// ============================================================================
// Constructors
// ============================================================================

impl SeamlessOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not a valid options object.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SeamlessOptions {
    /// Sets the loading text.
    #[inline]
    #[must_use]
    pub fn with_loading(mut self, text: impl Into<String>) -> Self {
        self.loading = text.into();
        self
    }

    /// Sets the spinner image URL.
    #[inline]
    #[must_use]
    pub fn with_spinner(mut self, url: impl Into<String>) -> Self {
        self.spinner = url.into();
        self
    }

    /// Sets the handshake callback.
    #[inline]
    #[must_use]
    pub fn with_on_connect(mut self, callback: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_connect = Some(OnConnect::new(callback));
        self
    }

    /// Sets the CSS rules pushed to the child.
    #[inline]
    #[must_use]
    pub fn with_styles(mut self, styles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.styles = styles.into_iter().map(Into::into).collect();
        self
    }

    /// Disables the fallback, its watchdog, and the page error listener.
    #[inline]
    #[must_use]
    pub fn without_fallback(mut self) -> Self {
        self.fallback = false;
        self
    }

    /// Sets the query string appended to the fallback URL.
    #[inline]
    #[must_use]
    pub fn with_fallback_params(mut self, params: impl Into<String>) -> Self {
        self.fallback_params = params.into();
        self
    }

    /// Sets the message shown under the iframe from the start.
    #[inline]
    #[must_use]
    pub fn with_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = text.into();
        self
    }

    /// Sets the fallback link text and the text after it.
    #[inline]
    #[must_use]
    pub fn with_fallback_link(mut self, text: impl Into<String>, after: impl Into<String>) -> Self {
        self.fallback_link_text = text.into();
        self.fallback_link_after = after.into();
        self
    }

    /// Sets the popup window size.
    #[inline]
    #[must_use]
    pub fn with_fallback_window(mut self, width: u32, height: u32) -> Self {
        self.fallback_window_width = width;
        self.fallback_window_height = height;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SeamlessOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the fallback is enabled with a zero-sized
    /// popup or an empty link text.
    pub fn validate(&self) -> Result<()> {
        if !self.fallback {
            return Ok(());
        }

        if self.fallback_window_width == 0 || self.fallback_window_height == 0 {
            return Err(Error::config(
                "Fallback window dimensions must be greater than zero",
            ));
        }

        if self.fallback_link_text.trim().is_empty() {
            return Err(Error::config("Fallback link text must not be empty"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
