//! Fallback content shown when the iframe cannot be used.
//!
//! The fallback is a short message followed by a link that opens the child
//! page in a separate window. Everything here is plain data; the [`Dom`]
//! decides how to render it.
//!
//! [`Dom`]: super::Dom

// ============================================================================
// Imports
// ============================================================================

use super::options::SeamlessOptions;

// ============================================================================
// Messages
// ============================================================================

/// Shown when the child never reported a height.
pub const TIMEOUT_MESSAGE: &str = "An error has been detected on this page.";

/// Shown when a script error is reported on the page.
pub const PAGE_ERROR_MESSAGE: &str = "An error has been detected on this page, \
     which may cause problems with the operation of this application.";

// ============================================================================
// Text Filtering
// ============================================================================

/// Strips `<` and `>` so text cannot open markup or escape a style tag.
#[must_use]
pub fn filter_text(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

// ============================================================================
// FallbackReason
// ============================================================================

/// Why a fallback message is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Configured `fallbackText`, shown from the start.
    Configured,
    /// The child sent `seamless_error`.
    ChildError,
    /// The child did not report a height in time.
    Timeout,
    /// A script error was reported on the page.
    PageError,
}

// ============================================================================
// FallbackLink
// ============================================================================

/// Target of the open-in-a-window link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLink {
    /// URL opened in the popup.
    pub href: String,
    /// Popup width in pixels.
    pub window_width: u32,
    /// Popup height in pixels.
    pub window_height: u32,
}

impl FallbackLink {
    /// Builds the link for an iframe source.
    ///
    /// `fallbackParams` is appended with `?` or `&` depending on whether the
    /// source already carries a query string.
    #[must_use]
    pub fn new(src: &str, options: &SeamlessOptions) -> Self {
        let mut href = src.to_string();
        if !options.fallback_params.is_empty() {
            href.push(if src.contains('?') { '&' } else { '?' });
            href.push_str(&options.fallback_params);
        }

        Self {
            href,
            window_width: options.fallback_window_width,
            window_height: options.fallback_window_height,
        }
    }
}

// ============================================================================
// Fallback
// ============================================================================

/// A fallback message ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    /// Why the fallback is shown.
    pub reason: FallbackReason,
    /// Markup-stripped message, followed by a space.
    pub message: String,
    /// Markup-stripped link text.
    pub link_text: String,
    /// Markup-stripped text after the link.
    pub after_text: String,
    /// Link target.
    pub link: FallbackLink,
    /// Whether the `seamless-styles` visual treatment applies.
    pub styled: bool,
}

impl Fallback {
    /// Creates a fallback, filtering all text.
    #[must_use]
    pub fn new(
        reason: FallbackReason,
        message: &str,
        link_text: &str,
        after_text: &str,
        link: FallbackLink,
        styled: bool,
    ) -> Self {
        Self {
            reason,
            message: format!("{} ", filter_text(message)),
            link_text: filter_text(link_text),
            after_text: filter_text(after_text),
            link,
            styled,
        }
    }

    /// Returns the visible text: message, link text, then the trailing text.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}{}{}", self.message, self.link_text, self.after_text)
    }
}

// ============================================================================
// Stylesheet
// ============================================================================

/// Builds the shared stylesheet for fallback boxes and links.
#[must_use]
pub fn stylesheet(options: &SeamlessOptions) -> String {
    let rules = |styles: &[String]| filter_text(&styles.join(";"));

    format!(
        ".seamless-fallback.seamless-styles {{{}}}\
         .seamless-fallback em {{ padding: 5px; }}\
         .seamless-fallback-link.seamless-styles {{{}}}\
         .seamless-fallback-link.seamless-styles:hover {{{}}}",
        rules(&options.fallback_styles),
        rules(&options.fallback_link_styles),
        rules(&options.fallback_link_hover_styles),
    )
}

// ============================================================================
// Tests
// ============================================================================
