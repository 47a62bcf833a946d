//! Error types for seamless-frame.
//!
//! This module defines all error types used throughout the crate.
//!
//! Protocol failures reported by a child page (explicit `seamless_error`,
//! handshake timeout, routing misses) are not errors here: they surface as
//! fallback UI or sentinel results. [`Error`] covers misuse of the API and
//! malformed inbound messages.
//!
//! # Usage
//!
//! ```ignore
//! use seamless_frame::{Result, Seamless, SeamlessOptions};
//!
//! fn embed(seamless: &Seamless, iframe: IframeRef) -> Result<()> {
//!     let frame = seamless.attach(iframe, SeamlessOptions::default())?;
//!     frame.send(serde_json::json!({ "greeting": "hello" }));
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::MissingSource`], [`Error::NoRuntime`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::IframeRef;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when [`SeamlessOptions`](crate::SeamlessOptions) fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// The iframe has no `src` attribute to connect to.
    #[error("Iframe {iframe} has no src attribute")]
    MissingSource {
        /// The iframe that was being attached.
        iframe: IframeRef,
    },

    /// No tokio runtime is available to arm the fallback watchdog.
    #[error("No tokio runtime available for the fallback timer")]
    NoRuntime,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed protocol message.
    ///
    /// Returned when an inbound message does not match its type's payload.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a missing source error.
    #[inline]
    pub fn missing_source(iframe: IframeRef) -> Self {
        Self::MissingSource { iframe }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error comes from widget configuration.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::MissingSource { .. } | Self::NoRuntime
        )
    }

    /// Returns `true` if this error comes from a malformed inbound message.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::Json(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
