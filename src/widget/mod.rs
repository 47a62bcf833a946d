//! Seamless iframe widget.
//!
//! # Architecture
//!
//! ```text
//! Seamless (coordinator)
//! ├── Registry ── routes ready / update / error to frames
//! ├── MessageBus ── custom message handlers
//! └── SeamlessFrame (one per iframe)
//!     ├── Connection ── id, target, send queue
//!     └── Dom ── loading indicator, height, fallback
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Seamless`] coordinator and inbound dispatch |
//! | `dom` | [`Dom`] collaborator trait |
//! | `fallback` | Fallback messages, links, and stylesheet |
//! | `frame` | [`SeamlessFrame`] handle and lifecycle |
//! | `options` | [`SeamlessOptions`] configuration |

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod dom;
mod fallback;
mod frame;
mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{FALLBACK_TIMEOUT, Seamless, strip_noiframe};
pub use dom::{Dom, LoadingIndicator};
pub use fallback::{
    Fallback, FallbackLink, FallbackReason, PAGE_ERROR_MESSAGE, TIMEOUT_MESSAGE, filter_text,
};
pub use frame::{CONNECTED_EVENT, FrameState, SeamlessFrame};
pub use options::{OnConnect, SeamlessOptions};
