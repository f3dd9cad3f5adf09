//! Typed errors for the engine's few fallible boundaries.
//!
//! Parse-time anomalies and programmer errors are deliberately *not*
//! represented here: malformed VT sequences recover silently (see
//! [`crate::parser`]) and broken invariants panic in debug builds. This type
//! only covers allocation, IO-adjacent, and rasterization boundaries.

use thiserror::Error;

/// A recoverable failure at one of the engine's external boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A page or scrollback line could not be allocated.
    #[error("out of memory: {0}")]
    OutOfMemory(&'static str),

    /// An OSC 52 clipboard read or write was refused by the host's permission
    /// callback.
    #[error("clipboard access denied")]
    ClipboardDenied,

    /// The sprite rasterizer or glyph atlas could not produce pixels for a
    /// requested glyph; callers fall back to a blank advance-only glyph.
    #[error("rasterization failed: {0}")]
    RasterizationFailed(&'static str),
}
