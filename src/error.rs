//! Error taxonomy for the bitmap bridge.
//!
//! Everything that can go wrong between "the host handed us a bitmap
//! handle" and "the result is written back" collapses into one of four
//! kinds. Internal code passes these around as ordinary `Result`s; only
//! the outermost boundary layer turns them into host-facing signals.

use thiserror::Error;

/// Failure while moving pixels across the external-ownership boundary
/// or transforming them in between.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bitmap's pixel layout is not the single supported packed
    /// RGBA_8888 format, or its reported geometry is inconsistent with it.
    /// Not retryable; the caller must supply a conforming bitmap.
    #[error("unsupported bitmap layout: {0}")]
    Format(String),

    /// The external pixel lock could not be obtained, or it produced no
    /// usable data. Not retryable within the same call.
    #[error("failed to acquire bitmap pixels: {0}")]
    Acquire(String),

    /// The image-processing backend rejected its input. This signals a
    /// defect (an invariant broken upstream) and is surfaced verbatim.
    #[error("image transform failed: {0}")]
    Transform(String),

    /// Anything not classified above. Always reported, never swallowed.
    #[error("{0}")]
    Unknown(String),
}
