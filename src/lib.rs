//! pixelbridge
//!
//! A thin native core that runs fixed image transforms (Canny edge
//! detection and grayscale conversion) on bitmaps owned by a managed
//! host, reached across a foreign-function boundary.
//!
//! The transforms themselves are the `image` / `imageproc` crates' stock
//! algorithms; what this crate owns is the marshaling discipline around
//! them. Host bitmaps are only reachable through a get-info / lock /
//! unlock protocol ([`bitmap::BitmapHandle`]), and every operation is one
//! pass of:
//!
//! ```text
//! external handle → bridge::acquire → PixelBuffer
//!     → filters::{edge, grayscale} → PixelBuffer
//!     → bridge::commit → external handle
//! ```
//!
//! The bridge copies pixels into a tightly-packed [`pixel::PixelBuffer`],
//! reconciling the host's row stride with the packed layout, and
//! guarantees the host's pixel lock is released on every path, success
//! and failure alike. Failures are typed ([`error::BridgeError`]), attributed to
//! the pipeline stage that produced them ([`boundary::BoundaryError`]),
//! and surfaced to C callers as status codes plus a retrievable message.
//!
//! ## Pixel Format
//!
//! The single supported layout is packed 8-bit RGBA (`RGBA_8888`, host
//! format code 1): 4 bytes per pixel, rows optionally padded to the
//! host's stride. Bitmaps in any other format are rejected before their
//! pixels are touched.
//!
//! ## Calling Surfaces
//!
//! - Rust hosts call [`boundary::run_edge_detect`] /
//!   [`boundary::run_grayscale`] with any [`bitmap::BitmapHandle`]
//!   implementation.
//! - Managed hosts link the `cdylib` and use the C entry points in
//!   [`capi`] (feature `capi`, enabled by default), passing opaque
//!   bitmap pointers plus a callback table implementing the lock
//!   protocol.
//!
//! Diagnostics go through the `log` facade; the crate never installs a
//! logger.

pub mod bitmap;
pub mod boundary;
pub mod bridge;
pub mod error;
pub mod filters;
pub mod pixel;

#[cfg(feature = "capi")]
pub mod capi;

pub use bitmap::{BitmapHandle, BitmapInfo, MemoryBitmap};
pub use boundary::{
    library_version, run_edge_detect, run_edge_detect_with_thresholds, run_grayscale,
    BoundaryError, Stage,
};
pub use error::BridgeError;
pub use pixel::{PixelBuffer, PixelFormat};
