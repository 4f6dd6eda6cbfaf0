//! The fixed transforms exposed across the boundary.
//!
//! Both transforms are pure functions from one [`PixelBuffer`] to a new
//! one: no I/O, no external resources, no state. The pixel math itself
//! (luma weighting, Gaussian smoothing, Canny hysteresis) is delegated to
//! the `image` / `imageproc` backend; these modules own only the fixed
//! parameters and the conversion between the strided RGBA buffer and the
//! backend's single-channel representation.
//!
//! Output geometry always equals input geometry, and a zero-sized input
//! (width or height 0) yields a zero-sized output rather than an error.
//!
//! [`PixelBuffer`]: crate::pixel::PixelBuffer

pub mod edge;
pub mod grayscale;
