//! Canny edge detection.
//!
//! The detector is the backend's hysteresis implementation: pixels whose
//! gradient magnitude exceeds the high threshold are edges, pixels
//! between the two thresholds are edges only when connected to a strong
//! one, everything below the low threshold is suppressed. Input is
//! reduced to luminance and smoothed with a Gaussian before the gradient
//! pass so quantization noise does not read as spurious edges; the binary
//! edge map is expanded back to packed RGBA for the trip home through the
//! bridge.

use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

use super::grayscale::{expand_to_rgba, luminance};
use crate::error::BridgeError;
use crate::pixel::PixelBuffer;

/// Default lower hysteresis threshold.
pub const DEFAULT_LOW_THRESHOLD: f32 = 50.0;

/// Default upper hysteresis threshold.
pub const DEFAULT_HIGH_THRESHOLD: f32 = 150.0;

/// Gaussian sigma applied ahead of the gradient pass.
const SMOOTHING_SIGMA: f32 = 1.5;

/// Detect edges in a packed RGBA buffer.
///
/// The result has identical dimensions: edge pixels are white, all other
/// pixels black, alpha fully opaque. Thresholds are handed to the
/// detector as given, without clamping; the one precondition the backend
/// enforces (`low <= high`) is reported as a transform failure instead
/// of a crash.
pub fn edge_detect(
    input: &PixelBuffer,
    low: f32,
    high: f32,
) -> Result<PixelBuffer, BridgeError> {
    if !(low <= high) {
        return Err(BridgeError::Transform(format!(
            "hysteresis thresholds out of order: low {low}, high {high}"
        )));
    }
    if input.is_empty() {
        return Ok(PixelBuffer::new(input.width(), input.height()));
    }

    let gray = luminance(input);
    let smoothed = gaussian_blur_f32(&gray, SMOOTHING_SIGMA);
    let edges = canny(&smoothed, low, high);
    Ok(expand_to_rgba(&edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_image_has_no_edges() {
        let mut input = PixelBuffer::new(4, 4);
        input.data_mut().fill(255);

        let result = edge_detect(&input, DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD).unwrap();
        assert_eq!(result.width(), 4);
        assert_eq!(result.height(), 4);
        for y in 0..4 {
            for pixel in result.row(y).chunks_exact(4) {
                assert_eq!(pixel, &[0, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn test_step_edge_is_detected() {
        // Left half black, right half white: a clean vertical step.
        let mut input = PixelBuffer::new(32, 32);
        for y in 0..32 {
            for x in 16..32 {
                input.row_mut(y)[x * 4..x * 4 + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }

        let result = edge_detect(&input, DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD).unwrap();
        let edge_pixels: usize = (0..32)
            .flat_map(|y| result.row(y).chunks_exact(4))
            .filter(|pixel| pixel[0] == 255)
            .count();
        assert!(edge_pixels > 0, "step edge went undetected");

        // Output is a binary map with opaque alpha.
        for y in 0..32 {
            for pixel in result.row(y).chunks_exact(4) {
                assert!(pixel[0] == 0 || pixel[0] == 255);
                assert_eq!(pixel[0], pixel[1]);
                assert_eq!(pixel[1], pixel[2]);
                assert_eq!(pixel[3], 255);
            }
        }
    }

    #[test]
    fn test_preserves_dimensions() {
        let input = PixelBuffer::new(9, 5);
        let result = edge_detect(&input, DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD).unwrap();
        assert_eq!(result.width(), 9);
        assert_eq!(result.height(), 5);
    }

    #[test]
    fn test_zero_sized_input() {
        let result = edge_detect(
            &PixelBuffer::new(0, 3),
            DEFAULT_LOW_THRESHOLD,
            DEFAULT_HIGH_THRESHOLD,
        )
        .unwrap();
        assert_eq!(result.width(), 0);
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_reversed_thresholds_rejected() {
        let input = PixelBuffer::new(4, 4);
        let err = edge_detect(&input, 150.0, 50.0).unwrap_err();
        assert!(matches!(err, BridgeError::Transform(_)), "got {err:?}");
    }
}
