//! Grayscale conversion.
//!
//! Luminance comes from the backend's standard RGBA→luma weighting
//! (ITU-R BT.709 coefficients, integer arithmetic), so re-applying the
//! transform to an already-gray buffer reproduces it exactly. The
//! single-channel result is expanded straight back to packed RGBA so it
//! can be committed to the host without a format change.

use image::imageops;
use image::GrayImage;

use crate::pixel::PixelBuffer;

/// Reduce a packed RGBA buffer to its luminance channel.
pub fn luminance(input: &PixelBuffer) -> GrayImage {
    imageops::grayscale(&input.to_rgba_image())
}

/// Expand a single-channel image to packed RGBA: R = G = B = intensity,
/// alpha fully opaque.
pub fn expand_to_rgba(gray: &GrayImage) -> PixelBuffer {
    let (width, height) = gray.dimensions();
    let mut buffer = PixelBuffer::new(width, height);
    let src = gray.as_raw();
    for y in 0..height {
        let gray_row = &src[y as usize * width as usize..][..width as usize];
        for (pixel, &value) in buffer.row_mut(y).chunks_exact_mut(4).zip(gray_row) {
            pixel[0] = value;
            pixel[1] = value;
            pixel[2] = value;
            pixel[3] = 255;
        }
    }
    buffer
}

/// Convert a packed RGBA buffer to grayscale.
///
/// Output dimensions equal input dimensions. R, G and B carry the
/// luminance, alpha is forced opaque. Idempotent: converting an already
/// converted buffer yields the same bytes.
pub fn grayscale(input: &PixelBuffer) -> PixelBuffer {
    expand_to_rgba(&luminance(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let pixel = &pixels[(y * width + x) as usize];
                buffer.row_mut(y)[x as usize * 4..x as usize * 4 + 4].copy_from_slice(pixel);
            }
        }
        buffer
    }

    #[test]
    fn test_white_stays_white() {
        let input = buffer_from_pixels(2, 2, &[[255; 4]; 4]);
        let result = grayscale(&input);
        assert_eq!(result.data(), &[255; 16][..]);
    }

    #[test]
    fn test_pure_red_luma() {
        let input = buffer_from_pixels(1, 1, &[[255, 0, 0, 255]]);
        let result = grayscale(&input);
        // BT.709: 0.2126 * 255 ≈ 54
        let gray = result.row(0)[0];
        assert!((gray as i32 - 54).abs() <= 1, "got {gray}");
        assert_eq!(result.row(0)[0], result.row(0)[1]);
        assert_eq!(result.row(0)[1], result.row(0)[2]);
    }

    #[test]
    fn test_alpha_forced_opaque() {
        let input = buffer_from_pixels(1, 1, &[[10, 20, 30, 100]]);
        let result = grayscale(&input);
        assert_eq!(result.row(0)[3], 255);
    }

    #[test]
    fn test_idempotent() {
        let input = buffer_from_pixels(
            2,
            2,
            &[
                [200, 100, 50, 255],
                [0, 255, 0, 128],
                [17, 93, 241, 7],
                [255, 255, 255, 255],
            ],
        );
        let once = grayscale(&input);
        let twice = grayscale(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_preserves_dimensions() {
        let input = PixelBuffer::new(7, 3);
        let result = grayscale(&input);
        assert_eq!(result.width(), 7);
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_zero_sized_input() {
        let result = grayscale(&PixelBuffer::new(0, 0));
        assert!(result.is_empty());

        let result = grayscale(&PixelBuffer::new(4, 0));
        assert_eq!(result.width(), 4);
        assert_eq!(result.height(), 0);
    }
}
