//! Boundary entry points: one call, one full pipeline.
//!
//! Each operation sequences acquire → transform → commit over a pair of
//! externally-owned bitmaps and reports any failure together with the
//! stage that produced it. Calls are synchronous and stateless; nothing
//! survives from one call to the next, and neither handle's lock is held
//! across the transform step. This is also the single point where
//! failures hit the diagnostic log before being re-signaled to the
//! caller.

use std::fmt;

use log::{debug, error};
use thiserror::Error;

use crate::bitmap::BitmapHandle;
use crate::bridge;
use crate::error::BridgeError;
use crate::filters::edge::{self, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};
use crate::filters::grayscale;
use crate::pixel::PixelBuffer;

/// Version of the image-processing backend the transforms delegate to.
/// Tracks the pins in Cargo.toml.
pub const BACKEND_VERSION: &str = "imageproc 0.25 / image 0.25";

/// Pipeline stage a request was in when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Transform,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Acquire => "acquire",
            Stage::Transform => "transform",
            Stage::Commit => "commit",
        })
    }
}

/// A failed boundary call: which stage gave up, and why.
///
/// The output bitmap is only ever written by a commit that runs to
/// completion, so a caller receiving this error can rely on the output
/// being untouched.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct BoundaryError {
    pub stage: Stage,
    #[source]
    pub source: BridgeError,
}

impl BoundaryError {
    fn at(stage: Stage) -> impl FnOnce(BridgeError) -> Self {
        move |source| BoundaryError { stage, source }
    }
}

/// Run Canny edge detection from `input` into `output` with the default
/// hysteresis thresholds (50 / 150).
pub fn run_edge_detect(
    input: &dyn BitmapHandle,
    output: &dyn BitmapHandle,
) -> Result<(), BoundaryError> {
    run_edge_detect_with_thresholds(input, output, DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD)
}

/// Run Canny edge detection with explicit hysteresis thresholds.
pub fn run_edge_detect_with_thresholds(
    input: &dyn BitmapHandle,
    output: &dyn BitmapHandle,
    low: f32,
    high: f32,
) -> Result<(), BoundaryError> {
    run_pipeline("edge-detect", input, output, |buffer| {
        edge::edge_detect(buffer, low, high)
    })
}

/// Run grayscale conversion from `input` into `output`.
pub fn run_grayscale(
    input: &dyn BitmapHandle,
    output: &dyn BitmapHandle,
) -> Result<(), BoundaryError> {
    run_pipeline("grayscale", input, output, |buffer| {
        Ok(grayscale::grayscale(buffer))
    })
}

/// Version string of the underlying image-processing library.
pub fn library_version() -> &'static str {
    BACKEND_VERSION
}

fn run_pipeline(
    op: &str,
    input: &dyn BitmapHandle,
    output: &dyn BitmapHandle,
    transform: impl FnOnce(&PixelBuffer) -> Result<PixelBuffer, BridgeError>,
) -> Result<(), BoundaryError> {
    let result = (|| {
        let source = bridge::acquire(input).map_err(BoundaryError::at(Stage::Acquire))?;
        debug!("{op}: acquired {}x{} input", source.width(), source.height());
        let transformed = transform(&source).map_err(BoundaryError::at(Stage::Transform))?;
        bridge::commit(&transformed, output).map_err(BoundaryError::at(Stage::Commit))
    })();

    if let Err(err) = &result {
        error!("{op}: {err}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{BitmapInfo, MemoryBitmap};

    struct UnsupportedBitmap;

    unsafe impl BitmapHandle for UnsupportedBitmap {
        fn info(&self) -> Result<BitmapInfo, BridgeError> {
            Ok(BitmapInfo {
                width: 1,
                height: 1,
                stride: 4,
                format: 7,
            })
        }

        fn lock(&self) -> Result<*mut u8, BridgeError> {
            Err(BridgeError::Acquire("should never be locked".into()))
        }

        fn unlock(&self) {}
    }

    #[test]
    fn test_grayscale_pipeline_end_to_end() {
        let mut input = MemoryBitmap::new(2, 1);
        input.data_mut()[0..8].copy_from_slice(&[255, 0, 0, 255, 0, 0, 0, 255]);
        let output = MemoryBitmap::new(2, 1);

        run_grayscale(&input, &output).unwrap();

        let data = output.data();
        // Red pixel maps to its BT.709 luma, black stays black.
        assert!((data[0] as i32 - 54).abs() <= 1, "got {}", data[0]);
        assert_eq!(data[0], data[1]);
        assert_eq!(data[1], data[2]);
        assert_eq!(data[3], 255);
        assert_eq!(&data[4..8], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_edge_detect_pipeline_uniform_input() {
        let mut input = MemoryBitmap::new(4, 4);
        input.fill([255, 255, 255, 255]);
        let output = MemoryBitmap::new(4, 4);

        run_edge_detect(&input, &output).unwrap();

        for pixel in output.data().chunks_exact(4) {
            assert_eq!(pixel, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_format_failure_attributed_to_acquire() {
        let output = MemoryBitmap::new(1, 1);
        let err = run_grayscale(&UnsupportedBitmap, &output).unwrap_err();
        assert_eq!(err.stage, Stage::Acquire);
        assert!(matches!(err.source, BridgeError::Format(_)));
    }

    #[test]
    fn test_threshold_failure_attributed_to_transform() {
        let input = MemoryBitmap::new(2, 2);
        let output = MemoryBitmap::new(2, 2);
        let err = run_edge_detect_with_thresholds(&input, &output, 150.0, 50.0).unwrap_err();
        assert_eq!(err.stage, Stage::Transform);
    }

    #[test]
    fn test_size_mismatch_attributed_to_commit() {
        let input = MemoryBitmap::new(2, 2);
        let output = MemoryBitmap::new(3, 3);
        let err = run_grayscale(&input, &output).unwrap_err();
        assert_eq!(err.stage, Stage::Commit);
        assert!(
            output.data().iter().all(|&b| b == 0),
            "output must stay untouched"
        );
    }

    #[test]
    fn test_library_version_is_static() {
        assert!(library_version().contains("imageproc"));
    }
}
