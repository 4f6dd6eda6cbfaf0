//! Dense in-memory pixel buffer with explicit geometry.
//!
//! [`PixelBuffer`] is the processing-side representation of one bitmap:
//! an owned, contiguous byte buffer plus the width / height / stride /
//! format metadata needed to interpret it. The bridge copies external
//! pixels into it on acquire, the filters consume and produce it, and the
//! bridge writes it back out on commit.
//!
//! The only supported pixel layout is packed 4-byte RGBA (`RGBA_8888`):
//! red, green, blue, alpha, one byte each, no padding between channels.
//! Rows may carry trailing padding, expressed as a stride larger than
//! `width * 4`.

use image::RgbaImage;

/// Pixel layout of a buffer.
///
/// A single variant today; the raw-code mapping exists because external
/// bitmaps report their format as an integer code that has to be
/// validated before any pixels are touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGBA, 4 bytes per pixel.
    Rgba8888,
}

impl PixelFormat {
    /// Map a host format code to a supported format.
    ///
    /// Returns `None` for any code this crate cannot process.
    pub const fn from_raw(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Rgba8888),
            _ => None,
        }
    }

    /// The host-side integer code for this format.
    pub const fn raw(self) -> u32 {
        match self {
            Self::Rgba8888 => 1,
        }
    }

    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 => 4,
        }
    }
}

/// An owned, strided, fixed-format image buffer.
///
/// Invariants, upheld by every constructor:
/// - `stride >= width * 4`
/// - `data.len() == stride * height`
/// - the format never changes after construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed, tightly-packed RGBA buffer (`stride == width * 4`).
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width * 4;
        PixelBuffer {
            width,
            height,
            stride,
            format: PixelFormat::Rgba8888,
            data: vec![0; stride as usize * height as usize],
        }
    }

    /// Take ownership of a tightly-packed [`RgbaImage`] without copying.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        PixelBuffer {
            width,
            height,
            stride: width * 4,
            format: PixelFormat::Rgba8888,
            data: image.into_raw(),
        }
    }

    /// Copy the logical pixels (padding stripped) into an [`RgbaImage`].
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut packed = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        RgbaImage::from_raw(self.width, self.height, packed)
            .expect("packed pixel data matches buffer dimensions")
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes from the start of one row to the start of the next.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// True when the buffer holds no pixels (zero width or height).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Length in bytes of one logical row: `width * 4`, excluding padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// The logical pixels of row `y`, without trailing padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        &self.data[start..start + self.row_bytes()]
    }

    /// Mutable view of row `y`, without trailing padding.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride as usize;
        let row_bytes = self.row_bytes();
        &mut self.data[start..start + row_bytes]
    }

    /// The full backing buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the full backing buffer, padding included.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
