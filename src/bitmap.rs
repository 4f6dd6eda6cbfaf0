//! The external bitmap handle protocol.
//!
//! The bitmaps this crate operates on are owned by the managed host, not
//! by us. The host exposes them through a narrow protocol (query the
//! geometry, lock the pixels to get a raw base address, unlock when
//! done) and [`BitmapHandle`] is that protocol as a trait. The bridge is the
//! only consumer; it borrows a handle for exactly one lock/unlock scope
//! per operation and never holds the raw pointer beyond it.
//!
//! [`MemoryBitmap`] is an in-process implementation backed by owned
//! memory, for hosts that stage pixels on the Rust side and for the test
//! suites.

use std::cell::{Cell, UnsafeCell};

use crate::error::BridgeError;

/// Geometry and format of an external bitmap, as reported by its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapInfo {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, including any host padding. Must cover `width * 4`.
    pub stride: u32,
    /// Raw host format code; see [`PixelFormat::from_raw`].
    ///
    /// [`PixelFormat::from_raw`]: crate::pixel::PixelFormat::from_raw
    pub format: u32,
}

impl BitmapInfo {
    /// Total bytes covered by a successful lock: `stride * height`.
    pub fn locked_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }
}

/// An externally-owned bitmap, reachable only through its owner's
/// get-info / lock / unlock protocol.
///
/// # Safety
///
/// A pointer returned by a successful [`lock`](Self::lock) must stay
/// valid for reads and writes of [`BitmapInfo::locked_len`] bytes until
/// the matching [`unlock`](Self::unlock), with no other user of that
/// memory in between. The bridge dereferences the pointer on the strength
/// of this contract.
pub unsafe trait BitmapHandle {
    /// Query geometry and format. Fails with [`BridgeError::Acquire`]
    /// when the host cannot describe the bitmap.
    fn info(&self) -> Result<BitmapInfo, BridgeError>;

    /// Lock the pixels and return the base address of the buffer.
    ///
    /// Every successful lock is paired with exactly one
    /// [`unlock`](Self::unlock), even when the operation fails later.
    /// A null return is permitted; callers treat it as an acquisition
    /// failure and still release the lock.
    fn lock(&self) -> Result<*mut u8, BridgeError>;

    /// Release a lock obtained from [`lock`](Self::lock).
    fn unlock(&self);
}

/// In-process bitmap backed by owned memory.
///
/// A reference implementation of the handle protocol. Lock state is
/// enforced: a second lock without an intervening unlock fails the way a
/// real host's would.
pub struct MemoryBitmap {
    info: BitmapInfo,
    data: UnsafeCell<Vec<u8>>,
    locked: Cell<bool>,
}

impl MemoryBitmap {
    /// Tightly-packed RGBA_8888 bitmap, zero-filled.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_stride(width, height, width * 4)
    }

    /// RGBA_8888 bitmap whose rows carry `stride - width * 4` padding
    /// bytes, matching hosts that align rows.
    ///
    /// # Panics
    /// Panics if `stride` does not cover one row of pixels.
    pub fn with_stride(width: u32, height: u32, stride: u32) -> Self {
        assert!(stride >= width * 4, "stride must cover one row of pixels");
        let info = BitmapInfo {
            width,
            height,
            stride,
            format: crate::pixel::PixelFormat::Rgba8888.raw(),
        };
        MemoryBitmap {
            info,
            data: UnsafeCell::new(vec![0; info.locked_len()]),
            locked: Cell::new(false),
        }
    }

    /// Set every logical pixel to `rgba`, leaving row padding untouched.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        let info = self.info;
        let data = self.data.get_mut();
        for y in 0..info.height as usize {
            let row = y * info.stride as usize;
            for x in 0..info.width as usize {
                data[row + x * 4..row + x * 4 + 4].copy_from_slice(&rgba);
            }
        }
    }

    /// The backing bytes, padding included.
    ///
    /// # Panics
    /// Panics while the bitmap is locked; the locked memory belongs to
    /// the lock holder.
    pub fn data(&self) -> &[u8] {
        assert!(!self.locked.get(), "bitmap is locked");
        // No lock is outstanding, so nobody holds a pointer into the cell.
        unsafe { &*self.data.get() }
    }

    /// Mutable access to the backing bytes, padding included.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data.get_mut()
    }
}

unsafe impl BitmapHandle for MemoryBitmap {
    fn info(&self) -> Result<BitmapInfo, BridgeError> {
        Ok(self.info)
    }

    fn lock(&self) -> Result<*mut u8, BridgeError> {
        if self.locked.replace(true) {
            return Err(BridgeError::Acquire("bitmap is already locked".into()));
        }
        Ok(unsafe { (*self.data.get()).as_mut_ptr() })
    }

    fn unlock(&self) {
        self.locked.set(false);
    }
}
