//! Pixel transfer across the external-ownership boundary.
//!
//! [`acquire`] copies a locked external bitmap into an owned
//! [`PixelBuffer`]; [`commit`] writes one back. Both directions share the
//! same discipline:
//!
//! - the format and geometry are validated before the lock is taken, so
//!   a rejected bitmap is never locked and never copied;
//! - the lock is held only for the duration of one copy and is released
//!   on every exit path via the [`PixelLock`] guard;
//! - when the external stride matches the buffer's, the transfer is one
//!   bulk copy; otherwise rows are copied one at a time at exactly
//!   `width * 4` bytes, the row width both sides agree on, so neither
//!   side's padding is ever read or written past.

use std::slice;

use crate::bitmap::{BitmapHandle, BitmapInfo};
use crate::error::BridgeError;
use crate::pixel::{PixelBuffer, PixelFormat};

/// Scoped view of a locked bitmap's memory. Unlocks on drop.
pub struct PixelLock<'a> {
    handle: &'a dyn BitmapHandle,
    ptr: *mut u8,
    len: usize,
}

impl<'a> PixelLock<'a> {
    /// Lock `handle`, taking on the obligation to unlock it.
    ///
    /// A lock that reports success but yields a null pointer counts as an
    /// acquisition failure; the unlock still runs because the guard is
    /// constructed before the check.
    pub fn acquire(handle: &'a dyn BitmapHandle, len: usize) -> Result<Self, BridgeError> {
        let ptr = handle.lock()?;
        let lock = PixelLock { handle, ptr, len };
        if ptr.is_null() && len > 0 {
            return Err(BridgeError::Acquire("lock returned no pixel data".into()));
        }
        Ok(lock)
    }

    /// The locked bytes: `stride * height` of them.
    pub fn bytes(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        // Non-null (checked in acquire) and valid for `len` bytes until
        // unlock, per the BitmapHandle safety contract.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Mutable view of the locked bytes.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        if self.len == 0 {
            return &mut [];
        }
        unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for PixelLock<'_> {
    fn drop(&mut self) {
        self.handle.unlock();
    }
}

/// Validate the reported format and geometry before any pixels move.
fn checked_format(info: &BitmapInfo) -> Result<PixelFormat, BridgeError> {
    let format = PixelFormat::from_raw(info.format).ok_or_else(|| {
        BridgeError::Format(format!(
            "format code {} is not packed RGBA_8888",
            info.format
        ))
    })?;
    if (info.stride as usize) < info.width as usize * format.bytes_per_pixel() {
        return Err(BridgeError::Format(format!(
            "stride {} does not cover a row of {} pixels",
            info.stride, info.width
        )));
    }
    Ok(format)
}

/// Copy an external bitmap into a new tightly-packed [`PixelBuffer`].
///
/// The handle must currently be unlocked. On success the buffer holds
/// every logical pixel of the bitmap with row padding stripped
/// (`stride == width * 4`).
pub fn acquire(handle: &dyn BitmapHandle) -> Result<PixelBuffer, BridgeError> {
    let info = handle.info()?;
    checked_format(&info)?;

    let lock = PixelLock::acquire(handle, info.locked_len())?;
    let src = lock.bytes();

    let mut buffer = PixelBuffer::new(info.width, info.height);
    if info.stride == buffer.stride() {
        buffer.data_mut().copy_from_slice(src);
    } else {
        let row_bytes = buffer.row_bytes();
        for y in 0..info.height {
            let start = y as usize * info.stride as usize;
            buffer.row_mut(y).copy_from_slice(&src[start..start + row_bytes]);
        }
    }
    Ok(buffer)
}

/// Write a [`PixelBuffer`] back into an external bitmap.
///
/// The target must report the supported format and the buffer's exact
/// width and height; any rejection happens before the lock, leaving the
/// bitmap's contents untouched.
pub fn commit(buffer: &PixelBuffer, handle: &dyn BitmapHandle) -> Result<(), BridgeError> {
    let info = handle.info()?;
    checked_format(&info)?;
    if info.width != buffer.width() || info.height != buffer.height() {
        return Err(BridgeError::Format(format!(
            "target bitmap is {}x{} but the result is {}x{}",
            info.width,
            info.height,
            buffer.width(),
            buffer.height()
        )));
    }

    let mut lock = PixelLock::acquire(handle, info.locked_len())?;
    let dst = lock.bytes_mut();
    if info.stride == buffer.stride() {
        dst.copy_from_slice(buffer.data());
    } else {
        let row_bytes = buffer.row_bytes();
        for y in 0..info.height {
            let start = y as usize * info.stride as usize;
            dst[start..start + row_bytes].copy_from_slice(buffer.row(y));
        }
    }
    Ok(())
}
