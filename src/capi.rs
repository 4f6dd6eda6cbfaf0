//! C ABI for managed hosts.
//!
//! This is the crate's externally-callable surface when built as a
//! `cdylib`. The host hands over two opaque bitmap handles plus a table
//! of callbacks implementing the get-info / lock / unlock protocol, and
//! gets back a status code from the error taxonomy; the message behind a
//! failure is retrievable per-thread via [`pxb_last_error_message`].
//!
//! Panics never unwind across the boundary: every entry point catches
//! them and reports [`PxbStatus::Unknown`].

use std::cell::RefCell;
use std::ffi::{c_char, c_void, CString};
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use log::warn;

use crate::bitmap::{BitmapHandle, BitmapInfo};
use crate::boundary::{self, BoundaryError};
use crate::error::BridgeError;

/// Result code of a boundary call.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PxbStatus {
    Ok = 0,
    /// Unsupported pixel format or inconsistent geometry.
    Format = 1,
    /// The bitmap's pixels could not be locked or queried.
    Acquire = 2,
    /// The image-processing backend rejected its input.
    Transform = 3,
    /// Unclassified failure, including panics caught at the boundary.
    Unknown = 4,
}

/// Geometry and format record filled in by the host's `get_info`
/// callback. `format` uses the host's integer codes; packed RGBA_8888
/// is code 1 and is the only format accepted.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PxbBitmapInfo {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: u32,
}

/// Host-supplied implementation of the bitmap protocol.
///
/// Every callback receives the opaque bitmap pointer given to the entry
/// point and returns 0 on success, any other value on failure. `lock`
/// stores the pixel base address through its out-parameter; the address
/// must stay valid for `stride * height` bytes until the matching
/// `unlock`. `unlock` is invoked exactly once per successful lock,
/// including on failure paths.
#[repr(C)]
pub struct PxbBitmapCallbacks {
    pub get_info:
        Option<unsafe extern "C" fn(bitmap: *mut c_void, info: *mut PxbBitmapInfo) -> i32>,
    pub lock: Option<unsafe extern "C" fn(bitmap: *mut c_void, pixels: *mut *mut u8) -> i32>,
    pub unlock: Option<unsafe extern "C" fn(bitmap: *mut c_void) -> i32>,
}

/// One host bitmap viewed through the callback table.
struct ForeignBitmap<'a> {
    callbacks: &'a PxbBitmapCallbacks,
    bitmap: *mut c_void,
}

unsafe impl BitmapHandle for ForeignBitmap<'_> {
    fn info(&self) -> Result<BitmapInfo, BridgeError> {
        let get_info = self
            .callbacks
            .get_info
            .ok_or_else(|| BridgeError::Acquire("host provided no get_info callback".into()))?;
        let mut info = PxbBitmapInfo::default();
        let rc = unsafe { get_info(self.bitmap, &mut info) };
        if rc != 0 {
            return Err(BridgeError::Acquire(format!(
                "get_info callback failed with status {rc}"
            )));
        }
        Ok(BitmapInfo {
            width: info.width,
            height: info.height,
            stride: info.stride,
            format: info.format,
        })
    }

    fn lock(&self) -> Result<*mut u8, BridgeError> {
        let lock = self
            .callbacks
            .lock
            .ok_or_else(|| BridgeError::Acquire("host provided no lock callback".into()))?;
        let mut pixels: *mut u8 = std::ptr::null_mut();
        let rc = unsafe { lock(self.bitmap, &mut pixels) };
        if rc != 0 {
            return Err(BridgeError::Acquire(format!(
                "lock callback failed with status {rc}"
            )));
        }
        Ok(pixels)
    }

    fn unlock(&self) {
        if let Some(unlock) = self.callbacks.unlock {
            let rc = unsafe { unlock(self.bitmap) };
            if rc != 0 {
                warn!("unlock callback reported status {rc}");
            }
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: &str) {
    let message = CString::new(message).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Shared prologue/epilogue of the processing entry points.
///
/// # Safety
/// `callbacks` must be null or point to a valid table for the duration
/// of the call; `input` and `output` must be accepted by its functions.
unsafe fn run_boundary(
    callbacks: *const PxbBitmapCallbacks,
    input: *mut c_void,
    output: *mut c_void,
    op: impl FnOnce(&dyn BitmapHandle, &dyn BitmapHandle) -> Result<(), BoundaryError>,
) -> PxbStatus {
    clear_last_error();
    let Some(callbacks) = (unsafe { callbacks.as_ref() }) else {
        set_last_error("null callback table");
        return PxbStatus::Acquire;
    };

    let input = ForeignBitmap { callbacks, bitmap: input };
    let output = ForeignBitmap { callbacks, bitmap: output };

    match panic::catch_unwind(AssertUnwindSafe(|| op(&input, &output))) {
        Ok(Ok(())) => PxbStatus::Ok,
        Ok(Err(err)) => {
            set_last_error(&err.to_string());
            match err.source {
                BridgeError::Format(_) => PxbStatus::Format,
                BridgeError::Acquire(_) => PxbStatus::Acquire,
                BridgeError::Transform(_) => PxbStatus::Transform,
                BridgeError::Unknown(_) => PxbStatus::Unknown,
            }
        }
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unidentified panic in native code".to_string()
            };
            set_last_error(&message);
            PxbStatus::Unknown
        }
    }
}

/// Run Canny edge detection from `input` into `output` with the default
/// hysteresis thresholds.
///
/// # Safety
/// `callbacks` must point to a valid [`PxbBitmapCallbacks`] table whose
/// functions honor the documented protocol, and `input` / `output` must
/// be bitmap pointers those functions accept for the duration of the
/// call.
#[no_mangle]
pub unsafe extern "C" fn pxb_process_canny(
    callbacks: *const PxbBitmapCallbacks,
    input: *mut c_void,
    output: *mut c_void,
) -> PxbStatus {
    unsafe { run_boundary(callbacks, input, output, boundary::run_edge_detect) }
}

/// Run Canny edge detection with explicit hysteresis thresholds.
///
/// # Safety
/// Same contract as [`pxb_process_canny`].
#[no_mangle]
pub unsafe extern "C" fn pxb_process_canny_with_thresholds(
    callbacks: *const PxbBitmapCallbacks,
    input: *mut c_void,
    output: *mut c_void,
    low_threshold: f64,
    high_threshold: f64,
) -> PxbStatus {
    unsafe {
        run_boundary(callbacks, input, output, |input, output| {
            boundary::run_edge_detect_with_thresholds(
                input,
                output,
                low_threshold as f32,
                high_threshold as f32,
            )
        })
    }
}

/// Run grayscale conversion from `input` into `output`.
///
/// # Safety
/// Same contract as [`pxb_process_canny`].
#[no_mangle]
pub unsafe extern "C" fn pxb_process_grayscale(
    callbacks: *const PxbBitmapCallbacks,
    input: *mut c_void,
    output: *mut c_void,
) -> PxbStatus {
    unsafe { run_boundary(callbacks, input, output, boundary::run_grayscale) }
}

/// Version string of the underlying image-processing library.
///
/// Always succeeds; the returned pointer has static storage and must not
/// be freed.
#[no_mangle]
pub extern "C" fn pxb_library_version() -> *const c_char {
    static VERSION: OnceLock<CString> = OnceLock::new();
    VERSION
        .get_or_init(|| CString::new(boundary::BACKEND_VERSION).unwrap_or_default())
        .as_ptr()
}

/// Message for the most recent failure on the calling thread, or null
/// when the last boundary call succeeded.
///
/// The pointer stays valid until the next boundary call on the same
/// thread; callers wanting to keep the message must copy it.
#[no_mangle]
pub extern "C" fn pxb_last_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |message| message.as_ptr())
    })
}
