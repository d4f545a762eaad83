//! C ABI over the external-surface driver
//!
//! Every function contains panics and reports failure as `false`, so hosts
//! that cannot tolerate unwinding (JNI shims, C) can call them directly.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use raw_window_handle::{
    AndroidDisplayHandle, AndroidNdkWindowHandle, RawDisplayHandle, RawWindowHandle,
};

use super::driver;
use crate::context::{stage_arguments, PlatformContext};
use crate::plugins::{FpsLogger, Plugin};
use crate::surface::NativeSurface;

/// Reference-count callback supplied by the host, called with the window pointer
pub type SurfaceCallback = unsafe extern "C" fn(window: *mut c_void);

/// Surface owned by a C host
struct ForeignSurface {
    window: *mut c_void,
    width: i32,
    height: i32,
    format: i32,
    acquire: SurfaceCallback,
    release: SurfaceCallback,
}

// SAFETY: the host guarantees the window pointer stays valid while it holds a
// reference and that its acquire/release callbacks may be called from any thread.
unsafe impl Send for ForeignSurface {}
unsafe impl Sync for ForeignSurface {}

impl NativeSurface for ForeignSurface {
    fn acquire(&self) {
        unsafe { (self.acquire)(self.window) };
    }

    fn release(&self) {
        unsafe { (self.release)(self.window) };
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn format(&self) -> i32 {
        self.format
    }

    fn raw_window_handle(&self) -> Option<RawWindowHandle> {
        if self.window.is_null() {
            return None;
        }
        let mut handle = AndroidNdkWindowHandle::empty();
        handle.a_native_window = self.window;
        Some(RawWindowHandle::AndroidNdk(handle))
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Android(AndroidDisplayHandle::empty())
    }
}

fn boundary(entry: &str, f: impl FnOnce() -> bool) -> bool {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        log::error!("{entry} panicked at the C boundary");
        false
    })
}

unsafe fn optional_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Bind or replace the surface
///
/// Returns `false` for a null window, missing callbacks or non-positive
/// dimensions; the previous binding then stays in place.
#[no_mangle]
pub extern "C" fn vks_bind_surface(
    window: *mut c_void,
    width: i32,
    height: i32,
    format: i32,
    acquire: Option<SurfaceCallback>,
    release: Option<SurfaceCallback>,
) -> bool {
    boundary("vks_bind_surface", || {
        let (Some(acquire), Some(release)) = (acquire, release) else {
            log::warn!("vks_bind_surface: missing reference-count callbacks");
            return false;
        };
        let surface = ForeignSurface {
            window,
            width,
            height,
            format,
            acquire,
            release,
        };
        driver::bind_surface(Arc::new(surface)).is_ok()
    })
}

/// The host took the surface away
#[no_mangle]
pub extern "C" fn vks_release_surface() {
    boundary("vks_release_surface", || driver::release_surface().is_ok());
}

/// Stage the arguments the next `vks_initialize` starts with
///
/// # Safety
///
/// `args` must point to `count` valid, NUL-terminated strings (null entries
/// are skipped), or be null when `count` is zero.
#[no_mangle]
pub unsafe extern "C" fn vks_stage_arguments(args: *const *const c_char, count: usize) -> bool {
    boundary("vks_stage_arguments", || {
        if args.is_null() {
            stage_arguments(Vec::new());
            return count == 0;
        }
        let arguments = unsafe { std::slice::from_raw_parts(args, count) }
            .iter()
            .filter_map(|arg| unsafe { optional_str(*arg) })
            .collect();
        stage_arguments(arguments);
        true
    })
}

/// Stand up a platform on the bound surface with the staged arguments
///
/// Null directories keep the host defaults.
///
/// # Safety
///
/// `storage_directory` and `temp_directory` must each be null or a valid,
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn vks_initialize(
    storage_directory: *const c_char,
    temp_directory: *const c_char,
) -> bool {
    boundary("vks_initialize", || {
        let mut context = PlatformContext::external_surface(None);
        if let Some(storage) = unsafe { optional_str(storage_directory) } {
            context = context.with_external_storage_directory(storage);
        }
        if let Some(temp) = unsafe { optional_str(temp_directory) } {
            context = context.with_temp_directory(temp);
        }

        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(FpsLogger::default())];
        driver::initialize(context, plugins).is_ok()
    })
}

/// Render one frame; `false` before initialization, after revocation or on failure
#[no_mangle]
pub extern "C" fn vks_render_frame() -> bool {
    boundary("vks_render_frame", || driver::render_frame().is_ok())
}

/// Tear the platform down
#[no_mangle]
pub extern "C" fn vks_terminate() {
    boundary("vks_terminate", || driver::terminate().is_ok());
}
