//! Reference-counted native surface handles

use std::fmt;
use std::sync::Arc;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use thiserror::Error;

/// Surface errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// Width or height was zero or negative at acquisition
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Reported width
        width: i32,
        /// Reported height
        height: i32,
    },

    /// The runtime could not resolve the surface to a native window
    #[error("Surface could not be resolved to a native window")]
    Unresolved,

    /// The handle was already released
    #[error("Surface handle was already released")]
    Released,
}

/// Result type for surface operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// A presentable surface owned by an external windowing runtime
///
/// The runtime keeps the surface alive while its reference count is non-zero.
/// [`SurfaceHandle`] pairs every `acquire` with exactly one `release`.
pub trait NativeSurface: Send + Sync {
    /// Increment the runtime's reference count
    fn acquire(&self);

    /// Decrement the runtime's reference count
    fn release(&self);

    /// Current width in pixels
    fn width(&self) -> i32;

    /// Current height in pixels
    fn height(&self) -> i32;

    /// Pixel format as reported by the runtime
    fn format(&self) -> i32;

    /// Native window handle for surface creation, `None` if it cannot be resolved
    fn raw_window_handle(&self) -> Option<RawWindowHandle>;

    /// Native display handle for surface creation
    fn raw_display_handle(&self) -> RawDisplayHandle;
}

/// Surface properties captured when the handle was acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Width in pixels, always positive
    pub width: u32,
    /// Height in pixels, always positive
    pub height: u32,
    /// Runtime pixel format
    pub format: i32,
}

/// One acquired reference to a [`NativeSurface`]
///
/// Release is explicit and idempotent. A handle dropped while still holding
/// its reference releases it and logs a warning.
pub struct SurfaceHandle {
    native: Arc<dyn NativeSurface>,
    info: SurfaceInfo,
    released: bool,
}

impl SurfaceHandle {
    /// Validate `native` and acquire a reference to it
    ///
    /// Nothing is acquired when validation fails.
    pub fn acquire(native: Arc<dyn NativeSurface>) -> SurfaceResult<Self> {
        let (width, height) = (native.width(), native.height());
        let dimensions = u32::try_from(width)
            .ok()
            .zip(u32::try_from(height).ok())
            .filter(|(w, h)| *w > 0 && *h > 0);

        let Some((width, height)) = dimensions else {
            return Err(SurfaceError::InvalidDimensions { width, height });
        };

        if native.raw_window_handle().is_none() {
            return Err(SurfaceError::Unresolved);
        }

        let info = SurfaceInfo {
            width,
            height,
            format: native.format(),
        };
        native.acquire();

        Ok(Self {
            native,
            info,
            released: false,
        })
    }

    /// Acquire another reference to the same surface
    pub fn share(&self) -> SurfaceResult<Self> {
        if self.released {
            return Err(SurfaceError::Released);
        }

        self.native.acquire();
        Ok(Self {
            native: Arc::clone(&self.native),
            info: self.info,
            released: false,
        })
    }

    /// Give the reference back to the runtime
    pub fn release(&mut self) {
        if !self.released {
            self.native.release();
            self.released = true;
        }
    }

    /// Whether this handle still holds its reference
    pub fn is_valid(&self) -> bool {
        !self.released
    }

    /// Properties captured at acquisition
    pub fn info(&self) -> SurfaceInfo {
        self.info
    }

    /// Native window handle, refused once released
    pub fn raw_window_handle(&self) -> SurfaceResult<RawWindowHandle> {
        if self.released {
            return Err(SurfaceError::Released);
        }
        self.native.raw_window_handle().ok_or(SurfaceError::Unresolved)
    }

    /// Native display handle
    pub fn raw_display_handle(&self) -> RawDisplayHandle {
        self.native.raw_display_handle()
    }

    /// Whether both handles refer to the same native surface
    pub fn same_surface(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.native).cast::<()>() == Arc::as_ptr(&other.native).cast::<()>()
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Surface handle {}x{} dropped without explicit release",
                self.info.width,
                self.info.height
            );
            self.release();
        }
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("info", &self.info)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
