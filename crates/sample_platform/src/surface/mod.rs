//! Native surface ownership
//!
//! Surfaces handed over by an external windowing runtime are reference
//! counted on the runtime's side. This module wraps them:
//!
//! - **`handle`**: [`NativeSurface`] (the external resource) and
//!   [`SurfaceHandle`], one explicitly acquired and released reference to it
//! - **`slot`**: [`SurfaceSlot`], the mutex-guarded holder shared between the
//!   thread that delivers surfaces and the render thread

pub mod handle;
pub mod slot;

pub use handle::{NativeSurface, SurfaceError, SurfaceHandle, SurfaceInfo, SurfaceResult};
pub use slot::SurfaceSlot;
