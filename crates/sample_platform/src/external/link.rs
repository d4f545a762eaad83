//! Shared state between an external-surface platform and the binding thread

use std::sync::atomic::{AtomicBool, Ordering};

use crate::surface::{SurfaceHandle, SurfaceSlot};

/// The part of an external-surface platform the binding thread may touch
///
/// The platform owns the only strong reference; the process-wide registry
/// holds a `Weak`. Revocation is sticky: once the runtime took the surface
/// away, this platform instance never presents again.
#[derive(Default)]
pub struct ExternalSurfaceLink {
    surface: SurfaceSlot,
    revoked: AtomicBool,
    deselect_requested: AtomicBool,
}

impl ExternalSurfaceLink {
    /// Create an unbound link
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a surface taken from a source slot at `source_generation`
    ///
    /// Stale offers and offers after revocation are released and rejected.
    pub fn offer(&self, source_generation: u64, handle: Option<SurfaceHandle>) -> bool {
        if self.is_revoked() {
            if let Some(mut handle) = handle {
                handle.release();
            }
            log::debug!("Ignoring surface offered to a revoked platform");
            return false;
        }
        self.surface.apply(source_generation, handle)
    }

    /// Take the surface away and ask the platform to close
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
        self.deselect_requested.store(true, Ordering::SeqCst);
        if self.surface.clear() {
            log::info!("External surface revoked");
        }
    }

    /// Whether the surface was revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }

    /// Consume a pending request to drop the selected application
    pub fn take_deselect_request(&self) -> bool {
        self.deselect_requested.swap(false, Ordering::SeqCst)
    }

    /// The platform's surface slot
    pub fn surface(&self) -> &SurfaceSlot {
        &self.surface
    }

    /// Release whatever surface is still bound, without revoking
    pub fn release_surface(&self) {
        self.surface.clear();
    }
}
