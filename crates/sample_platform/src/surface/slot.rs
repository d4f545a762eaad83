//! Synchronized surface holder

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::handle::{NativeSurface, SurfaceHandle, SurfaceInfo, SurfaceResult};

#[derive(Default)]
struct SlotState {
    handle: Option<SurfaceHandle>,
    /// Bumped on every successful mutation
    generation: u64,
    /// Generation of the source slot the current handle came from
    source_generation: u64,
}

/// Mutex-guarded holder for at most one [`SurfaceHandle`]
///
/// Reads lock too. The lock only covers pointer and counter updates: handles
/// displaced by a mutation are released after it is dropped, and callers that
/// need the surface for longer (GPU object creation) take a [`lease`](Self::lease).
#[derive(Default)]
pub struct SurfaceSlot {
    state: Mutex<SlotState>,
}

impl SurfaceSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                handle: None,
                generation: 0,
                source_generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire `native` and make it the bound surface
    ///
    /// On failure the previously bound handle stays in place.
    pub fn set(&self, native: Arc<dyn NativeSurface>) -> SurfaceResult<SurfaceInfo> {
        let handle = SurfaceHandle::acquire(native)?;
        let info = handle.info();
        self.set_handle(handle);
        Ok(info)
    }

    /// Bind an already acquired handle, releasing the previous one
    pub fn set_handle(&self, handle: SurfaceHandle) {
        let previous = {
            let mut state = self.lock();
            state.generation += 1;
            state.handle.replace(handle)
        };
        release(previous);
    }

    /// Bind `handle` if it is newer than what the slot last accepted
    ///
    /// `source_generation` is the generation of the slot the handle was taken
    /// from. Updates that arrive late or out of order are released and
    /// rejected. Returns whether the handle was accepted.
    pub fn apply(&self, source_generation: u64, handle: Option<SurfaceHandle>) -> bool {
        let (accepted, displaced) = {
            let mut state = self.lock();
            if source_generation <= state.source_generation {
                (false, handle)
            } else {
                state.source_generation = source_generation;
                state.generation += 1;
                (true, std::mem::replace(&mut state.handle, handle))
            }
        };

        if !accepted {
            log::debug!("Discarding stale surface update (generation {source_generation})");
        }
        release(displaced);
        accepted
    }

    /// Properties of the bound surface, if any
    pub fn get(&self) -> Option<SurfaceInfo> {
        self.lock().handle.as_ref().map(SurfaceHandle::info)
    }

    /// Current generation and bound surface properties, read under one lock
    pub fn observe(&self) -> (u64, Option<SurfaceInfo>) {
        let state = self.lock();
        (state.generation, state.handle.as_ref().map(SurfaceHandle::info))
    }

    /// Current generation together with a shared reference to the bound handle
    ///
    /// The returned handle holds its own external reference and must be
    /// released (or handed to another slot) by the caller.
    pub fn snapshot(&self) -> (u64, Option<SurfaceHandle>) {
        let state = self.lock();
        let shared = state.handle.as_ref().and_then(|handle| handle.share().ok());
        (state.generation, shared)
    }

    /// Shared reference to the bound handle for use outside the lock
    pub fn lease(&self) -> Option<SurfaceHandle> {
        self.snapshot().1
    }

    /// Release the bound handle
    ///
    /// Returns whether a handle was bound.
    pub fn clear(&self) -> bool {
        let previous = {
            let mut state = self.lock();
            let previous = state.handle.take();
            if previous.is_some() {
                state.generation += 1;
            }
            previous
        };

        let was_bound = previous.is_some();
        release(previous);
        was_bound
    }

    /// Number of successful mutations so far
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Whether a handle is bound
    pub fn is_bound(&self) -> bool {
        self.lock().handle.is_some()
    }
}

fn release(handle: Option<SurfaceHandle>) {
    if let Some(mut handle) = handle {
        handle.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceError;
    use crate::testing::MockSurface;

    #[test]
    fn test_get_returns_last_bound() {
        let slot = SurfaceSlot::new();
        let a = MockSurface::new(100, 200);
        let b = MockSurface::new(50, 50);

        slot.set(a.clone()).unwrap();
        slot.set(b.clone()).unwrap();

        assert_eq!(slot.get().map(|info| (info.width, info.height)), Some((50, 50)));
        assert_eq!(a.ref_count(), 0);
        assert_eq!(b.ref_count(), 1);

        assert!(slot.clear());
        assert_eq!(slot.get(), None);
        assert_eq!(b.ref_count(), 0);
        assert!(!slot.clear());
    }

    #[test]
    fn test_invalid_bind_keeps_previous() {
        let slot = SurfaceSlot::new();
        let a = MockSurface::new(100, 200);
        slot.set(a.clone()).unwrap();
        let generation = slot.generation();

        let err = slot.set(MockSurface::new(0, 10)).unwrap_err();
        assert_eq!(err, SurfaceError::InvalidDimensions { width: 0, height: 10 });
        assert!(slot.set(MockSurface::unresolvable(10, 10)).is_err());

        assert_eq!(slot.get().map(|info| info.width), Some(100));
        assert_eq!(slot.generation(), generation);
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn test_observe_pairs_generation_with_surface() {
        let slot = SurfaceSlot::new();
        assert_eq!(slot.observe(), (0, None));

        slot.set(MockSurface::new(30, 40)).unwrap();
        let (generation, info) = slot.observe();
        assert_eq!(generation, slot.generation());
        assert_eq!(info.map(|info| (info.width, info.height)), Some((30, 40)));

        slot.clear();
        assert_eq!(slot.observe(), (generation + 1, None));
    }

    #[test]
    fn test_lease_holds_extra_reference() {
        let slot = SurfaceSlot::new();
        let a = MockSurface::new(16, 16);
        slot.set(a.clone()).unwrap();

        let mut lease = slot.lease().unwrap();
        assert_eq!(a.ref_count(), 2);

        slot.clear();
        assert_eq!(a.ref_count(), 1);
        assert!(lease.raw_window_handle().is_ok());

        lease.release();
        assert_eq!(a.ref_count(), 0);
    }

    #[test]
    fn test_apply_discards_stale_updates() {
        let source = SurfaceSlot::new();
        let target = SurfaceSlot::new();
        let a = MockSurface::new(100, 100);
        let b = MockSurface::new(200, 200);

        source.set(a.clone()).unwrap();
        let (old_generation, old_handle) = source.snapshot();
        source.set(b.clone()).unwrap();
        let (new_generation, new_handle) = source.snapshot();

        assert!(target.apply(new_generation, new_handle));
        assert!(!target.apply(old_generation, old_handle));

        assert_eq!(target.get().map(|info| info.width), Some(200));
        assert_eq!(a.ref_count(), 0);
        assert_eq!(b.ref_count(), 2);
    }

    #[test]
    fn test_apply_none_clears() {
        let target = SurfaceSlot::new();
        let a = MockSurface::new(10, 10);
        target.apply(1, SurfaceHandle::acquire(a.clone()).ok());
        assert_eq!(a.ref_count(), 1);

        assert!(target.apply(2, None));
        assert!(!target.is_bound());
        assert_eq!(a.ref_count(), 0);
    }
}
