//! Process-wide pointer to the active external-surface platform

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::link::ExternalSurfaceLink;

static ACTIVE_PLATFORM: Mutex<Option<Weak<ExternalSurfaceLink>>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<Weak<ExternalSurfaceLink>>> {
    ACTIVE_PLATFORM.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Point the registry at `link`, replacing any previous registration
pub fn set_active_platform(link: &Arc<ExternalSurfaceLink>) {
    *lock() = Some(Arc::downgrade(link));
}

/// Clear the registration if it still points at `link`
///
/// Returns whether it did.
pub fn clear_active_platform(link: &Arc<ExternalSurfaceLink>) -> bool {
    let mut active = lock();
    let registered = active
        .as_ref()
        .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(link)));
    if registered {
        *active = None;
    }
    registered
}

/// Clear the registration unconditionally
pub fn reset_active_platform() {
    *lock() = None;
}

/// The active platform's link, if one is registered and alive
pub fn active_platform() -> Option<Arc<ExternalSurfaceLink>> {
    lock().as_ref().and_then(Weak::upgrade)
}

/// Whether a live platform is registered
pub fn has_active_platform() -> bool {
    active_platform().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_is_non_owning() {
        let first = Arc::new(ExternalSurfaceLink::new());
        let second = Arc::new(ExternalSurfaceLink::new());

        set_active_platform(&first);
        assert!(Arc::ptr_eq(&active_platform().unwrap(), &first));

        // Only the registered platform may clear the slot
        set_active_platform(&second);
        assert!(!clear_active_platform(&first));
        assert!(has_active_platform());

        // A dropped platform is never handed out
        drop(second);
        assert!(active_platform().is_none());

        set_active_platform(&first);
        assert!(clear_active_platform(&first));
        assert!(!has_active_platform());

        set_active_platform(&first);
        reset_active_platform();
        assert!(!has_active_platform());
    }
}
