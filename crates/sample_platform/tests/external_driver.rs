//! External driver scenarios
//!
//! The driver is process-wide, so every test takes `SERIAL` and starts from a
//! clean slate.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use sample_platform::application::{AppError, AppInfo, Application, PrepareOptions};
use sample_platform::context::{Notifier, PlatformContext};
use sample_platform::external::driver::{self, DriverError};
use sample_platform::external::{ffi, registry};
use sample_platform::surface::SurfaceError;
use sample_platform::testing::{AppBehavior, EventLog, MockSurface, RecordingApp};
use sample_platform::ExitCode;

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    driver::terminate().unwrap();
    driver::release_surface().unwrap();
    guard
}

fn context(sample: &str) -> PlatformContext {
    PlatformContext::new(vec!["vulkan_samples".to_string(), sample.to_string()])
}

fn register(id: &str, behavior: AppBehavior) -> EventLog {
    let log = EventLog::new();
    driver::register_app(RecordingApp::info(id, &log, behavior));
    log
}

#[derive(Default)]
struct Messages(Mutex<Vec<String>>);

impl Notifier for Messages {
    fn notify(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[test]
fn render_before_initialize_fails() {
    let _serial = serial();

    assert_eq!(driver::render_frame(), Err(DriverError::NotInitialized));
    assert!(!driver::is_initialized());
}

#[test]
fn initialize_without_surface_fails() {
    let _serial = serial();
    register("no_surface", AppBehavior::default());

    assert_eq!(driver::initialize(context("no_surface"), Vec::new()), Err(DriverError::NoSurface));
    assert!(!driver::is_initialized());
    assert!(!registry::has_active_platform());
}

#[test]
fn invalid_bind_keeps_previous_surface() {
    let _serial = serial();
    let a = MockSurface::new(100, 200);
    driver::bind_surface(a.clone()).unwrap();

    let result = driver::bind_surface(MockSurface::new(0, 10));
    assert_eq!(
        result,
        Err(DriverError::Surface(SurfaceError::InvalidDimensions { width: 0, height: 10 }))
    );
    assert_eq!(driver::pending_surface().map(|info| (info.width, info.height)), Some((100, 200)));
    assert_eq!(a.ref_count(), 1);

    driver::release_surface().unwrap();
    assert_eq!(driver::pending_surface(), None);
    assert_eq!(a.ref_count(), 0);
}

#[test]
fn second_initialize_tears_down_first() {
    let _serial = serial();
    let log = register("reinit", AppBehavior::default());
    let a = MockSurface::new(100, 200);
    driver::bind_surface(a.clone()).unwrap();

    driver::initialize(context("reinit"), Vec::new()).unwrap();
    driver::render_frame().unwrap();
    let first = Arc::downgrade(&registry::active_platform().unwrap());
    assert_eq!(a.ref_count(), 2);

    driver::initialize(context("reinit"), Vec::new()).unwrap();

    assert!(first.upgrade().is_none());
    assert_eq!(log.count("finish"), 1);
    assert!(registry::has_active_platform());
    assert_eq!(a.ref_count(), 2);

    driver::render_frame().unwrap();
    assert_eq!(log.count("prepare 100x200"), 2);

    driver::terminate().unwrap();
    assert_eq!(log.count("finish"), 2);
    assert_eq!(a.ref_count(), 1);
}

#[test]
fn revoked_surface_fails_next_frame() {
    let _serial = serial();
    let log = register("revoke", AppBehavior::default());
    let a = MockSurface::new(100, 200);
    driver::bind_surface(a.clone()).unwrap();

    driver::initialize(context("revoke"), Vec::new()).unwrap();
    driver::render_frame().unwrap();

    driver::release_surface().unwrap();
    assert_eq!(a.ref_count(), 0);
    assert_eq!(driver::render_frame(), Err(DriverError::Platform(ExitCode::Close)));
    assert_eq!(driver::render_frame(), Err(DriverError::Platform(ExitCode::Close)));
    assert_eq!(log.count("update"), 1);

    // Binding again does not revive the closed platform
    driver::bind_surface(MockSurface::new(100, 200)).unwrap();
    assert!(driver::render_frame().is_err());

    driver::terminate().unwrap();
    assert_eq!(log.count("finish"), 1);
}

#[test]
fn rebinding_reaches_next_frame() {
    let _serial = serial();
    let log = register("rebind", AppBehavior::default());
    let a = MockSurface::new(100, 200);
    let b = MockSurface::new(50, 50);
    driver::bind_surface(a.clone()).unwrap();

    driver::initialize(context("rebind"), Vec::new()).unwrap();
    driver::render_frame().unwrap();
    assert_eq!(log.events(), ["prepare 100x200", "update"]);

    driver::bind_surface(b.clone()).unwrap();
    assert_eq!(a.ref_count(), 0);
    assert_eq!(b.ref_count(), 2);

    driver::render_frame().unwrap();
    assert_eq!(log.events(), ["prepare 100x200", "update", "resize 50x50", "update"]);

    driver::terminate().unwrap();
    assert_eq!(b.ref_count(), 1);
}

#[test]
fn terminate_without_initialize() {
    let _serial = serial();

    driver::terminate().unwrap();
    driver::terminate().unwrap();
    assert!(!registry::has_active_platform());
    assert!(!driver::is_initialized());
}

#[test]
fn unknown_sample_is_reported() {
    let _serial = serial();
    let messages = Arc::new(Messages::default());
    driver::bind_surface(MockSurface::new(64, 64)).unwrap();

    let result = driver::initialize(context("missing").with_notifier(messages.clone()), Vec::new());

    assert_eq!(result, Err(DriverError::UnknownSample("missing".to_string())));
    assert!(!driver::is_initialized());
    assert!(!registry::has_active_platform());
    assert_eq!(
        *messages.0.lock().unwrap(),
        ["Error! Could not launch selected sample: Sample 'missing' not found"]
    );
}

#[test]
fn sample_failure_is_contained_and_notified() {
    let _serial = serial();
    let messages = Arc::new(Messages::default());
    let behavior = AppBehavior {
        panic_update_at: Some(2),
        ..AppBehavior::default()
    };
    let log = register("crashing", behavior);
    driver::bind_surface(MockSurface::new(64, 64)).unwrap();

    driver::initialize(context("crashing").with_notifier(messages.clone()), Vec::new()).unwrap();
    driver::render_frame().unwrap();
    assert_eq!(driver::render_frame(), Err(DriverError::Platform(ExitCode::FatalError)));
    assert_eq!(log.count("finish"), 1);
    assert!(driver::is_initialized());

    driver::terminate().unwrap();
    let messages = messages.0.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Error! Could not launch selected sample: Application panicked"));
}

#[test]
fn blocking_mode_runs_to_completion() {
    let _serial = serial();
    let behavior = AppBehavior {
        close_after: Some(3),
        create_surface: true,
        ..AppBehavior::default()
    };
    let log = register("blocking", behavior);
    let a = MockSurface::new(320, 240);
    driver::bind_surface(a.clone()).unwrap();

    assert_eq!(driver::run_sample(context("blocking"), Vec::new()), Ok(ExitCode::Success));
    assert_eq!(log.count("surface"), 1);
    assert_eq!(log.count("update"), 3);
    assert_eq!(log.count("finish"), 1);
    assert!(!registry::has_active_platform());
    assert_eq!(a.ref_count(), 1);
}

#[test]
fn blocking_and_stepped_modes_exclude_each_other() {
    let _serial = serial();
    register("stepped", AppBehavior::default());
    driver::bind_surface(MockSurface::new(64, 64)).unwrap();
    driver::initialize(context("stepped"), Vec::new()).unwrap();

    assert_eq!(driver::run_sample(context("stepped"), Vec::new()), Err(DriverError::Busy));
    assert!(driver::render_frame().is_ok());
}

/// Counts frames rendered while a stepped platform also existed
static OVERLAPPING_FRAMES: AtomicUsize = AtomicUsize::new(0);

struct WatchesStepped {
    frames: u32,
}

impl Application for WatchesStepped {
    fn name(&self) -> &str {
        "watches_stepped"
    }

    fn prepare(&mut self, _options: PrepareOptions<'_>) -> bool {
        true
    }

    fn update(&mut self, _delta_time: f32) -> Result<(), AppError> {
        self.frames += 1;
        if driver::is_initialized() {
            OVERLAPPING_FRAMES.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.frames >= 2
    }
}

#[test]
fn racing_blocking_and_stepped_never_overlap() {
    let _serial = serial();
    register("stepped_racer", AppBehavior::default());
    driver::register_app(AppInfo::new("blocking_racer", "Watches for stepped platforms", || {
        Box::new(WatchesStepped { frames: 0 }) as Box<dyn Application>
    }));
    let surface = MockSurface::new(64, 64);
    driver::bind_surface(surface.clone()).unwrap();
    OVERLAPPING_FRAMES.store(0, Ordering::SeqCst);

    let stepped = thread::spawn(|| {
        let mut started = 0;
        for _ in 0..300 {
            match driver::initialize(context("stepped_racer"), Vec::new()) {
                Ok(()) => started += 1,
                Err(e) => assert_eq!(e, DriverError::Busy),
            }
            driver::terminate().unwrap();
        }
        started
    });

    let mut completed = 0;
    for _ in 0..300 {
        match driver::run_sample(context("blocking_racer"), Vec::new()) {
            Ok(code) => {
                assert_eq!(code, ExitCode::Success);
                completed += 1;
            }
            Err(e) => assert_eq!(e, DriverError::Busy),
        }
    }
    let started = stepped.join().unwrap();

    assert!(started + completed > 0);
    assert_eq!(OVERLAPPING_FRAMES.load(Ordering::SeqCst), 0);
    assert!(!driver::is_initialized());
    assert!(!registry::has_active_platform());
    assert_eq!(surface.ref_count(), 1);
}

#[test]
fn concurrent_bind_and_release_while_rendering() {
    let _serial = serial();
    register("churn", AppBehavior::default());
    let first = MockSurface::new(64, 64);
    driver::bind_surface(first.clone()).unwrap();
    driver::initialize(context("churn"), Vec::new()).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let binder = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut surfaces = Vec::new();
            let mut i = 0;
            while !stop.load(Ordering::SeqCst) && i < 5000 {
                let surface = MockSurface::new(32 + i % 64, 32 + i % 48);
                driver::bind_surface(surface.clone()).unwrap();
                surfaces.push(surface);
                if i % 3 == 0 {
                    driver::release_surface().unwrap();
                }
                i += 1;
            }
            surfaces
        })
    };

    for _ in 0..2000 {
        if driver::render_frame().is_err() {
            // Fails with NoSurface while released; the next binding recovers
            let _ = driver::initialize(context("churn"), Vec::new());
        }
    }
    stop.store(true, Ordering::SeqCst);
    let surfaces = binder.join().unwrap();

    driver::terminate().unwrap();
    driver::release_surface().unwrap();

    assert!(!driver::is_initialized());
    assert!(!registry::has_active_platform());
    assert_eq!(first.ref_count(), 0);
    for surface in &surfaces {
        assert_eq!(surface.ref_count(), 0);
    }
}

static FOREIGN_REFS: AtomicI64 = AtomicI64::new(0);

unsafe extern "C" fn foreign_acquire(_window: *mut c_void) {
    FOREIGN_REFS.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn foreign_release(_window: *mut c_void) {
    FOREIGN_REFS.fetch_sub(1, Ordering::SeqCst);
}

#[test]
fn c_abi_round() {
    let _serial = serial();
    register("c_abi", AppBehavior::default());
    let mut window = 0u8;
    let window = std::ptr::addr_of_mut!(window).cast::<c_void>();

    assert!(!ffi::vks_render_frame());
    assert!(!ffi::vks_bind_surface(std::ptr::null_mut(), 64, 64, 1, Some(foreign_acquire), Some(foreign_release)));
    assert!(!ffi::vks_bind_surface(window, 64, 64, 1, None, Some(foreign_release)));
    assert!(!ffi::vks_bind_surface(window, 0, 64, 1, Some(foreign_acquire), Some(foreign_release)));
    assert!(ffi::vks_bind_surface(window, 64, 64, 1, Some(foreign_acquire), Some(foreign_release)));
    assert_eq!(FOREIGN_REFS.load(Ordering::SeqCst), 1);

    let program = c"vulkan_samples";
    let sample = c"c_abi";
    let args = [program.as_ptr(), sample.as_ptr()];
    let dir = tempfile::tempdir().unwrap();
    let storage = std::ffi::CString::new(dir.path().to_str().unwrap()).unwrap();
    unsafe {
        assert!(ffi::vks_stage_arguments(args.as_ptr(), args.len()));
        assert!(ffi::vks_initialize(storage.as_ptr(), std::ptr::null()));
    }
    assert_eq!(FOREIGN_REFS.load(Ordering::SeqCst), 2);

    assert!(ffi::vks_render_frame());
    ffi::vks_release_surface();
    assert!(!ffi::vks_render_frame());
    ffi::vks_terminate();

    assert_eq!(FOREIGN_REFS.load(Ordering::SeqCst), 0);
    assert!(!driver::is_initialized());
}
