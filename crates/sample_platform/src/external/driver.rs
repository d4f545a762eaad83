//! Process-wide external-surface driver
//!
//! Hosts call these in any order:
//!
//! ```text
//! bind_surface ──▶ initialize ──▶ render_frame (per tick) ──▶ terminate
//!      ▲                                │
//!      └── release_surface ◀────────────┘   (from the host's UI thread)
//! ```
//!
//! Surfaces bound before a platform exists are parked in a pending slot and
//! offered to every platform created afterwards. Every entry point contains
//! panics and reports them as [`DriverError::Unknown`].
//!
//! The driver installs no logger itself. The first platform to initialize
//! does, with the `log_level` from its `platform.toml`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::registry;
use crate::application::{panic_message, AppInfo, AppRegistry};
use crate::context::{PlatformContext, DEFAULT_PROGRAM_NAME};
use crate::platform::{ExitCode, ExternalSurfacePlatform};
use crate::plugins::Plugin;
use crate::surface::{NativeSurface, SurfaceError, SurfaceInfo, SurfaceSlot};

/// Sample started when the host passes no sample id
pub const DEFAULT_SAMPLE_ID: &str = "hello_triangle";

/// Driver errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// No platform was initialized
    #[error("Platform is not initialized")]
    NotInitialized,

    /// No surface was bound before initialization
    #[error("No surface bound")]
    NoSurface,

    /// The bound surface was rejected
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The requested sample is not registered
    #[error("Unknown sample: {0}")]
    UnknownSample(String),

    /// Stepped and blocking mode were mixed
    #[error("Another platform is already running in blocking mode")]
    Busy,

    /// The platform reported a non-success exit code
    #[error("Platform returned {0:?}")]
    Platform(ExitCode),

    /// A panic or otherwise unanticipated failure
    #[error("Unknown failure: {0}")]
    Unknown(String),
}

/// Result type for driver entry points
pub type DriverResult<T> = Result<T, DriverError>;

struct Driven {
    platform: ExternalSurfacePlatform,
    last_code: ExitCode,
}

static PENDING_SURFACE: SurfaceSlot = SurfaceSlot::new();
static DRIVER: Mutex<Option<Driven>> = Mutex::new(None);
static APPS: Mutex<AppRegistry> = Mutex::new(AppRegistry::new());
static BLOCKING: AtomicBool = AtomicBool::new(false);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn contain<T>(entry: &str, f: impl FnOnce() -> DriverResult<T>) -> DriverResult<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => {
            if let Err(e) = &result {
                log::warn!("{entry} failed: {e}");
            }
            result
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("{entry} panicked: {message}");
            Err(DriverError::Unknown(message))
        }
    }
}

/// Make a sample selectable by id
pub fn register_app(info: AppInfo) {
    lock(&APPS).register(info);
}

/// Ids and descriptions of the registered samples
pub fn registered_apps() -> Vec<(String, String)> {
    lock(&APPS)
        .iter()
        .map(|info| (info.id.clone(), info.description.clone()))
        .collect()
}

/// Bind or replace the surface
///
/// The surface is validated first; on failure the previous binding stays.
/// A running platform picks the new surface up before its next frame.
pub fn bind_surface(native: Arc<dyn NativeSurface>) -> DriverResult<SurfaceInfo> {
    contain("bind_surface", || {
        let info = PENDING_SURFACE.set(native)?;
        let (generation, handle) = PENDING_SURFACE.snapshot();
        log::info!("Bound surface {}x{} (format {})", info.width, info.height, info.format);

        match registry::active_platform() {
            Some(link) => {
                link.offer(generation, handle);
            }
            None => {
                if let Some(mut handle) = handle {
                    handle.release();
                }
            }
        }
        Ok(info)
    })
}

/// The runtime took the surface away
///
/// The active platform closes its window; its next frame fails.
pub fn release_surface() -> DriverResult<()> {
    contain("release_surface", || {
        if let Some(link) = registry::active_platform() {
            link.revoke();
        }
        if PENDING_SURFACE.clear() {
            log::info!("Released surface");
        }
        Ok(())
    })
}

/// Properties of the surface new platforms would start with
pub fn pending_surface() -> Option<SurfaceInfo> {
    PENDING_SURFACE.get()
}

fn launch(context: PlatformContext, plugins: Vec<Box<dyn Plugin>>) -> DriverResult<ExternalSurfacePlatform> {
    let context = if context.arguments().is_empty() {
        context.with_arguments(vec![DEFAULT_PROGRAM_NAME.to_string()])
    } else {
        context
    };
    let sample_id = context
        .arguments()
        .get(1)
        .cloned()
        .unwrap_or_else(|| DEFAULT_SAMPLE_ID.to_string());
    let app = lock(&APPS).get(&sample_id).cloned();

    let mut platform = ExternalSurfacePlatform::new(context);

    // Register before taking the snapshot so no binding falls in between
    platform.register_as_active();
    let (generation, handle) = PENDING_SURFACE.snapshot();
    if handle.is_none() {
        platform.terminate(ExitCode::Close);
        return Err(DriverError::NoSurface);
    }
    platform.offer_surface(generation, handle);

    let code = platform.initialize(plugins);
    if code != ExitCode::Success {
        platform.terminate(code);
        return Err(match code {
            ExitCode::Close => DriverError::NoSurface,
            code => DriverError::Platform(code),
        });
    }

    let Some(app) = app else {
        platform.platform_mut().set_last_error(format!("Sample '{sample_id}' not found"));
        platform.terminate(ExitCode::FatalError);
        return Err(DriverError::UnknownSample(sample_id));
    };
    platform.request_application(Some(app));

    Ok(platform)
}

/// Stand up a platform for stepped rendering
///
/// Any previous instance is torn down completely first. The sample id is
/// the second argument (`DEFAULT_SAMPLE_ID` when absent). Fails without a
/// bound surface.
pub fn initialize(context: PlatformContext, plugins: Vec<Box<dyn Plugin>>) -> DriverResult<()> {
    contain("initialize", || {
        let mut driver = lock(&DRIVER);
        // Checked under the driver lock; `run_sample` sets the flag under it
        if BLOCKING.load(Ordering::SeqCst) {
            return Err(DriverError::Busy);
        }

        if let Some(mut previous) = driver.take() {
            log::info!("Replacing running platform");
            previous.platform.terminate(previous.last_code);
        }

        let platform = launch(context, plugins)?;
        *driver = Some(Driven {
            platform,
            last_code: ExitCode::Success,
        });
        Ok(())
    })
}

/// Render one frame
///
/// Fails before `initialize`, after the surface was revoked, and when the
/// sample failed this frame.
pub fn render_frame() -> DriverResult<()> {
    contain("render_frame", || {
        let mut driver = lock(&DRIVER);
        let Some(driven) = driver.as_mut() else {
            return Err(DriverError::NotInitialized);
        };

        let code = driven.platform.main_loop_frame();
        if code != ExitCode::Success {
            driven.last_code = code;
            return Err(DriverError::Platform(code));
        }
        Ok(())
    })
}

/// Tear down the stepped platform, if any
///
/// A platform whose sample failed reports the failure through the
/// context's notification channel.
pub fn terminate() -> DriverResult<()> {
    contain("terminate", || {
        let previous = lock(&DRIVER).take();
        if let Some(mut driven) = previous {
            driven.platform.terminate(driven.last_code);
        }
        Ok(())
    })
}

/// Whether a stepped platform exists
pub fn is_initialized() -> bool {
    lock(&DRIVER).is_some()
}

/// Create, initialize, run to completion and terminate a platform
///
/// Blocking mode; never shares a platform with the stepped API.
pub fn run_sample(context: PlatformContext, plugins: Vec<Box<dyn Plugin>>) -> DriverResult<ExitCode> {
    contain("run_sample", || {
        let _blocking = {
            let driver = lock(&DRIVER);
            if driver.is_some() || BLOCKING.swap(true, Ordering::SeqCst) {
                return Err(DriverError::Busy);
            }
            BlockingGuard
        };

        let mut platform = launch(context, plugins)?;
        let code = platform.main_loop();
        platform.terminate(code);
        Ok(code)
    })
}

struct BlockingGuard;

impl Drop for BlockingGuard {
    fn drop(&mut self) {
        BLOCKING.store(false, Ordering::SeqCst);
    }
}
