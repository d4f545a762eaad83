//! Platform whose surface is owned by an external windowing runtime
//!
//! The runtime binds, replaces and revokes the surface from its own thread
//! while frames are stepped from outside, one `main_loop_frame` per tick.

use std::sync::Arc;

use super::{ExitCode, Platform, PlatformBackend, PlatformError};
use crate::application::AppInfo;
use crate::config::PlatformConfig;
use crate::context::PlatformContext;
use crate::external::link::ExternalSurfaceLink;
use crate::external::registry;
use crate::plugins::Plugin;
use crate::surface::SurfaceHandle;
use crate::window::{ExternalSurfaceWindow, WindowProperties};

/// Prefix of the notification sent when a sample fails to launch
pub const LAUNCH_FAILURE_MESSAGE: &str = "Error! Could not launch selected sample:";

/// Creates [`ExternalSurfaceWindow`]s on the platform's link
pub struct ExternalSurfaceBackend {
    link: Arc<ExternalSurfaceLink>,
}

impl ExternalSurfaceBackend {
    /// Backend reading its surface from `link`
    pub fn new(link: Arc<ExternalSurfaceLink>) -> Self {
        Self { link }
    }
}

impl PlatformBackend for ExternalSurfaceBackend {
    type Window = ExternalSurfaceWindow;

    fn create_window(&mut self, properties: &WindowProperties) -> Result<Self::Window, PlatformError> {
        if self.link.is_revoked() || !self.link.surface().is_bound() {
            return Err(PlatformError::NoSurface);
        }
        Ok(ExternalSurfaceWindow::new(properties, Arc::clone(&self.link)))
    }
}

/// [`Platform`] driven by an external runtime
///
/// The platform holds the only strong reference to its
/// [`ExternalSurfaceLink`]; the process-wide registry only sees a `Weak`
/// while the platform is registered.
pub struct ExternalSurfacePlatform {
    platform: Platform<ExternalSurfaceBackend>,
    link: Arc<ExternalSurfaceLink>,
    registered: bool,
    terminated: bool,
}

impl ExternalSurfacePlatform {
    /// Create a platform, reading `platform.toml` from the context's storage directory
    pub fn new(context: PlatformContext) -> Self {
        let config = PlatformConfig::load_or_default(&context);
        Self::with_config(context, config)
    }

    /// Create a platform with an explicit configuration
    pub fn with_config(context: PlatformContext, config: PlatformConfig) -> Self {
        let link = Arc::new(ExternalSurfaceLink::new());
        let backend = ExternalSurfaceBackend::new(Arc::clone(&link));
        Self {
            platform: Platform::with_config(backend, context, config),
            link,
            registered: false,
            terminated: false,
        }
    }

    /// Make this the platform surface bindings are forwarded to
    pub fn register_as_active(&mut self) {
        registry::set_active_platform(&self.link);
        self.registered = true;
    }

    /// Bind, replace (`Some`) or revoke (`None`) the surface directly
    pub fn set_external_surface(&self, handle: Option<SurfaceHandle>) {
        match handle {
            Some(handle) => self.link.surface().set_handle(handle),
            None => self.link.revoke(),
        }
    }

    /// Offer a surface taken from a source slot at `source_generation`
    pub fn offer_surface(&self, source_generation: u64, handle: Option<SurfaceHandle>) -> bool {
        self.link.offer(source_generation, handle)
    }

    /// See [`Platform::initialize`]; requires a bound surface
    pub fn initialize(&mut self, plugins: Vec<Box<dyn Plugin>>) -> ExitCode {
        self.platform.initialize(plugins)
    }

    /// Select the application to start once the surface is usable
    pub fn request_application(&mut self, app: Option<AppInfo>) {
        self.platform.request_application(app);
    }

    /// Run one externally triggered frame
    pub fn main_loop_frame(&mut self) -> ExitCode {
        if self.link.take_deselect_request() {
            self.platform.request_application(None);
        }
        self.platform.main_loop_frame()
    }

    /// Run frames until the surface is revoked or close is requested
    pub fn main_loop(&mut self) -> ExitCode {
        loop {
            match self.main_loop_frame() {
                ExitCode::Success => {}
                ExitCode::Close => return ExitCode::Success,
                code => return code,
            }
        }
    }

    /// Tear down; idempotent
    ///
    /// Deregisters first so no binding can reach a platform mid-teardown,
    /// then reports the outcome to the user, drains pending lifecycle
    /// requests, terminates the platform and gives the surface back.
    pub fn terminate(&mut self, code: ExitCode) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if self.registered {
            registry::clear_active_platform(&self.link);
            self.registered = false;
        }

        match code {
            ExitCode::FatalError => {
                let error = self.platform.last_error().unwrap_or("unknown error").to_string();
                self.send_notification(&format!("{LAUNCH_FAILURE_MESSAGE} {error}"));
            }
            ExitCode::Success | ExitCode::Close => self.platform.clear_last_error(),
            ExitCode::NoSample | ExitCode::Help => {}
        }

        if self.link.take_deselect_request() {
            self.platform.request_application(None);
        }
        self.platform.terminate(code);
        self.link.release_surface();
    }

    /// Show a message through the context's notification channel
    pub fn send_notification(&self, message: &str) -> bool {
        log::info!("Notification: {message}");
        self.platform.context().notify(message)
    }

    /// Whether this platform is the registered one
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The link shared with the binding thread
    pub fn link(&self) -> &Arc<ExternalSurfaceLink> {
        &self.link
    }

    /// The wrapped platform
    pub fn platform(&self) -> &Platform<ExternalSurfaceBackend> {
        &self.platform
    }

    /// Mutable access to the wrapped platform
    pub fn platform_mut(&mut self) -> &mut Platform<ExternalSurfaceBackend> {
        &mut self.platform
    }
}

impl Drop for ExternalSurfacePlatform {
    fn drop(&mut self) {
        self.terminate(ExitCode::Success);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::context::Notifier;
    use crate::platform::PlatformState;
    use crate::testing::{AppBehavior, EventLog, MockSurface, RecordingApp};

    #[derive(Default)]
    struct Messages(Mutex<Vec<String>>);

    impl Notifier for Messages {
        fn notify(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn platform_with(messages: &Arc<Messages>) -> ExternalSurfacePlatform {
        let context = PlatformContext::new(vec!["vulkan_samples".into()]).with_notifier(messages.clone());
        ExternalSurfacePlatform::with_config(context, PlatformConfig::default())
    }

    #[test]
    fn test_initialize_without_surface_closes() {
        let messages = Arc::new(Messages::default());
        let mut platform = platform_with(&messages);

        assert_eq!(platform.initialize(Vec::new()), ExitCode::Close);
        assert_eq!(platform.platform().state(), PlatformState::Uninitialized);
    }

    #[test]
    fn test_replacement_reaches_app_before_next_update() {
        let messages = Arc::new(Messages::default());
        let log = EventLog::new();
        let mut platform = platform_with(&messages);
        let a = MockSurface::new(100, 200);
        let b = MockSurface::new(50, 50);

        platform.set_external_surface(SurfaceHandle::acquire(a.clone()).ok());
        assert_eq!(platform.initialize(Vec::new()), ExitCode::Success);
        platform.request_application(Some(RecordingApp::info("recording", &log, AppBehavior::default())));
        assert_eq!(platform.main_loop_frame(), ExitCode::Success);
        assert_eq!(log.events(), ["prepare 100x200", "update"]);

        platform.set_external_surface(SurfaceHandle::acquire(b.clone()).ok());
        assert_eq!(a.ref_count(), 0);
        assert_eq!(platform.main_loop_frame(), ExitCode::Success);
        assert_eq!(log.events()[2..], ["resize 50x50", "update"]);

        platform.terminate(ExitCode::Success);
        assert_eq!(b.ref_count(), 0);
    }

    #[test]
    fn test_revocation_stops_rendering() {
        let messages = Arc::new(Messages::default());
        let log = EventLog::new();
        let mut platform = platform_with(&messages);
        let a = MockSurface::new(100, 200);

        platform.set_external_surface(SurfaceHandle::acquire(a.clone()).ok());
        platform.initialize(Vec::new());
        platform.request_application(Some(RecordingApp::info("recording", &log, AppBehavior::default())));
        platform.main_loop_frame();

        platform.set_external_surface(None);
        assert_eq!(a.ref_count(), 0);
        assert_eq!(platform.main_loop_frame(), ExitCode::Close);
        assert_eq!(platform.main_loop_frame(), ExitCode::Close);
        assert_eq!(log.count("update"), 1);
    }

    #[test]
    fn test_fatal_terminate_notifies() {
        let messages = Arc::new(Messages::default());
        let log = EventLog::new();
        let mut platform = platform_with(&messages);
        let behavior = AppBehavior {
            fail_prepare: true,
            ..AppBehavior::default()
        };

        platform.set_external_surface(SurfaceHandle::acquire(MockSurface::new(10, 10)).ok());
        platform.initialize(Vec::new());
        platform.request_application(Some(RecordingApp::info("broken", &log, behavior)));
        let code = platform.main_loop_frame();
        platform.terminate(code);
        platform.terminate(code);

        assert_eq!(
            *messages.0.lock().unwrap(),
            ["Error! Could not launch selected sample: Failed to prepare sample 'broken'"]
        );
    }

    #[test]
    fn test_successful_terminate_clears_error() {
        let messages = Arc::new(Messages::default());
        let mut platform = platform_with(&messages);
        platform.platform_mut().set_last_error("earlier failure");

        platform.terminate(ExitCode::Success);

        assert_eq!(platform.platform().last_error(), None);
        assert!(messages.0.lock().unwrap().is_empty());
    }
}
