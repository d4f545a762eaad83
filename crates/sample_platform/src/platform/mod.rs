//! Platform: window, application and plugin lifecycle
//!
//! A [`Platform`] owns one window and at most one active application and
//! drives them frame by frame:
//!
//! ```text
//! Uninitialized ──initialize──▶ Initialized ──main_loop_frame──▶ Running
//!       │                            │                              │
//!       └────────────────────────────┴──────────terminate───────────┴──▶ Terminated
//! ```
//!
//! A failed `initialize` leaves the platform `Uninitialized` so it can be
//! retried. Where windows come from is up to the [`PlatformBackend`]:
//! [`DesktopBackend`] for GLFW and headless windows, [`ExternalSurfaceBackend`]
//! for surfaces bound by an external runtime.

mod desktop;
pub mod external;

use std::collections::HashMap;

use thiserror::Error;

pub use desktop::{DesktopBackend, HeadlessBackend};
pub use external::{ExternalSurfaceBackend, ExternalSurfacePlatform};

use crate::application::{guarded, AppError, AppInfo, Application, PrepareOptions, UiOverlay};
use crate::config::PlatformConfig;
use crate::context::PlatformContext;
use crate::foundation::logging;
use crate::foundation::time::{Stopwatch, Timer};
use crate::plugins::{Hook, Plugin, PluginAction};
use crate::window::{Extent, KeyCode, Window, WindowError, WindowEvent, WindowProperties};

/// Outward result of platform operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    /// Everything went fine
    Success = 0,
    /// No application was selected
    NoSample,
    /// Usage or listing was printed
    Help,
    /// The platform has nothing to present to, or was asked to close
    Close,
    /// An application or the platform failed
    FatalError,
}

impl ExitCode {
    /// Whether the code reports a failure
    pub const fn is_error(self) -> bool {
        matches!(self, Self::NoSample | Self::FatalError)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Lifecycle state of a [`Platform`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformState {
    /// Created, or a previous `initialize` failed
    Uninitialized,
    /// Window and plugins are set up
    Initialized,
    /// At least one frame ran
    Running,
    /// Torn down; no further frames
    Terminated,
}

/// Platform errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// There is no surface to create a window for
    #[error("No surface available")]
    NoSurface,

    /// The window could not be created
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// The operation needs an initialized platform
    #[error("Platform is not initialized")]
    NotInitialized,

    /// The platform was already terminated
    #[error("Platform was terminated")]
    Terminated,
}

/// Where a platform gets its window from
pub trait PlatformBackend {
    /// Window type created by this backend
    type Window: Window + 'static;

    /// Create the window for `properties`
    ///
    /// [`PlatformError::NoSurface`] means "nothing to present to yet" and
    /// makes `initialize` return [`ExitCode::Close`].
    fn create_window(&mut self, properties: &WindowProperties) -> Result<Self::Window, PlatformError>;
}

struct ActiveApp {
    id: String,
    app: Box<dyn Application>,
}

/// Owns the window, the active application and the plugins
pub struct Platform<B: PlatformBackend> {
    backend: B,
    context: PlatformContext,
    config: PlatformConfig,
    state: PlatformState,
    window: Option<B::Window>,
    active_app: Option<ActiveApp>,
    requested_app: Option<AppInfo>,
    plugins: Vec<Box<dyn Plugin>>,
    hooks: HashMap<Hook, Vec<usize>>,
    overlay: UiOverlay,
    timer: Timer,
    app_runtime: Stopwatch,
    focused: bool,
    close_requested: bool,
    last_error: Option<String>,
}

impl<B: PlatformBackend> Platform<B> {
    /// Create a platform, reading `platform.toml` from the context's storage directory
    pub fn new(backend: B, context: PlatformContext) -> Self {
        let config = PlatformConfig::load_or_default(&context);
        Self::with_config(backend, context, config)
    }

    /// Create a platform with an explicit configuration
    pub fn with_config(backend: B, context: PlatformContext, config: PlatformConfig) -> Self {
        Self {
            backend,
            context,
            config,
            state: PlatformState::Uninitialized,
            window: None,
            active_app: None,
            requested_app: None,
            plugins: Vec::new(),
            hooks: HashMap::new(),
            overlay: UiOverlay::default(),
            timer: Timer::new(),
            app_runtime: Stopwatch::new(),
            focused: false,
            close_requested: false,
            last_error: None,
        }
    }

    /// Activate plugins, register their hooks and create the window
    ///
    /// Returns [`ExitCode::Close`] when the backend has nothing to present to
    /// and [`ExitCode::FatalError`] when window creation failed. In both cases
    /// the platform stays `Uninitialized`.
    pub fn initialize(&mut self, plugins: Vec<Box<dyn Plugin>>) -> ExitCode {
        match self.state {
            PlatformState::Uninitialized => {}
            PlatformState::Initialized | PlatformState::Running => {
                log::warn!("Platform is already initialized");
                return ExitCode::Success;
            }
            PlatformState::Terminated => {
                log::error!("{}", PlatformError::Terminated);
                return ExitCode::FatalError;
            }
        }

        logging::init_with_level(&self.config.log_level);

        for mut plugin in plugins {
            if !plugin.is_active(&self.context) {
                log::debug!("Plugin '{}' is inactive", plugin.name());
                continue;
            }
            plugin.configure(&mut self.config);

            let index = self.plugins.len();
            for hook in plugin.hooks() {
                self.hooks.entry(*hook).or_default().push(index);
            }
            log::info!("Activated plugin '{}'", plugin.name());
            self.plugins.push(plugin);
        }

        match self.backend.create_window(&self.config.window) {
            Ok(window) => self.window = Some(window),
            Err(PlatformError::NoSurface) => {
                log::warn!("No surface available, closing");
                self.deactivate_plugins();
                return ExitCode::Close;
            }
            Err(e) => {
                log::error!("Failed to create window: {e}");
                self.set_last_error(e.to_string());
                self.deactivate_plugins();
                return ExitCode::FatalError;
            }
        }

        self.focused = true;
        self.close_requested = false;
        self.timer.reset();
        self.state = PlatformState::Initialized;
        ExitCode::Success
    }

    /// Run frames until close is requested or the window closes
    pub fn main_loop(&mut self) -> ExitCode {
        loop {
            match self.main_loop_frame() {
                ExitCode::Success => {}
                ExitCode::Close => return ExitCode::Success,
                code => return code,
            }
        }
    }

    /// Run one frame
    ///
    /// Processes window events, starts a pending application once the
    /// window is usable and advances the active one. Returns
    /// [`ExitCode::Close`] once the platform or window is closing,
    /// [`ExitCode::NoSample`] when there is nothing to run and
    /// [`ExitCode::FatalError`] when the application failed (it is torn down,
    /// the platform survives).
    pub fn main_loop_frame(&mut self) -> ExitCode {
        match self.state {
            PlatformState::Initialized | PlatformState::Running => {}
            PlatformState::Uninitialized | PlatformState::Terminated => {
                log::error!("{}", PlatformError::NotInitialized);
                return ExitCode::FatalError;
            }
        }
        self.state = PlatformState::Running;

        if self.process_window_events() == ExitCode::FatalError {
            return ExitCode::FatalError;
        }

        if self.is_closing() {
            return ExitCode::Close;
        }

        if self.requested_app.is_some() && self.window.as_ref().is_some_and(Window::is_ready) && !self.start_app() {
            return ExitCode::FatalError;
        }

        if self.active_app.is_none() {
            return ExitCode::NoSample;
        }

        if !self.focused && !self.config.simulation.always_render {
            return ExitCode::Success;
        }

        self.update()
    }

    /// Advance the active application by one frame
    pub fn update(&mut self) -> ExitCode {
        let elapsed = self.timer.tick();
        let delta_time = self.config.simulation.fixed_frame_time().unwrap_or(elapsed);

        let mut close = false;
        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnUpdate, |plugin| {
            close |= plugin.on_update(delta_time) == PluginAction::RequestClose;
        });
        if close {
            self.close();
        }

        let Some(active) = self.active_app.as_mut() else {
            return ExitCode::NoSample;
        };

        self.overlay.clear();
        let overlay = &mut self.overlay;
        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnUpdateUiOverlay, |plugin| {
            plugin.on_update_ui_overlay(overlay);
        });

        let app = &mut active.app;
        let result = guarded(|| {
            app.update_overlay(overlay);
            app.update(delta_time)
        });

        match result {
            Ok(()) => {
                if app.should_close() {
                    log::info!("Sample '{}' requested close", active.id);
                    self.finish_app();
                    self.close();
                }
                ExitCode::Success
            }
            Err(e) => self.app_failed(e),
        }
    }

    /// Tear everything down
    ///
    /// Idempotent and safe on a platform that was never initialized.
    pub fn terminate(&mut self, code: ExitCode) {
        match self.state {
            PlatformState::Terminated => return,
            PlatformState::Uninitialized => {
                self.requested_app = None;
                self.state = PlatformState::Terminated;
                return;
            }
            PlatformState::Initialized | PlatformState::Running => {}
        }

        self.requested_app = None;
        self.finish_app();
        self.window = None;

        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnPlatformClose, |plugin| {
            plugin.on_platform_close();
        });
        self.deactivate_plugins();

        if code == ExitCode::FatalError {
            log::error!(
                "Platform terminated with error: {}",
                self.last_error.as_deref().unwrap_or("unknown")
            );
        } else {
            log::info!("Platform terminated ({code:?})");
        }
        self.state = PlatformState::Terminated;
    }

    /// Select the application to start at the next usable frame
    ///
    /// `None` cancels a pending request and leaves the running application
    /// and the window alone.
    pub fn request_application(&mut self, app: Option<AppInfo>) {
        match &app {
            Some(info) => log::info!("Requested sample '{}'", info.id),
            None if self.requested_app.is_some() => log::info!("Cancelled pending sample request"),
            None => {}
        }
        self.requested_app = app;
    }

    /// Whether an application is waiting to be started
    pub fn app_requested(&self) -> bool {
        self.requested_app.is_some()
    }

    /// Start the pending application, finishing the active one first
    ///
    /// Returns `false` when the application could not be prepared; the error
    /// is recorded in [`last_error`](Self::last_error).
    pub fn start_app(&mut self) -> bool {
        let Some(info) = self.requested_app.take() else {
            return true;
        };
        self.finish_app();

        if self.window.is_none() {
            log::error!("Cannot start '{}' without a window", info.id);
            self.set_last_error(format!("No window to start '{}'", info.id));
            return false;
        }
        let Some(window) = self.window.as_mut() else {
            return false;
        };

        let benchmark_enabled = self.config.simulation.fixed_fps.is_some();
        let context = &self.context;
        let prepared = guarded(|| {
            let mut app = info.create();
            let ok = app.prepare(PrepareOptions {
                window,
                benchmark_enabled,
                context,
            });
            Ok((app, ok))
        });

        let app = match prepared {
            Ok((app, true)) => app,
            Ok((_, false)) => {
                return self.start_failed(&info.id, &format!("Failed to prepare sample '{}'", info.id));
            }
            Err(e) => return self.start_failed(&info.id, &e.to_string()),
        };

        log::info!("Started sample '{}' ({})", info.id, app.name());
        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnAppStart, |plugin| {
            plugin.on_app_start(&info.id);
        });
        self.active_app = Some(ActiveApp { id: info.id, app });
        self.timer.reset();
        self.app_runtime.restart();
        true
    }

    /// Ask the platform to close at the next frame start
    pub fn close(&mut self) {
        self.close_requested = true;
        if let Some(window) = self.window.as_mut() {
            window.close();
        }
    }

    /// Resize the window and tell the application the extent in effect
    pub fn resize(&mut self, width: u32, height: u32) -> ExitCode {
        let Some(window) = self.window.as_mut() else {
            return ExitCode::Success;
        };
        let extent = window.resize(Extent::new(width, height));
        self.notify_resize(extent)
    }

    /// Forward window input to the application
    ///
    /// Escape closes the platform.
    pub fn input_event(&mut self, event: WindowEvent) -> ExitCode {
        if let WindowEvent::Key {
            code: KeyCode::Escape,
            pressed: true,
        } = event
        {
            self.close();
            return ExitCode::Success;
        }

        if !self.config.process_input_events {
            return ExitCode::Success;
        }
        let Some(active) = self.active_app.as_mut() else {
            return ExitCode::Success;
        };

        let app = &mut active.app;
        match guarded(|| {
            app.input_event(&event);
            Ok(())
        }) {
            Ok(()) => ExitCode::Success,
            Err(e) => self.app_failed(e),
        }
    }

    /// Record focus; unfocused platforms skip updates unless rendering is forced
    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Advance the application by `1 / fps` seconds every frame
    pub fn force_simulation_fps(&mut self, fps: f32) {
        self.config.simulation.fixed_fps = Some(fps);
    }

    /// Keep updating while unfocused
    pub fn force_render(&mut self, always_render: bool) {
        self.config.simulation.always_render = always_render;
    }

    /// Stop forwarding input to the application
    pub fn disable_input_processing(&mut self) {
        self.config.process_input_events = false;
    }

    /// Last recorded failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record a failure
    pub fn set_last_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Forget the last failure
    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Whether an active plugin with this name is registered
    pub fn using_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|plugin| plugin.name() == name)
    }

    /// Lifecycle state
    pub fn state(&self) -> PlatformState {
        self.state
    }

    /// Effective configuration
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Environment the platform runs in
    pub fn context(&self) -> &PlatformContext {
        &self.context
    }

    /// The window, once initialized
    pub fn window(&self) -> Option<&B::Window> {
        self.window.as_ref()
    }

    /// Mutable access to the window
    pub fn window_mut(&mut self) -> Option<&mut B::Window> {
        self.window.as_mut()
    }

    /// Id of the running application
    pub fn active_app_id(&self) -> Option<&str> {
        self.active_app.as_ref().map(|active| active.id.as_str())
    }

    /// Overlay text assembled in the last frame
    pub fn overlay(&self) -> &UiOverlay {
        &self.overlay
    }

    /// Whether the platform has input focus
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether the platform will close at the next frame start
    pub fn is_closing(&self) -> bool {
        self.close_requested || self.window.as_ref().map_or(true, Window::should_close)
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn process_window_events(&mut self) -> ExitCode {
        let events = match self.window.as_mut() {
            Some(window) => window.process_events(),
            None => return ExitCode::Success,
        };

        for event in events {
            let code = match event {
                WindowEvent::Resized(extent) => self.notify_resize(extent),
                WindowEvent::Focus(focused) => {
                    self.set_focus(focused);
                    ExitCode::Success
                }
                WindowEvent::CloseRequested => {
                    log::debug!("Window requested close");
                    self.close_requested = true;
                    ExitCode::Success
                }
                WindowEvent::Key { .. } => self.input_event(event),
            };
            if code == ExitCode::FatalError {
                return code;
            }
        }
        ExitCode::Success
    }

    fn notify_resize(&mut self, extent: Extent) -> ExitCode {
        let Some(active) = self.active_app.as_mut() else {
            return ExitCode::Success;
        };
        log::debug!("Resizing '{}' to {}x{}", active.id, extent.width, extent.height);

        let app = &mut active.app;
        match guarded(|| Ok(app.resize(extent.width, extent.height))) {
            Ok(_) => ExitCode::Success,
            Err(e) => self.app_failed(e),
        }
    }

    fn start_failed(&mut self, id: &str, error: &str) -> bool {
        log::error!("{error}");
        self.set_last_error(error);
        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnAppError, |plugin| {
            plugin.on_app_error(id, error);
        });
        false
    }

    fn app_failed(&mut self, error: AppError) -> ExitCode {
        let id = self.active_app_id().unwrap_or("unknown").to_string();
        let message = error.to_string();
        log::error!("Sample '{id}' failed: {message}");

        self.set_last_error(message.clone());
        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnAppError, |plugin| {
            plugin.on_app_error(&id, &message);
        });
        self.finish_app();
        ExitCode::FatalError
    }

    fn finish_app(&mut self) {
        let Some(mut active) = self.active_app.take() else {
            return;
        };

        dispatch(&mut self.plugins, &mut self.hooks, Hook::OnAppClose, |plugin| {
            plugin.on_app_close(&active.id);
        });

        let app = &mut active.app;
        if let Err(e) = guarded(|| {
            app.finish();
            Ok(())
        }) {
            log::error!("Sample '{}' failed to finish: {e}", active.id);
        }
        let runtime = self.app_runtime.stop();
        log::info!("Finished sample '{}' after {:.2}s", active.id, runtime.as_secs_f32());
    }

    fn deactivate_plugins(&mut self) {
        self.plugins.clear();
        self.hooks.clear();
    }
}

impl<B: PlatformBackend> Drop for Platform<B> {
    fn drop(&mut self) {
        self.terminate(ExitCode::Success);
    }
}

/// Run `f` on every plugin registered for `hook`
///
/// A plugin that panics is logged and stops receiving hooks.
fn dispatch(
    plugins: &mut [Box<dyn Plugin>],
    hooks: &mut HashMap<Hook, Vec<usize>>,
    hook: Hook,
    mut f: impl FnMut(&mut dyn Plugin),
) {
    let Some(indices) = hooks.get(&hook) else {
        return;
    };

    let mut failed = Vec::new();
    for &index in indices {
        let plugin = plugins[index].as_mut();
        if let Err(e) = guarded(|| {
            f(plugin);
            Ok(())
        }) {
            log::error!("Plugin '{}' failed in {hook:?}, disabling it: {e}", plugins[index].name());
            failed.push(index);
        }
    }

    if !failed.is_empty() {
        for indices in hooks.values_mut() {
            indices.retain(|index| !failed.contains(index));
        }
    }
}
