//! Application trait and sample registry

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use ash::vk;
use thiserror::Error;

use crate::context::PlatformContext;
use crate::window::{Window, WindowEvent};

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// A GPU or file resource could not be created
    #[error("Resource error: {0}")]
    Resource(String),

    /// A Vulkan call failed
    #[error("Vulkan error: {0:?}")]
    Vulkan(#[from] vk::Result),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),

    /// The application panicked; the payload message is kept
    #[error("Application panicked: {0}")]
    Panicked(String),
}

/// Everything an application gets to see while preparing
pub struct PrepareOptions<'a> {
    /// Window to create the presentable surface from
    pub window: &'a mut dyn Window,
    /// Whether the run is a benchmark (fixed timestep, no vsync expectations)
    pub benchmark_enabled: bool,
    /// Environment the platform runs in
    pub context: &'a PlatformContext,
}

/// Text collected for the on-screen overlay each frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiOverlay {
    lines: Vec<String>,
}

impl UiOverlay {
    /// Append a line
    pub fn text(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Lines collected so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drop all lines
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// A sample driven by the platform
///
/// Lifecycle: selected through [`Platform::request_application`], prepared
/// once a usable window exists, updated once per frame while prepared, and
/// finished exactly once when it is replaced, closes itself or the platform
/// terminates.
///
/// [`Platform::request_application`]: crate::platform::Platform::request_application
pub trait Application: Send {
    /// Display name
    fn name(&self) -> &str;

    /// Create GPU resources; returning `false` aborts the start
    fn prepare(&mut self, options: PrepareOptions<'_>) -> bool;

    /// Advance and render one frame
    fn update(&mut self, delta_time: f32) -> Result<(), AppError>;

    /// The window's drawable extent changed
    fn resize(&mut self, width: u32, height: u32) -> bool {
        let _ = (width, height);
        true
    }

    /// Window input forwarded by the platform
    fn input_event(&mut self, event: &WindowEvent) {
        let _ = event;
    }

    /// Contribute text to this frame's overlay
    fn update_overlay(&mut self, overlay: &mut UiOverlay) {
        let _ = overlay;
    }

    /// Whether the application wants to stop
    fn should_close(&self) -> bool {
        false
    }

    /// Release everything created in `prepare`
    fn finish(&mut self) {}

    /// Instance extensions the application needs on top of the window's
    fn required_instance_extensions(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Constructor stored in an [`AppInfo`]
pub type AppFactory = Arc<dyn Fn() -> Box<dyn Application> + Send + Sync>;

/// Registry entry describing a selectable sample
#[derive(Clone)]
pub struct AppInfo {
    /// Identifier used on the command line
    pub id: String,
    /// One-line description for listings
    pub description: String,
    create: AppFactory,
}

impl AppInfo {
    /// Describe a sample
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        create: impl Fn() -> Box<dyn Application> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            create: Arc::new(create),
        }
    }

    /// Construct a fresh instance of the sample
    pub fn create(&self) -> Box<dyn Application> {
        (self.create)()
    }
}

impl fmt::Debug for AppInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppInfo")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered set of samples, unique by id
#[derive(Debug, Default, Clone)]
pub struct AppRegistry {
    apps: Vec<AppInfo>,
}

impl AppRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self { apps: Vec::new() }
    }

    /// Add a sample, replacing one registered under the same id
    pub fn register(&mut self, info: AppInfo) {
        match self.apps.iter_mut().find(|app| app.id == info.id) {
            Some(existing) => {
                log::debug!("Replacing registered sample '{}'", info.id);
                *existing = info;
            }
            None => self.apps.push(info),
        }
    }

    /// Look up a sample by id
    pub fn get(&self, id: &str) -> Option<&AppInfo> {
        self.apps.iter().find(|app| app.id == id)
    }

    /// All samples in registration order
    pub fn iter(&self) -> impl Iterator<Item = &AppInfo> {
        self.apps.iter()
    }

    /// Number of registered samples
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run application code, turning a panic into [`AppError::Panicked`]
pub(crate) fn guarded<T>(f: impl FnOnce() -> Result<T, AppError>) -> Result<T, AppError> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(AppError::Panicked(panic_message(payload.as_ref()))))
}
