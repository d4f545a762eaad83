//! # Sample Platform
//!
//! Platform, window and frame-lifecycle layer for running Vulkan samples on
//! desktop windows, headless, and on surfaces owned by an external windowing
//! runtime.
//!
//! ## Features
//!
//! - **Platform state machine**: window, application and plugin lifecycle
//!   with contained application failures
//! - **Windows**: GLFW desktop windows, headless windows and externally bound
//!   surfaces behind one [`Window`](window::Window) trait
//! - **External driver**: process-wide bind / initialize / render-one-frame /
//!   terminate entry points, as a Rust API and as a C ABI
//! - **Plugins**: lifecycle hooks for statistics and automation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sample_platform::prelude::*;
//!
//! struct Clear;
//!
//! impl Application for Clear {
//!     fn name(&self) -> &str {
//!         "clear"
//!     }
//!
//!     fn prepare(&mut self, _options: PrepareOptions<'_>) -> bool {
//!         true
//!     }
//!
//!     fn update(&mut self, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     let mut platform = Platform::new(DesktopBackend, PlatformContext::desktop());
//!     let code = platform.initialize(vec![Box::new(FpsLogger::default())]);
//!     if code != ExitCode::Success {
//!         return code.into();
//!     }
//!
//!     platform.request_application(Some(AppInfo::new("clear", "Clears the screen", || {
//!         Box::new(Clear)
//!     })));
//!     let code = platform.main_loop();
//!     platform.terminate(code);
//!     code.into()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod application;
pub mod config;
pub mod context;
pub mod external;
pub mod foundation;
pub mod platform;
pub mod plugins;
pub mod surface;
pub mod window;

#[cfg(any(test, feature = "mock"))]
pub mod testing;

pub use application::{AppError, AppInfo, AppRegistry, Application, PrepareOptions, UiOverlay};
pub use platform::{ExitCode, Platform, PlatformBackend, PlatformError, PlatformState};

/// Common imports for platform users
pub mod prelude {
    pub use crate::{
        application::{AppError, AppInfo, AppRegistry, Application, PrepareOptions, UiOverlay},
        config::{Config, PlatformConfig, SimulationConfig},
        context::PlatformContext,
        foundation::time::{Stopwatch, Timer},
        platform::{
            DesktopBackend, ExitCode, ExternalSurfacePlatform, HeadlessBackend, Platform,
            PlatformBackend, PlatformState,
        },
        plugins::{FpsLogger, Hook, Plugin, PluginAction, StopAfter},
        surface::{NativeSurface, SurfaceHandle, SurfaceInfo},
        window::{Extent, SurfaceFactory, VulkanInstance, Window, WindowEvent, WindowMode, WindowProperties},
    };
}
