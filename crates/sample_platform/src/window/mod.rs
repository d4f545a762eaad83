//! Window abstraction
//!
//! A [`Window`] is whatever the samples render into:
//!
//! - **`headless`**: no native surface at all, for CI and benchmarks
//! - **`glfw`**: a desktop window
//! - **`external`**: a surface owned by an external windowing runtime and
//!   bound from another thread
//!
//! Windows never talk to Vulkan directly. Surface creation goes through a
//! [`SurfaceFactory`], usually a [`VulkanInstance`].

pub mod external;
pub mod factory;
pub mod glfw;
pub mod headless;

use ash::vk;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::surface::SurfaceError;

pub use external::ExternalSurfaceWindow;
pub use factory::{SurfaceFactory, VulkanInstance};
pub use self::glfw::GlfwWindow;
pub use headless::HeadlessWindow;

/// Smallest extent a desktop window can be resized to
pub const MIN_WINDOW_WIDTH: u32 = 420;
/// Smallest extent a desktop window can be resized to
pub const MIN_WINDOW_HEIGHT: u32 = 320;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The native window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// The Vulkan loader or instance could not be set up
    #[error("Vulkan initialization failed: {0}")]
    VulkanInit(String),

    /// Vulkan surface creation failed
    #[error("Surface creation failed: {0:?}")]
    SurfaceCreation(vk::Result),

    /// The bound native surface is unusable
    #[error("Native surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// GLFW reported an error
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent {
    /// Create an extent
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamp both dimensions to at least the given minimum
    #[must_use]
    pub fn at_least(self, min: Self) -> Self {
        Self::new(self.width.max(min.width), self.height.max(min.height))
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl From<Extent> for vk::Extent2D {
    fn from(extent: Extent) -> Self {
        Self {
            width: extent.width,
            height: extent.height,
        }
    }
}

/// How a window is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// No native surface
    Headless,
    /// Regular decorated window
    #[default]
    Windowed,
    /// Exclusive fullscreen on the primary monitor
    Fullscreen,
    /// Undecorated window covering the primary monitor
    FullscreenBorderless,
}

/// Requested window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowProperties {
    /// Title bar text
    pub title: String,
    /// Presentation mode
    pub mode: WindowMode,
    /// Whether the user may resize the window
    pub resizable: bool,
    /// Whether presentation should wait for vertical blank
    pub vsync: bool,
    /// Requested extent
    pub extent: Extent,
}

impl Default for WindowProperties {
    fn default() -> Self {
        Self {
            title: "Vulkan Samples".to_string(),
            mode: WindowMode::Windowed,
            resizable: true,
            vsync: true,
            extent: Extent::default(),
        }
    }
}

/// Keys the platform itself reacts to or forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum KeyCode {
    Escape,
    Space,
    Enter,
    Up,
    Down,
    Left,
    Right,
    Other,
}

/// Something that happened to a window since the last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// The drawable extent changed
    Resized(Extent),
    /// Input focus was gained (`true`) or lost
    Focus(bool),
    /// The user or the runtime asked for the window to go away
    CloseRequested,
    /// Key input
    Key {
        /// Key that changed
        code: KeyCode,
        /// `true` on press, `false` on release
        pressed: bool,
    },
}

/// A render target driven by a [`Platform`](crate::platform::Platform)
pub trait Window {
    /// Properties the window was created with, updated on resize
    fn properties(&self) -> &WindowProperties;

    /// Current drawable extent
    fn extent(&self) -> Extent;

    /// Request a new extent; returns the extent actually in effect
    fn resize(&mut self, extent: Extent) -> Extent;

    /// Create a presentable surface through `factory`
    ///
    /// Returns a null surface, not an error, when the window has nothing to
    /// present to: headless, unbound, or closed.
    fn create_surface(&mut self, factory: &dyn SurfaceFactory) -> WindowResult<vk::SurfaceKHR>;

    /// Whether the window was closed or lost its backing surface
    fn should_close(&self) -> bool;

    /// Close the window; one-directional and idempotent
    fn close(&mut self);

    /// Drain the events observed since the last call without blocking
    fn process_events(&mut self) -> Vec<WindowEvent>;

    /// Whether the window can be rendered into right now
    fn is_ready(&self) -> bool {
        !self.should_close()
    }

    /// Ratio of physical to logical pixels
    fn dpi_factor(&self) -> f32 {
        1.0
    }

    /// Instance extensions needed to create surfaces for this window
    fn required_surface_extensions(&self) -> Vec<String>;
}

impl<W: Window + ?Sized> Window for Box<W> {
    fn properties(&self) -> &WindowProperties {
        (**self).properties()
    }

    fn extent(&self) -> Extent {
        (**self).extent()
    }

    fn resize(&mut self, extent: Extent) -> Extent {
        (**self).resize(extent)
    }

    fn create_surface(&mut self, factory: &dyn SurfaceFactory) -> WindowResult<vk::SurfaceKHR> {
        (**self).create_surface(factory)
    }

    fn should_close(&self) -> bool {
        (**self).should_close()
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn process_events(&mut self) -> Vec<WindowEvent> {
        (**self).process_events()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn dpi_factor(&self) -> f32 {
        (**self).dpi_factor()
    }

    fn required_surface_extensions(&self) -> Vec<String> {
        (**self).required_surface_extensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_clamp() {
        let min = Extent::new(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
        assert_eq!(Extent::new(100, 1000).at_least(min), Extent::new(420, 1000));
        assert!(Extent::new(0, 5).is_empty());
        assert!(!Extent::default().is_empty());
    }

    #[test]
    fn test_window_mode_names() {
        let properties: WindowProperties =
            toml::from_str("mode = \"fullscreen_borderless\"\ntitle = \"x\"").unwrap();
        assert_eq!(properties.mode, WindowMode::FullscreenBorderless);
        assert_eq!(properties.extent, Extent::new(1280, 720));
        assert!(properties.vsync);
    }
}
