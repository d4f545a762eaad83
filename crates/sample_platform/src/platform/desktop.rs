//! Desktop window backends

use super::{PlatformBackend, PlatformError};
use crate::window::{GlfwWindow, HeadlessWindow, Window, WindowMode, WindowProperties};

/// GLFW windows, or a headless window when the mode asks for one
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopBackend;

impl PlatformBackend for DesktopBackend {
    type Window = Box<dyn Window>;

    fn create_window(&mut self, properties: &WindowProperties) -> Result<Self::Window, PlatformError> {
        match properties.mode {
            WindowMode::Headless => Ok(Box::new(HeadlessWindow::new(properties.clone()))),
            WindowMode::Windowed | WindowMode::Fullscreen | WindowMode::FullscreenBorderless => {
                Ok(Box::new(GlfwWindow::new(properties)?))
            }
        }
    }
}

/// Always headless, whatever the configured mode
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessBackend;

impl PlatformBackend for HeadlessBackend {
    type Window = HeadlessWindow;

    fn create_window(&mut self, properties: &WindowProperties) -> Result<Self::Window, PlatformError> {
        let mut properties = properties.clone();
        properties.mode = WindowMode::Headless;
        Ok(HeadlessWindow::new(properties))
    }
}
