//! Window without a native surface

use ash::vk;

use super::{Extent, SurfaceFactory, Window, WindowEvent, WindowProperties, WindowResult};

/// Window that never presents
///
/// Resizes and closes are recorded and replayed through
/// [`process_events`](Window::process_events) like a real window would.
#[derive(Debug)]
pub struct HeadlessWindow {
    properties: WindowProperties,
    closed: bool,
    pending: Vec<WindowEvent>,
}

impl HeadlessWindow {
    /// Create a headless window with the requested extent
    pub fn new(properties: WindowProperties) -> Self {
        log::info!(
            "Created headless window '{}' ({}x{})",
            properties.title,
            properties.extent.width,
            properties.extent.height
        );
        Self {
            properties,
            closed: false,
            pending: Vec::new(),
        }
    }
}

impl Window for HeadlessWindow {
    fn properties(&self) -> &WindowProperties {
        &self.properties
    }

    fn extent(&self) -> Extent {
        self.properties.extent
    }

    fn resize(&mut self, extent: Extent) -> Extent {
        if !extent.is_empty() && extent != self.properties.extent {
            self.properties.extent = extent;
            self.pending.push(WindowEvent::Resized(extent));
        }
        self.properties.extent
    }

    fn create_surface(&mut self, _factory: &dyn SurfaceFactory) -> WindowResult<vk::SurfaceKHR> {
        Ok(vk::SurfaceKHR::null())
    }

    fn should_close(&self) -> bool {
        self.closed
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.pending.push(WindowEvent::CloseRequested);
        }
    }

    fn process_events(&mut self) -> Vec<WindowEvent> {
        std::mem::take(&mut self.pending)
    }

    fn required_surface_extensions(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingFactory;

    #[test]
    fn test_never_creates_a_surface() {
        let mut window = HeadlessWindow::new(WindowProperties::default());
        let factory = RecordingFactory::new();

        assert_eq!(window.create_surface(&factory).unwrap(), vk::SurfaceKHR::null());
        assert_eq!(factory.requests(), 0);
        assert!(window.required_surface_extensions().is_empty());
    }

    #[test]
    fn test_close_is_sticky() {
        let mut window = HeadlessWindow::new(WindowProperties::default());
        assert!(window.is_ready());

        window.close();
        window.close();

        assert!(window.should_close());
        assert!(!window.is_ready());
        assert_eq!(window.process_events(), vec![WindowEvent::CloseRequested]);
        assert!(window.process_events().is_empty());
        assert!(window.should_close());
    }

    #[test]
    fn test_resize_reports_event() {
        let mut window = HeadlessWindow::new(WindowProperties::default());

        assert_eq!(window.resize(Extent::new(640, 480)), Extent::new(640, 480));
        assert_eq!(window.resize(Extent::new(0, 480)), Extent::new(640, 480));
        assert_eq!(window.process_events(), vec![WindowEvent::Resized(Extent::new(640, 480))]);
    }
}
