//! Window backed by a surface owned by an external windowing runtime

use std::sync::Arc;

use ash::extensions::khr;
use ash::vk;

use super::{Extent, SurfaceFactory, Window, WindowError, WindowEvent, WindowProperties, WindowResult};
use crate::external::link::ExternalSurfaceLink;

/// Window whose surface is bound, replaced and revoked from another thread
///
/// The window never owns the surface. Every query goes through the link's
/// slot, and surface creation works on a leased reference so the slot lock is
/// not held across Vulkan calls.
pub struct ExternalSurfaceWindow {
    properties: WindowProperties,
    link: Option<Arc<ExternalSurfaceLink>>,
    seen_generation: u64,
    closed: bool,
    close_reported: bool,
}

impl ExternalSurfaceWindow {
    /// Create a window reading its surface from `link`
    pub fn new(properties: &WindowProperties, link: Arc<ExternalSurfaceLink>) -> Self {
        let mut properties = properties.clone();
        let (seen_generation, info) = link.surface().observe();
        if let Some(info) = info {
            properties.extent = Extent::new(info.width, info.height);
        }

        Self {
            properties,
            link: Some(link),
            seen_generation,
            closed: false,
            close_reported: false,
        }
    }

    fn bound_extent(&self) -> Option<Extent> {
        self.link
            .as_ref()
            .and_then(|link| link.surface().get())
            .map(|info| Extent::new(info.width, info.height))
    }
}

impl Window for ExternalSurfaceWindow {
    fn properties(&self) -> &WindowProperties {
        &self.properties
    }

    fn extent(&self) -> Extent {
        self.bound_extent().unwrap_or(self.properties.extent)
    }

    fn resize(&mut self, _extent: Extent) -> Extent {
        // The runtime decides the size; report what is bound
        if let Some(extent) = self.bound_extent() {
            self.properties.extent = extent;
        }
        self.properties.extent
    }

    fn create_surface(&mut self, factory: &dyn SurfaceFactory) -> WindowResult<vk::SurfaceKHR> {
        if self.should_close() {
            return Ok(vk::SurfaceKHR::null());
        }
        let Some(mut lease) = self.link.as_ref().and_then(|link| link.surface().lease()) else {
            return Ok(vk::SurfaceKHR::null());
        };

        let result = lease.raw_window_handle().map_err(WindowError::from).and_then(|window| {
            factory
                .create_surface_from_raw(lease.raw_display_handle(), window)
                .map_err(WindowError::SurfaceCreation)
        });
        lease.release();
        result
    }

    fn should_close(&self) -> bool {
        match &self.link {
            Some(link) => self.closed || link.is_revoked() || !link.surface().is_bound(),
            None => true,
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.link = None;
    }

    fn process_events(&mut self) -> Vec<WindowEvent> {
        let mut events = Vec::new();

        if let Some(link) = &self.link {
            let (generation, info) = link.surface().observe();
            if generation != self.seen_generation {
                self.seen_generation = generation;
                if let Some(info) = info {
                    let extent = Extent::new(info.width, info.height);
                    self.properties.extent = extent;
                    events.push(WindowEvent::Resized(extent));
                }
            }
        }

        if self.should_close() && !self.close_reported {
            self.close_reported = true;
            events.push(WindowEvent::CloseRequested);
        }

        events
    }

    fn required_surface_extensions(&self) -> Vec<String> {
        [khr::Surface::name(), khr::AndroidSurface::name()]
            .iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}
