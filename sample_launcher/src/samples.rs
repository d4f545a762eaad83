//! Samples shipped with the launcher

use ash::vk;
use sample_platform::prelude::*;

/// All samples the launcher knows
pub fn registry() -> AppRegistry {
    let mut registry = AppRegistry::new();
    registry.register(AppInfo::new(
        "hello_surface",
        "Creates a Vulkan instance and a presentable surface",
        || Box::new(HelloSurface::default()),
    ));
    registry.register(AppInfo::new("idle", "Runs frames without touching the GPU", || {
        Box::new(Idle::default())
    }));
    registry
}

/// Creates an instance and a surface through the window and keeps them alive
#[derive(Default)]
struct HelloSurface {
    instance: Option<VulkanInstance>,
    surface: vk::SurfaceKHR,
    extent: Extent,
    frames: u64,
}

impl Application for HelloSurface {
    fn name(&self) -> &str {
        "Hello Surface"
    }

    fn prepare(&mut self, options: PrepareOptions<'_>) -> bool {
        self.extent = options.window.extent();

        let extensions = options.window.required_surface_extensions();
        if extensions.is_empty() {
            log::info!("Window has nothing to present to, running without a surface");
            return true;
        }

        let instance = match VulkanInstance::new("hello_surface", &extensions) {
            Ok(instance) => instance,
            Err(e) => {
                log::error!("{e}");
                return false;
            }
        };

        match options.window.create_surface(&instance) {
            Ok(surface) => self.surface = surface,
            Err(e) => {
                log::error!("{e}");
                return false;
            }
        }
        self.instance = Some(instance);

        log::info!("Created surface {}x{}", self.extent.width, self.extent.height);
        true
    }

    fn update(&mut self, _delta_time: f32) -> Result<(), AppError> {
        self.frames += 1;
        if self.frames % 600 == 0 {
            log::debug!("Frame {}", self.frames);
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        self.extent = Extent::new(width, height);
        log::info!("Surface resized to {width}x{height}");
        true
    }

    fn update_overlay(&mut self, overlay: &mut UiOverlay) {
        overlay.text(format!("Surface: {}x{}", self.extent.width, self.extent.height));
    }

    fn finish(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.destroy_surface(self.surface);
            self.surface = vk::SurfaceKHR::null();
        }
    }
}

/// Counts frames and does nothing else
#[derive(Default)]
struct Idle {
    elapsed: f32,
}

impl Application for Idle {
    fn name(&self) -> &str {
        "Idle"
    }

    fn prepare(&mut self, _options: PrepareOptions<'_>) -> bool {
        true
    }

    fn update(&mut self, delta_time: f32) -> Result<(), AppError> {
        self.elapsed += delta_time;
        Ok(())
    }

    fn finish(&mut self) {
        log::info!("Idle ran for {:.2}s", self.elapsed);
    }
}
