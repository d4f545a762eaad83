//! Vulkan surface creation seam

use std::ffi::{c_char, CString};

use ash::extensions::khr;
use ash::{vk, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use super::{WindowError, WindowResult};

/// Creates Vulkan surfaces for windows
///
/// Windows hand their native handles to the factory instead of holding a
/// Vulkan instance themselves.
pub trait SurfaceFactory {
    /// Instance surfaces are created on
    fn instance_handle(&self) -> vk::Instance;

    /// Create a surface for a raw native window
    fn create_surface_from_raw(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<vk::SurfaceKHR, vk::Result>;
}

/// Vulkan instance with the surface extension loaded
pub struct VulkanInstance {
    entry: Entry,
    instance: Instance,
    surface_loader: khr::Surface,
}

impl VulkanInstance {
    /// Load Vulkan and create an instance with the given extensions enabled
    pub fn new(app_name: &str, extensions: &[String]) -> WindowResult<Self> {
        let entry = unsafe { Entry::load() }
            .map_err(|e| WindowError::VulkanInit(format!("Failed to load Vulkan: {e}")))?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|e| WindowError::VulkanInit(format!("Invalid application name: {e}")))?;
        let engine_name_cstr = c"VulkanSamples";
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let cstr_extensions = extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| WindowError::VulkanInit(format!("Invalid extension name: {e}")))?;
        let extension_ptrs: Vec<*const c_char> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|e| WindowError::VulkanInit(format!("Failed to create instance: {e:?}")))?;
        let surface_loader = khr::Surface::new(&entry, &instance);

        log::info!("Created Vulkan instance for {app_name} with {} extensions", extensions.len());

        Ok(Self {
            entry,
            instance,
            surface_loader,
        })
    }

    /// The loaded entry points
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The instance
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Destroy a surface created through this instance; null is ignored
    pub fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        if surface != vk::SurfaceKHR::null() {
            unsafe { self.surface_loader.destroy_surface(surface, None) };
        }
    }
}

impl SurfaceFactory for VulkanInstance {
    fn instance_handle(&self) -> vk::Instance {
        self.instance.handle()
    }

    fn create_surface_from_raw(
        &self,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<vk::SurfaceKHR, vk::Result> {
        unsafe { ash_window::create_surface(&self.entry, &self.instance, display, window, None) }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe { self.instance.destroy_instance(None) };
    }
}
