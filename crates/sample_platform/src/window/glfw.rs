//! Desktop window using GLFW

use ash::vk;
use ::glfw::{Action, Key};

use super::{
    Extent, KeyCode, SurfaceFactory, Window, WindowError, WindowEvent, WindowMode,
    WindowProperties, WindowResult, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
};

/// GLFW window configured for Vulkan (no client API)
pub struct GlfwWindow {
    glfw: ::glfw::Glfw,
    window: ::glfw::PWindow,
    events: ::glfw::GlfwReceiver<(f64, ::glfw::WindowEvent)>,
    properties: WindowProperties,
    closed: bool,
}

impl GlfwWindow {
    /// Create a window as described by `properties`
    pub fn new(properties: &WindowProperties) -> WindowResult<Self> {
        let mut glfw = ::glfw::init(::glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        // Configure for Vulkan (no OpenGL context)
        glfw.window_hint(::glfw::WindowHint::ClientApi(::glfw::ClientApiHint::NoApi));
        glfw.window_hint(::glfw::WindowHint::Resizable(properties.resizable));

        let extent = properties.extent.at_least(Extent::new(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT));
        let title = properties.title.as_str();

        let created = match properties.mode {
            WindowMode::Fullscreen => glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor.map_or(::glfw::WindowMode::Windowed, |m| {
                    ::glfw::WindowMode::FullScreen(&*m)
                });
                glfw.create_window(extent.width, extent.height, title, mode)
            }),
            WindowMode::FullscreenBorderless => {
                let video_extent = glfw.with_primary_monitor(|_, monitor| {
                    monitor
                        .and_then(|m| m.get_video_mode())
                        .map(|mode| Extent::new(mode.width, mode.height))
                });
                let extent = video_extent.unwrap_or(extent);
                glfw.window_hint(::glfw::WindowHint::Decorated(false));
                glfw.create_window(extent.width, extent.height, title, ::glfw::WindowMode::Windowed)
            }
            WindowMode::Windowed | WindowMode::Headless => {
                glfw.create_window(extent.width, extent.height, title, ::glfw::WindowMode::Windowed)
            }
        };
        let (mut window, events) = created.ok_or(WindowError::CreationFailed)?;

        window.set_size_limits(Some(MIN_WINDOW_WIDTH), Some(MIN_WINDOW_HEIGHT), None, None);

        // Set up event polling
        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_focus_polling(true);
        window.set_framebuffer_size_polling(true);

        let (width, height) = window.get_framebuffer_size();
        let mut properties = properties.clone();
        properties.extent = Extent::new(to_pixels(width), to_pixels(height));

        log::info!(
            "Created GLFW window '{}' ({}x{}, {:?})",
            properties.title,
            properties.extent.width,
            properties.extent.height,
            properties.mode
        );

        Ok(Self {
            glfw,
            window,
            events,
            properties,
            closed: false,
        })
    }

    fn map_event(&mut self, event: ::glfw::WindowEvent) -> Option<WindowEvent> {
        match event {
            ::glfw::WindowEvent::FramebufferSize(width, height) => {
                let extent = Extent::new(to_pixels(width), to_pixels(height));
                self.properties.extent = extent;
                Some(WindowEvent::Resized(extent))
            }
            ::glfw::WindowEvent::Focus(focused) => Some(WindowEvent::Focus(focused)),
            ::glfw::WindowEvent::Close => Some(WindowEvent::CloseRequested),
            ::glfw::WindowEvent::Key(key, _, action, _) => {
                let pressed = match action {
                    Action::Press | Action::Repeat => true,
                    Action::Release => false,
                };
                Some(WindowEvent::Key {
                    code: map_key(key),
                    pressed,
                })
            }
            _ => None,
        }
    }
}

impl Window for GlfwWindow {
    fn properties(&self) -> &WindowProperties {
        &self.properties
    }

    fn extent(&self) -> Extent {
        self.properties.extent
    }

    fn resize(&mut self, extent: Extent) -> Extent {
        let extent = extent.at_least(Extent::new(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT));
        if self.properties.resizable && extent != self.properties.extent {
            self.window.set_size(to_glfw(extent.width), to_glfw(extent.height));
            let (width, height) = self.window.get_framebuffer_size();
            self.properties.extent = Extent::new(to_pixels(width), to_pixels(height));
        }
        self.properties.extent
    }

    fn create_surface(&mut self, factory: &dyn SurfaceFactory) -> WindowResult<vk::SurfaceKHR> {
        if self.closed {
            return Ok(vk::SurfaceKHR::null());
        }

        let mut surface = vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(factory.instance_handle(), std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::SurfaceCreation(result))
        }
    }

    fn should_close(&self) -> bool {
        self.closed || self.window.should_close()
    }

    fn close(&mut self) {
        self.closed = true;
        self.window.set_should_close(true);
    }

    fn process_events(&mut self) -> Vec<WindowEvent> {
        self.glfw.poll_events();
        let raw: Vec<_> = ::glfw::flush_messages(&self.events).map(|(_, event)| event).collect();
        raw.into_iter().filter_map(|event| self.map_event(event)).collect()
    }

    fn dpi_factor(&self) -> f32 {
        let (x_scale, _) = self.window.get_content_scale();
        x_scale
    }

    fn required_surface_extensions(&self) -> Vec<String> {
        self.glfw.get_required_instance_extensions().unwrap_or_else(|| {
            log::warn!("GLFW reports no Vulkan support on this system");
            Vec::new()
        })
    }
}

fn map_key(key: Key) -> KeyCode {
    match key {
        Key::Escape => KeyCode::Escape,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        _ => KeyCode::Other,
    }
}

fn to_pixels(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_glfw(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
