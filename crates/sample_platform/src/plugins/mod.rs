//! Platform plugins
//!
//! A plugin registers for a set of [`Hook`]s when the platform initializes
//! and is called back at those points of the frame lifecycle. Hook callbacks
//! receive primitive arguments and must not block.

mod fps_logger;
mod stop_after;

pub use fps_logger::FpsLogger;
pub use stop_after::StopAfter;

use crate::application::UiOverlay;
use crate::config::PlatformConfig;
use crate::context::PlatformContext;

/// Points in the lifecycle a plugin can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Every frame, before the application updates
    OnUpdate,
    /// An application finished preparing
    OnAppStart,
    /// An application is being finished
    OnAppClose,
    /// An application failed
    OnAppError,
    /// The platform terminates
    OnPlatformClose,
    /// The overlay for this frame is being assembled
    OnUpdateUiOverlay,
}

/// What a plugin asks the platform to do after a hook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PluginAction {
    /// Nothing
    #[default]
    Continue,
    /// Close the platform at the next frame start
    RequestClose,
}

/// Lifecycle observer
pub trait Plugin: Send {
    /// Name used in logs and [`Platform::using_plugin`](crate::platform::Platform::using_plugin)
    fn name(&self) -> &str;

    /// Hooks this plugin wants to be called for
    fn hooks(&self) -> &[Hook];

    /// Whether the plugin takes part in this run
    fn is_active(&self, context: &PlatformContext) -> bool {
        let _ = context;
        true
    }

    /// Adjust the platform configuration before the window is created
    fn configure(&mut self, config: &mut PlatformConfig) {
        let _ = config;
    }

    /// Called every frame with the delta the application will see
    fn on_update(&mut self, delta_time: f32) -> PluginAction {
        let _ = delta_time;
        PluginAction::Continue
    }

    /// Called after an application prepared successfully
    fn on_app_start(&mut self, app_id: &str) {
        let _ = app_id;
    }

    /// Called before an application is finished
    fn on_app_close(&mut self, app_id: &str) {
        let _ = app_id;
    }

    /// Called when an application fails to prepare or update
    fn on_app_error(&mut self, app_id: &str, error: &str) {
        let _ = (app_id, error);
    }

    /// Called once when the platform terminates
    fn on_platform_close(&mut self) {}

    /// Called while the overlay for this frame is assembled
    fn on_update_ui_overlay(&mut self, overlay: &mut UiOverlay) {
        let _ = overlay;
    }
}
