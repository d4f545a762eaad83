use super::{Hook, Plugin, PluginAction};
use crate::config::PlatformConfig;

/// Closes the platform after a fixed number of frames
///
/// Useful for automated runs and benchmarks.
#[derive(Debug)]
pub struct StopAfter {
    frames: u64,
    remaining: u64,
}

impl StopAfter {
    /// Request close once `frames` frames were updated
    pub fn new(frames: u64) -> Self {
        Self {
            frames,
            remaining: frames,
        }
    }

    /// Frames left before close is requested
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Plugin for StopAfter {
    fn name(&self) -> &str {
        "stop_after"
    }

    fn hooks(&self) -> &[Hook] {
        &[Hook::OnUpdate]
    }

    fn configure(&mut self, config: &mut PlatformConfig) {
        // Run every frame even when unfocused, or the count never completes
        config.simulation.always_render = true;
    }

    fn on_update(&mut self, _delta_time: f32) -> PluginAction {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            log::info!("Stopping after {} frames", self.frames);
            PluginAction::RequestClose
        } else {
            PluginAction::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_close_on_last_frame() {
        let mut plugin = StopAfter::new(3);
        assert_eq!(plugin.on_update(0.016), PluginAction::Continue);
        assert_eq!(plugin.on_update(0.016), PluginAction::Continue);
        assert_eq!(plugin.on_update(0.016), PluginAction::RequestClose);
        assert_eq!(plugin.remaining(), 0);
    }

    #[test]
    fn test_configure_keeps_rendering_unfocused() {
        let mut config = PlatformConfig::default();
        StopAfter::new(1).configure(&mut config);
        assert!(config.simulation.always_render);
    }
}
