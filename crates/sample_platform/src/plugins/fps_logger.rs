use super::{Hook, Plugin, PluginAction};
use crate::application::UiOverlay;

const HOOKS: [Hook; 3] = [Hook::OnUpdate, Hook::OnAppClose, Hook::OnUpdateUiOverlay];

/// Logs the frame rate at a fixed interval and shows it in the overlay
#[derive(Debug)]
pub struct FpsLogger {
    interval: f32,
    elapsed: f32,
    frames: u32,
    total_time: f32,
    total_frames: u64,
    last_fps: Option<f32>,
}

impl FpsLogger {
    /// Log every `interval` seconds
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            elapsed: 0.0,
            frames: 0,
            total_time: 0.0,
            total_frames: 0,
            last_fps: None,
        }
    }

    /// Frame rate over the last completed interval
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    /// Frames seen since the last application closed
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Default for FpsLogger {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Plugin for FpsLogger {
    fn name(&self) -> &str {
        "fps_logger"
    }

    fn hooks(&self) -> &[Hook] {
        &HOOKS
    }

    #[allow(clippy::cast_precision_loss)]
    fn on_update(&mut self, delta_time: f32) -> PluginAction {
        self.elapsed += delta_time;
        self.total_time += delta_time;
        self.frames += 1;
        self.total_frames += 1;

        if self.elapsed >= self.interval {
            let fps = self.frames as f32 / self.elapsed;
            log::info!("FPS: {fps:.1}");
            self.last_fps = Some(fps);
            self.elapsed = 0.0;
            self.frames = 0;
        }
        PluginAction::Continue
    }

    #[allow(clippy::cast_precision_loss)]
    fn on_app_close(&mut self, app_id: &str) {
        if self.total_time > 0.0 {
            log::info!(
                "{app_id}: {} frames in {:.2}s ({:.1} FPS average)",
                self.total_frames,
                self.total_time,
                self.total_frames as f32 / self.total_time
            );
        }
        *self = Self::new(self.interval);
    }

    fn on_update_ui_overlay(&mut self, overlay: &mut UiOverlay) {
        if let Some(fps) = self.last_fps {
            overlay.text(format!("FPS: {fps:.1}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_after_interval() {
        let mut logger = FpsLogger::new(1.0);
        for _ in 0..9 {
            logger.on_update(0.1);
        }
        assert_eq!(logger.last_fps(), None);

        logger.on_update(0.1001);
        let fps = logger.last_fps().unwrap();
        assert!((fps - 10.0).abs() < 0.1);

        let mut overlay = UiOverlay::default();
        logger.on_update_ui_overlay(&mut overlay);
        assert_eq!(overlay.lines().len(), 1);
        assert!(overlay.lines()[0].starts_with("FPS: "));
    }

    #[test]
    fn test_app_close_resets() {
        let mut logger = FpsLogger::default();
        logger.on_update(0.5);
        assert_eq!(logger.total_frames(), 1);

        logger.on_app_close("idle");
        assert_eq!(logger.total_frames(), 0);
        assert_eq!(logger.last_fps(), None);
    }
}
