//! Configuration system
//!
//! Platform settings can come from a `platform.toml` (or `.ron`) file in the
//! context's storage directory; anything missing falls back to defaults.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

use crate::context::PlatformContext;
use crate::foundation::logging::DEFAULT_LOG_LEVEL;
use crate::window::WindowProperties;

/// Name of the optional configuration file looked up in the storage directory
pub const CONFIG_FILE_NAME: &str = "platform.toml";

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Frame pacing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// When set, every frame advances the application by `1 / fixed_fps`
    /// seconds regardless of wall-clock time
    pub fixed_fps: Option<f32>,

    /// Keep updating the application while the window is unfocused
    pub always_render: bool,
}

impl SimulationConfig {
    /// The fabricated frame delta, if a fixed simulation rate is configured
    pub fn fixed_frame_time(&self) -> Option<f32> {
        self.fixed_fps.filter(|fps| *fps > 0.0).map(|fps| 1.0 / fps)
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Preferred window configuration
    pub window: WindowProperties,

    /// Frame pacing
    pub simulation: SimulationConfig,

    /// Forward window input to the active application
    pub process_input_events: bool,

    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            window: WindowProperties::default(),
            simulation: SimulationConfig::default(),
            process_input_events: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config for PlatformConfig {}

impl PlatformConfig {
    /// Load `platform.toml` from the context's storage directory
    ///
    /// A missing file yields the defaults. A malformed file is reported and
    /// also yields the defaults, so a bad config never prevents a sample from
    /// starting.
    pub fn load_or_default(context: &PlatformContext) -> Self {
        let path = context.external_storage_directory().join(CONFIG_FILE_NAME);
        Self::load_or_default_from(&path)
    }

    /// Load a configuration file, falling back to the defaults
    pub fn load_or_default_from(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }

        let Some(path_str) = path.to_str() else {
            log::warn!("Ignoring config with non UTF-8 path: {}", path.display());
            return Self::default();
        };

        match Self::load_from_file(path_str) {
            Ok(config) => {
                log::info!("Loaded platform config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Could not load {}: {e}. Using defaults.", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Extent, WindowMode};

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PlatformConfig = toml::from_str(
            r#"
            log_level = "debug"

            [window]
            mode = "headless"

            [simulation]
            fixed_fps = 30.0
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.window.mode, WindowMode::Headless);
        assert_eq!(config.window.extent, Extent::new(1280, 720));
        assert!(config.process_input_events);
        assert!((config.simulation.fixed_frame_time().unwrap() - 1.0 / 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_non_positive_fixed_fps_is_ignored() {
        let simulation = SimulationConfig {
            fixed_fps: Some(0.0),
            always_render: false,
        };
        assert_eq!(simulation.fixed_frame_time(), None);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlatformConfig::load_or_default_from(&dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(config, PlatformConfig::default());
    }

    #[test]
    fn test_load_or_default_reads_storage_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut expected = PlatformConfig::default();
        expected.window.title = "From disk".to_string();
        expected.simulation.always_render = true;
        expected.save_to_file(path.to_str().unwrap()).unwrap();

        let context = PlatformContext::new(Vec::new()).with_external_storage_directory(dir.path());
        assert_eq!(PlatformConfig::load_or_default(&context), expected);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "window = [").unwrap();
        assert_eq!(PlatformConfig::load_or_default_from(&path), PlatformConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform.json");
        std::fs::write(&path, "{}").unwrap();

        let result = PlatformConfig::load_from_file(path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
