//! Logging utilities
//!
//! All library code logs through the `log` facade. The backend is `env_logger`,
//! installed at most once per process: the desktop launcher installs it from
//! `main`, while externally driven hosts get it when their first platform
//! initializes, so the platform configuration's level applies.

use std::sync::{Once, OnceLock};

pub use log::{debug, error, info, trace, warn};

/// Filter used when neither `RUST_LOG` nor the platform configuration sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

static INIT: Once = Once::new();
static LEVEL: OnceLock<String> = OnceLock::new();

/// Initialize the logging system with the default level
pub fn init() {
    init_with_level(DEFAULT_LOG_LEVEL);
}

/// Initialize the logging system
///
/// `RUST_LOG` wins over `level`. Repeated calls are no-ops, and a logger
/// installed by the embedding process is left in place.
pub fn init_with_level(level: &str) {
    INIT.call_once(|| {
        let _ = LEVEL.set(level.to_string());
        let env = env_logger::Env::default().default_filter_or(level);
        if env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .try_init()
            .is_err()
        {
            log::debug!("A logger was already installed, keeping it");
        }
    });
}

/// Whether [`init`] or [`init_with_level`] already ran in this process
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

/// Fallback filter the logger was installed with, if it was installed
pub fn configured_level() -> Option<&'static str> {
    LEVEL.get().map(String::as_str)
}
