//! Logger installation for externally driven hosts
//!
//! Lives in its own test binary: the logger can be installed once per process.

use sample_platform::context::PlatformContext;
use sample_platform::external::driver;
use sample_platform::foundation::logging;
use sample_platform::testing::{AppBehavior, EventLog, MockSurface, RecordingApp};

#[test]
fn platform_config_sets_the_log_level() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("platform.toml"), "log_level = \"debug\"\n").unwrap();
    driver::register_app(RecordingApp::info("logged", &EventLog::new(), AppBehavior::default()));

    driver::bind_surface(MockSurface::new(64, 64)).unwrap();
    assert!(!logging::is_initialized());

    let context = PlatformContext::new(vec!["vulkan_samples".to_string(), "logged".to_string()])
        .with_external_storage_directory(dir.path());
    driver::initialize(context, Vec::new()).unwrap();

    assert!(logging::is_initialized());
    assert_eq!(logging::configured_level(), Some("debug"));

    driver::terminate().unwrap();
    driver::release_surface().unwrap();
}
