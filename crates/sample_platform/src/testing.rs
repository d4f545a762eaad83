//! Test doubles for surfaces, Vulkan instances, applications and plugins
//!
//! Compiled for this crate's unit tests and, through the `mock` feature, for
//! integration tests and embedders that want to exercise the external driver
//! without a device.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ash::vk::{self, Handle};
use raw_window_handle::{
    AndroidDisplayHandle, AndroidNdkWindowHandle, RawDisplayHandle, RawWindowHandle,
};

use crate::application::{AppError, AppInfo, Application, PrepareOptions, UiOverlay};
use crate::context::PlatformContext;
use crate::plugins::{Hook, Plugin, PluginAction};
use crate::surface::NativeSurface;
use crate::window::{SurfaceFactory, WindowEvent};

/// Native surface with an observable reference count
#[derive(Debug)]
pub struct MockSurface {
    width: i32,
    height: i32,
    resolvable: bool,
    ref_count: AtomicI64,
    release_calls: AtomicU64,
}

impl MockSurface {
    /// Pixel format every mock reports (`WINDOW_FORMAT_RGBA_8888`)
    pub const FORMAT: i32 = 1;

    fn build(width: i32, height: i32, resolvable: bool) -> Arc<Self> {
        Arc::new(Self {
            width,
            height,
            resolvable,
            ref_count: AtomicI64::new(0),
            release_calls: AtomicU64::new(0),
        })
    }

    /// A resolvable surface of the given size
    pub fn new(width: i32, height: i32) -> Arc<Self> {
        Self::build(width, height, true)
    }

    /// A surface the runtime cannot turn into a native window
    pub fn unresolvable(width: i32, height: i32) -> Arc<Self> {
        Self::build(width, height, false)
    }

    /// Outstanding references
    pub fn ref_count(&self) -> i64 {
        self.ref_count.load(Ordering::SeqCst)
    }

    /// How often `release` was called
    pub fn release_calls(&self) -> u64 {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl NativeSurface for MockSurface {
    fn acquire(&self) {
        self.ref_count.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let previous = self.ref_count.fetch_sub(1, Ordering::SeqCst);
        assert!(previous > 0, "mock surface released more often than acquired");
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn format(&self) -> i32 {
        Self::FORMAT
    }

    fn raw_window_handle(&self) -> Option<RawWindowHandle> {
        if !self.resolvable {
            return None;
        }
        let mut handle = AndroidNdkWindowHandle::empty();
        handle.a_native_window = NonNull::<c_void>::dangling().as_ptr();
        Some(RawWindowHandle::AndroidNdk(handle))
    }

    fn raw_display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Android(AndroidDisplayHandle::empty())
    }
}

/// Surface factory that hands out fake surfaces and records every call
#[derive(Debug, Default)]
pub struct RecordingFactory {
    created: AtomicU64,
    requests: AtomicU64,
    fail: AtomicBool,
}

impl RecordingFactory {
    /// A factory whose surface creation succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent surface creation fail with `ERROR_SURFACE_LOST_KHR`
    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of surfaces created
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of creation requests, failed ones included
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl SurfaceFactory for RecordingFactory {
    fn instance_handle(&self) -> vk::Instance {
        vk::Instance::from_raw(0x1)
    }

    fn create_surface_from_raw(
        &self,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> Result<vk::SurfaceKHR, vk::Result> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        let id = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vk::SurfaceKHR::from_raw(id))
    }
}

/// Shared, ordered record of lifecycle calls
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(entry.into());
    }

    /// Snapshot of all entries
    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of entries equal to `entry`
    pub fn count(&self, entry: &str) -> usize {
        self.events().iter().filter(|e| *e == entry).count()
    }

    /// Position of the first entry equal to `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.events().iter().position(|e| e == entry)
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// How a [`RecordingApp`] misbehaves
#[derive(Debug, Clone, Copy, Default)]
pub struct AppBehavior {
    /// `prepare` returns `false`
    pub fail_prepare: bool,
    /// `update` returns an error on this frame (1-based)
    pub fail_update_at: Option<u64>,
    /// `update` panics on this frame (1-based)
    pub panic_update_at: Option<u64>,
    /// `should_close` turns true after this many frames
    pub close_after: Option<u64>,
    /// `prepare` creates a surface through the window
    pub create_surface: bool,
}

/// Application that logs every lifecycle call
///
/// Entries: `prepare WxH`, `surface`, `update`, `resize WxH`, `input`,
/// `finish`.
#[derive(Debug)]
pub struct RecordingApp {
    log: EventLog,
    behavior: AppBehavior,
    frames: u64,
}

impl RecordingApp {
    /// Create a recording application
    pub fn new(log: EventLog, behavior: AppBehavior) -> Self {
        Self {
            log,
            behavior,
            frames: 0,
        }
    }

    /// Registry entry constructing recording applications
    pub fn info(id: &str, log: &EventLog, behavior: AppBehavior) -> AppInfo {
        let log = log.clone();
        AppInfo::new(id, "recording test application", move || {
            Box::new(Self::new(log.clone(), behavior)) as Box<dyn Application>
        })
    }
}

impl Application for RecordingApp {
    fn name(&self) -> &str {
        "recording"
    }

    fn prepare(&mut self, options: PrepareOptions<'_>) -> bool {
        let extent = options.window.extent();
        self.log.push(format!("prepare {}x{}", extent.width, extent.height));

        if self.behavior.create_surface {
            let factory = RecordingFactory::new();
            match options.window.create_surface(&factory) {
                Ok(surface) if surface != vk::SurfaceKHR::null() => self.log.push("surface"),
                Ok(_) => self.log.push("null surface"),
                Err(_) => return false,
            }
        }
        !self.behavior.fail_prepare
    }

    fn update(&mut self, _delta_time: f32) -> Result<(), AppError> {
        self.frames += 1;
        self.log.push("update");

        if self.behavior.panic_update_at == Some(self.frames) {
            panic!("recording app panicked on frame {}", self.frames);
        }
        if self.behavior.fail_update_at == Some(self.frames) {
            return Err(AppError::Render(format!("frame {} failed", self.frames)));
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        self.log.push(format!("resize {width}x{height}"));
        true
    }

    fn input_event(&mut self, _event: &WindowEvent) {
        self.log.push("input");
    }

    fn should_close(&self) -> bool {
        self.behavior.close_after.is_some_and(|frames| self.frames >= frames)
    }

    fn finish(&mut self) {
        self.log.push("finish");
    }
}

/// Plugin that logs every hook it is called for
///
/// Entries are prefixed with `plugin:`.
#[derive(Debug)]
pub struct RecordingPlugin {
    log: EventLog,
    hooks: Vec<Hook>,
    close_at: Option<u64>,
    updates: u64,
    active: bool,
}

impl RecordingPlugin {
    /// Record all hooks
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            hooks: vec![
                Hook::OnUpdate,
                Hook::OnAppStart,
                Hook::OnAppClose,
                Hook::OnAppError,
                Hook::OnPlatformClose,
                Hook::OnUpdateUiOverlay,
            ],
            close_at: None,
            updates: 0,
            active: true,
        }
    }

    /// Request close from `on_update` at this update count
    #[must_use]
    pub fn closing_at(mut self, update: u64) -> Self {
        self.close_at = Some(update);
        self
    }

    /// Report the plugin as inactive for every context
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        "recording"
    }

    fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    fn is_active(&self, _context: &PlatformContext) -> bool {
        self.active
    }

    fn on_update(&mut self, _delta_time: f32) -> PluginAction {
        self.updates += 1;
        self.log.push("plugin:on_update");
        if self.close_at == Some(self.updates) {
            PluginAction::RequestClose
        } else {
            PluginAction::Continue
        }
    }

    fn on_app_start(&mut self, app_id: &str) {
        self.log.push(format!("plugin:on_app_start {app_id}"));
    }

    fn on_app_close(&mut self, app_id: &str) {
        self.log.push(format!("plugin:on_app_close {app_id}"));
    }

    fn on_app_error(&mut self, app_id: &str, _error: &str) {
        self.log.push(format!("plugin:on_app_error {app_id}"));
    }

    fn on_platform_close(&mut self) {
        self.log.push("plugin:on_platform_close");
    }

    fn on_update_ui_overlay(&mut self, overlay: &mut UiOverlay) {
        overlay.text("recording");
    }
}
