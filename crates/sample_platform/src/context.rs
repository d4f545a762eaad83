//! Platform context
//!
//! The environment a platform runs in: command line arguments, storage paths
//! and an opaque handle to the host (an asset manager, an activity, ...). The
//! core only reads these values.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Program name used when the host supplies no arguments at all
pub const DEFAULT_PROGRAM_NAME: &str = "vulkan_samples";

/// Storage directory used by external-surface hosts
pub const EXTERNAL_STORAGE_DIRECTORY: &str = "/sdcard/Android/data/com.khronos.vulkan_samples/files";

/// Cache directory used by external-surface hosts
pub const EXTERNAL_CACHE_DIRECTORY: &str = "/sdcard/Android/data/com.khronos.vulkan_samples/cache";

/// Opaque, host-provided object
pub type HostHandle = Arc<dyn Any + Send + Sync>;

/// Channel for user-visible messages (a status bar notification, a toast)
///
/// Delivery is best-effort; a context without a notifier is valid.
pub trait Notifier: Send + Sync {
    /// Show `message` to the user
    fn notify(&self, message: &str);
}

/// Arguments handed over by the host before any platform exists
static STAGED_ARGUMENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Stage arguments for the next external-surface context
///
/// Hosts that deliver arguments through a separate callback (before the
/// surface or the platform exist) park them here.
pub fn stage_arguments(arguments: Vec<String>) {
    log::info!("Staged arguments:");
    for argument in &arguments {
        log::info!("  {argument}");
    }
    *STAGED_ARGUMENTS.lock().unwrap_or_else(PoisonError::into_inner) = arguments;
}

/// Arguments currently staged by the host
pub fn staged_arguments() -> Vec<String> {
    STAGED_ARGUMENTS.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Environment description supplied by the embedding process
#[derive(Clone)]
pub struct PlatformContext {
    arguments: Vec<String>,
    external_storage_directory: PathBuf,
    temp_directory: PathBuf,
    host_handle: Option<HostHandle>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl PlatformContext {
    /// Create a context with the given arguments and the process' working and
    /// temp directories
    pub fn new(arguments: Vec<String>) -> Self {
        Self {
            arguments,
            external_storage_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            temp_directory: std::env::temp_dir(),
            host_handle: None,
            notifier: None,
        }
    }

    /// Context for a desktop process, taking arguments from the command line
    pub fn desktop() -> Self {
        Self::new(std::env::args().collect())
    }

    /// Context for an externally driven host
    ///
    /// Arguments come from [`stage_arguments`]; storage paths are the host's
    /// app-specific directories.
    pub fn external_surface(host_handle: Option<HostHandle>) -> Self {
        Self {
            arguments: staged_arguments(),
            external_storage_directory: PathBuf::from(EXTERNAL_STORAGE_DIRECTORY),
            temp_directory: PathBuf::from(EXTERNAL_CACHE_DIRECTORY),
            host_handle,
            notifier: None,
        }
    }

    /// Replace the arguments
    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Set the storage directory
    pub fn with_external_storage_directory(mut self, path: impl AsRef<Path>) -> Self {
        self.external_storage_directory = path.as_ref().to_path_buf();
        self
    }

    /// Set the temp directory
    pub fn with_temp_directory(mut self, path: impl AsRef<Path>) -> Self {
        self.temp_directory = path.as_ref().to_path_buf();
        self
    }

    /// Attach a host handle
    pub fn with_host_handle(mut self, handle: HostHandle) -> Self {
        self.host_handle = Some(handle);
        self
    }

    /// Attach a notification channel
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Command line arguments, program name first
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Directory for persistent files (configs, logs, assets copied by the host)
    pub fn external_storage_directory(&self) -> &Path {
        &self.external_storage_directory
    }

    /// Directory for scratch files
    pub fn temp_directory(&self) -> &Path {
        &self.temp_directory
    }

    /// The opaque host object, if any
    pub fn host_handle(&self) -> Option<&HostHandle> {
        self.host_handle.as_ref()
    }

    /// Downcast the host handle to a concrete type
    pub fn host_handle_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.host_handle.as_deref().and_then(|handle| handle.downcast_ref::<T>())
    }

    /// Deliver a user-visible message if the host provided a channel
    ///
    /// Returns whether a channel was available.
    pub fn notify(&self, message: &str) -> bool {
        match &self.notifier {
            Some(notifier) => {
                notifier.notify(message);
                true
            }
            None => {
                log::debug!("No notification channel, dropping message: {message}");
                false
            }
        }
    }
}

impl fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformContext")
            .field("arguments", &self.arguments)
            .field("external_storage_directory", &self.external_storage_directory)
            .field("temp_directory", &self.temp_directory)
            .field("host_handle", &self.host_handle.is_some())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AssetManager {
        id: u32,
    }

    #[derive(Default)]
    struct CollectingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_host_handle_downcast() {
        let context = PlatformContext::new(vec!["app".into()])
            .with_host_handle(Arc::new(AssetManager { id: 7 }));

        assert_eq!(context.host_handle_as::<AssetManager>().map(|m| m.id), Some(7));
        assert!(context.host_handle_as::<String>().is_none());
    }

    #[test]
    fn test_notify_without_channel_is_not_an_error() {
        let context = PlatformContext::new(Vec::new());
        assert!(!context.notify("hello"));
    }

    #[test]
    fn test_notify_with_channel() {
        let notifier = Arc::new(CollectingNotifier::default());
        let context = PlatformContext::new(Vec::new()).with_notifier(notifier.clone());

        assert!(context.notify("sample failed"));
        assert_eq!(*notifier.messages.lock().unwrap(), vec!["sample failed".to_string()]);
    }

    #[test]
    fn test_external_surface_context_uses_staged_arguments() {
        stage_arguments(vec!["vulkan_samples".into(), "triangle".into()]);
        let context = PlatformContext::external_surface(None);

        assert_eq!(context.arguments(), ["vulkan_samples", "triangle"]);
        assert_eq!(context.external_storage_directory(), Path::new(EXTERNAL_STORAGE_DIRECTORY));
        assert_eq!(context.temp_directory(), Path::new(EXTERNAL_CACHE_DIRECTORY));
    }
}
