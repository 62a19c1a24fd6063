//! Collaborator interfaces consumed by the telemetry collector
//!
//! The collector never talks to the browser, the remote device, or the file
//! system directly. It goes through the traits defined here:
//!
//! - [`ScriptChannel`]: script execution inside the running browser
//! - [`RemoteDevice`]: file retrieval from a remote/mobile target
//! - [`StorageManager`]: per-URL output directories
//! - [`HarMerger`]: merging per-iteration HARs and building placeholders
//!
//! Default implementations ([`LocalStorageManager`], [`DefaultHarMerger`]) and
//! the scripted test doubles in [`mock_browser`] live alongside.

pub mod merge;
pub mod mock_browser;
pub mod storage;

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use telemetry_types::ChannelError;

pub use merge::{empty_har, DefaultHarMerger, HarMerger, FAILING_PAGE_ID};
pub use mock_browser::{MockBrowser, MockDevice, ScriptCall, ScriptKind};
pub use storage::{path_to_folder, FolderOptions, LocalStorageManager, StorageManager};

/// Script execution channel into a live browser session
///
/// Every call is awaited until the browser answers. Timeouts are the
/// channel's business; callers only see `Ok` or `Err`.
#[async_trait]
pub trait ScriptChannel: Send + Sync {
    /// Run a synchronous script with chrome privileges
    ///
    /// # Arguments
    /// * `code` - Script body; its `return` value is the result
    /// * `label` - Human readable name used in logs and errors
    async fn run_privileged_script(&self, code: &str, label: &str) -> Result<Value, ChannelError>;

    /// Run a callback-style script with chrome privileges
    ///
    /// The script receives its completion callback as the last argument and
    /// the value handed to it is the result.
    async fn run_privileged_async_script(
        &self,
        code: &str,
        label: &str,
    ) -> Result<Value, ChannelError>;

    /// Run a callback-style script in page content
    async fn run_async_script(&self, code: &str, label: &str) -> Result<Value, ChannelError>;
}

/// Connection to a remote/mobile device running the browser
#[async_trait]
pub trait RemoteDevice: Send + Sync {
    /// Establish the connection; calling it on a live connection is a no-op
    async fn init_connection(&self) -> Result<(), ChannelError>;

    /// Copy `remote_path` on the device to `local_path` on the host
    async fn download_file(&self, remote_path: &str, local_path: &Path)
        -> Result<(), ChannelError>;
}
