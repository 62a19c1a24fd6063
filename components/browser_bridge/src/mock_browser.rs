//! Scripted browser and device doubles for testing the collector
//!
//! [`MockBrowser`] answers scripts by label from a reply queue and records
//! every call so tests can assert on ordering. [`MockDevice`] records
//! downloads and writes a stub file at the host path.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use telemetry_types::ChannelError;

use crate::{RemoteDevice, ScriptChannel};

/// Which channel primitive a script went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Privileged,
    PrivilegedAsync,
    Async,
}

/// A recorded script invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCall {
    pub kind: ScriptKind,
    pub label: String,
    pub code: String,
}

/// Mock browser answering scripts from per-label reply queues
///
/// Replies are consumed front to back; the last reply of a queue is sticky
/// and answers every further call with that label. A label without replies
/// fails with [`ChannelError::ScriptFailed`].
#[derive(Default)]
pub struct MockBrowser {
    /// Label -> queued replies
    replies: DashMap<String, VecDeque<Result<Value, ChannelError>>>,
    /// Every call in arrival order
    calls: Mutex<Vec<ScriptCall>>,
}

impl MockBrowser {
    /// Create a mock browser without scripted replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for `label`
    pub fn respond(&self, label: &str, value: Value) -> &Self {
        self.push_reply(label, Ok(value))
    }

    /// Queue a channel failure for `label`
    pub fn fail(&self, label: &str, error: ChannelError) -> &Self {
        self.push_reply(label, Err(error))
    }

    fn push_reply(&self, label: &str, reply: Result<Value, ChannelError>) -> &Self {
        self.replies
            .entry(label.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<ScriptCall> {
        self.calls.lock().clone()
    }

    /// Labels of all calls made so far, in order
    pub fn call_labels(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.label.clone()).collect()
    }

    /// Number of calls made with `label`
    pub fn call_count(&self, label: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.label == label).count()
    }

    fn answer(&self, kind: ScriptKind, code: &str, label: &str) -> Result<Value, ChannelError> {
        self.calls.lock().push(ScriptCall {
            kind,
            label: label.to_string(),
            code: code.to_string(),
        });

        let mut queue = match self.replies.get_mut(label) {
            Some(queue) => queue,
            None => return Err(ChannelError::script_failed(label, "no scripted reply")),
        };

        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(ChannelError::script_failed(label, "no scripted reply")))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ChannelError::script_failed(label, "no scripted reply")))
        }
    }
}

#[async_trait]
impl ScriptChannel for MockBrowser {
    async fn run_privileged_script(&self, code: &str, label: &str) -> Result<Value, ChannelError> {
        self.answer(ScriptKind::Privileged, code, label)
    }

    async fn run_privileged_async_script(
        &self,
        code: &str,
        label: &str,
    ) -> Result<Value, ChannelError> {
        self.answer(ScriptKind::PrivilegedAsync, code, label)
    }

    async fn run_async_script(&self, code: &str, label: &str) -> Result<Value, ChannelError> {
        self.answer(ScriptKind::Async, code, label)
    }
}

/// Mock remote device recording downloads
#[derive(Default)]
pub struct MockDevice {
    connections: AtomicUsize,
    fail_downloads: AtomicBool,
    downloads: Mutex<Vec<(String, PathBuf)>>,
}

impl MockDevice {
    /// Create a device whose downloads succeed
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every further download fail
    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Downloads performed so far as `(remote, local)` pairs
    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().clone()
    }

    /// Number of `init_connection` calls
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteDevice for MockDevice {
    async fn init_connection(&self) -> Result<(), ChannelError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download_file(
        &self,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<(), ChannelError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(ChannelError::Transfer(format!(
                "{} not found on device",
                remote_path
            )));
        }

        tokio::fs::write(local_path, b"{}")
            .await
            .map_err(|e| ChannelError::Transfer(e.to_string()))?;
        self.downloads
            .lock()
            .push((remote_path.to_string(), local_path.to_path_buf()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_are_consumed_in_order() {
        let browser = MockBrowser::new();
        browser.respond("A", json!(1)).respond("A", json!(2));

        assert_eq!(browser.run_privileged_script("", "A").await.unwrap(), json!(1));
        assert_eq!(browser.run_privileged_script("", "A").await.unwrap(), json!(2));
        // last reply is sticky
        assert_eq!(browser.run_privileged_script("", "A").await.unwrap(), json!(2));
        assert_eq!(browser.call_count("A"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_label_fails() {
        let browser = MockBrowser::new();
        let result = browser.run_async_script("return 1;", "UNKNOWN").await;
        assert!(matches!(result, Err(ChannelError::ScriptFailed { .. })));
        assert_eq!(browser.calls()[0].kind, ScriptKind::Async);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let browser = MockBrowser::new();
        browser.fail("B", ChannelError::Timeout { label: "B".into() });

        let result = browser.run_privileged_async_script("", "B").await;
        assert_eq!(result, Err(ChannelError::Timeout { label: "B".into() }));
    }

    #[tokio::test]
    async fn test_device_download() {
        let temp = tempfile::tempdir().unwrap();
        let device = MockDevice::new();
        let local = temp.path().join("profile.json");

        device.init_connection().await.unwrap();
        device.download_file("/sdcard/profile.json", &local).await.unwrap();

        assert!(local.exists());
        assert_eq!(device.connection_count(), 1);
        assert_eq!(device.downloads()[0].0, "/sdcard/profile.json");

        device.fail_downloads(true);
        assert!(device.download_file("/sdcard/x.json", &local).await.is_err());
        assert_eq!(device.downloads().len(), 1);
    }
}
