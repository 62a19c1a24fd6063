//! Per-iteration telemetry collection for browser performance runs
//!
//! This crate bundles the collection components behind one dependency: the
//! gecko profiler controller, the HAR collector, and the orchestrator that
//! sequences them around each measured page load.
//!
//! # Example
//!
//! ```no_run
//! use browser_telemetry::{
//!     BrowserDelegate, Collaborators, CollectorConfig, IterationOrchestrator,
//!     IterationResult, LocalStorageManager, MockBrowser,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CollectorConfig::from_json(r#"{"geckoProfiler": true}"#)?;
//!     let storage = Arc::new(LocalStorageManager::new("/tmp/run"));
//!     let mut telemetry = IterationOrchestrator::new(config, Collaborators::new(storage))?;
//!
//!     let browser = MockBrowser::new();
//!     telemetry.on_start().await;
//!     telemetry.on_start_iteration(&browser).await;
//!     telemetry
//!         .on_collect(&browser, 0, &IterationResult::new("https://example.com/", 0))
//!         .await?;
//!     let output = telemetry.on_stop().await;
//!     println!("{}", serde_json::to_string_pretty(&output)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub use browser_bridge::{
    empty_har, path_to_folder, DefaultHarMerger, FolderOptions, HarMerger, LocalStorageManager,
    MockBrowser, MockDevice, RemoteDevice, ScriptChannel, StorageManager,
};
pub use har_collector::{AliasUrlResolver, HarCollector, ResponseBodyFilter, HAR_EXPORT_LABEL};
pub use iteration_orchestrator::{
    BrowserDelegate, Collaborators, CollectReport, CollectorConfig, CollectorConfigBuilder,
    IterationOrchestrator, OrchestratorError, Result, RunOutput, RunState,
};
pub use profiler_control::{
    ApiVariant, GeckoProfilerParams, ProfilerController, ProfilerSession, DUMP_PROFILE_LABEL,
    PROFILER_ARITY_LABEL, START_PROFILER_LABEL, STOP_PROFILER_LABEL,
};
pub use telemetry_types::{
    BodyPolicy, ChannelError, CollectionError, FailurePolicy, Har, HarExportResult, HarLog,
    IterationResult,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
