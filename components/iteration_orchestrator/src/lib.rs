//! Per-iteration telemetry collection
//!
//! This crate provides the IterationOrchestrator that wires the gecko profiler
//! controller and the HAR collector into the lifecycle hooks a browser test
//! harness calls around every run and iteration.
//!
//! # Example
//!
//! ```no_run
//! use browser_bridge::{LocalStorageManager, MockBrowser};
//! use iteration_orchestrator::{
//!     BrowserDelegate, Collaborators, CollectorConfig, IterationOrchestrator,
//! };
//! use std::sync::Arc;
//! use telemetry_types::{BodyPolicy, IterationResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CollectorConfig::builder()
//!         .gecko_profiler(true)
//!         .include_response_bodies(BodyPolicy::Html)
//!         .build();
//!     let storage = Arc::new(LocalStorageManager::new("/tmp/run"));
//!     let mut orchestrator = IterationOrchestrator::new(config, Collaborators::new(storage))?;
//!
//!     let browser = MockBrowser::new();
//!     orchestrator.on_start().await;
//!     orchestrator.on_start_iteration(&browser).await;
//!     let report = orchestrator
//!         .on_collect(&browser, 0, &IterationResult::new("https://example.com/", 0))
//!         .await?;
//!     println!("clean: {}", report.is_clean());
//!     let output = orchestrator.on_stop().await;
//!     println!("{}", serde_json::to_string(&output)?);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod moz_log;
mod orchestrator;

pub use config::{CollectorConfig, CollectorConfigBuilder};
pub use error::{OrchestratorError, Result};
pub use orchestrator::{
    BrowserDelegate, Collaborators, CollectReport, IterationOrchestrator, RunOutput, RunState,
};
