//! Iteration orchestrator implementation

use async_trait::async_trait;
use browser_bridge::{
    path_to_folder, DefaultHarMerger, FolderOptions, HarMerger, RemoteDevice, ScriptChannel,
    StorageManager,
};
use har_collector::HarCollector;
use profiler_control::{profile_file_name, ProfilerController};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use telemetry_types::{CollectionError, FailurePolicy, Har, IterationResult};
use tracing::{debug, error, info, warn};

use crate::{moz_log, CollectorConfig, Result};

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, no run started yet
    Idle,
    /// Run started, no iteration yet
    Started,
    /// At least one iteration started
    Iterating,
    /// Run stopped and merged
    Stopped,
}

/// What one collect phase produced
#[derive(Debug, Default)]
pub struct CollectReport {
    /// Iteration index the report belongs to
    pub index: usize,
    /// Where the gecko profile was stored
    pub profile: Option<PathBuf>,
    /// Where the browser log was moved to
    pub moz_log: Option<PathBuf>,
    /// Whether a HAR was added to the run
    pub har_captured: bool,
    /// Failures absorbed while collecting, in the order they happened
    pub failures: Vec<CollectionError>,
}

impl CollectReport {
    fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Whether every enabled collection step succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Final artifact of a run: `{har: ...}` or `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub har: Option<Har>,
}

impl RunOutput {
    /// Whether the run produced nothing
    pub fn is_empty(&self) -> bool {
        self.har.is_none()
    }
}

/// External systems the orchestrator drives
#[derive(Clone)]
pub struct Collaborators {
    /// Output directories
    pub storage: Arc<dyn StorageManager>,
    /// HAR merge and placeholder builder
    pub merger: Arc<dyn HarMerger>,
    /// Remote device, for remote targets
    pub device: Option<Arc<dyn RemoteDevice>>,
}

impl Collaborators {
    /// Collaborators writing to `storage` with the default HAR merger and no
    /// remote device
    pub fn new(storage: Arc<dyn StorageManager>) -> Self {
        Self {
            storage,
            merger: Arc::new(DefaultHarMerger::new()),
            device: None,
        }
    }

    /// Replace the HAR merger
    pub fn with_merger(mut self, merger: Arc<dyn HarMerger>) -> Self {
        self.merger = merger;
        self
    }

    /// Attach a remote device
    pub fn with_device(mut self, device: Arc<dyn RemoteDevice>) -> Self {
        self.device = Some(device);
        self
    }
}

/// Hooks the test harness calls around every run and iteration
///
/// Hooks run strictly one after another on one browser session; no two
/// hooks of the same delegate ever overlap.
#[async_trait]
pub trait BrowserDelegate: Send {
    /// A run begins
    async fn on_start(&mut self);

    /// Environment variables the browser has to be launched with
    fn before_browser_start(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// The browser is up
    async fn after_browser_start(&mut self) {}

    /// An iteration begins; the page is about to load
    async fn on_start_iteration(&mut self, channel: &dyn ScriptChannel);

    /// The page interaction of an iteration is done
    async fn on_stop_iteration(&mut self) {}

    /// Right before [`on_collect`](Self::on_collect)
    async fn before_collect(&mut self) {}

    /// Collect the iteration's artifacts while the browser is still alive
    ///
    /// # Errors
    ///
    /// Only an I/O failure while moving the browser log escapes, and only
    /// after the remaining collection steps ran.
    async fn on_collect(
        &mut self,
        channel: &dyn ScriptChannel,
        index: usize,
        result: &IterationResult,
    ) -> Result<CollectReport>;

    /// An iteration failed before anything could be collected
    fn on_failure(&mut self, url: &str);

    /// The run ends; returns the merged artifacts
    async fn on_stop(&mut self) -> RunOutput;
}

/// Sequences profiler and HAR collection across the iterations of a run
pub struct IterationOrchestrator {
    config: CollectorConfig,
    profiler: ProfilerController,
    har: HarCollector,
    storage: Arc<dyn StorageManager>,
    device: Option<Arc<dyn RemoteDevice>>,
    state: RunState,
    /// Failures from `on_start_iteration`, reported with the next collect
    pending_failures: Vec<CollectionError>,
}

impl IterationOrchestrator {
    /// Create an orchestrator for one browser session
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: CollectorConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        debug!("Creating IterationOrchestrator with config: {:?}", config);

        if config.gecko_profiler() && config.remote_target() && collaborators.device.is_none() {
            warn!("Remote target configured without a device, profiles cannot be retrieved");
        }

        let profiler = ProfilerController::new(
            config.gecko_profiler(),
            config.gecko_profiler_params().clone(),
            config.remote_target(),
        );
        let har = HarCollector::new(
            !config.skip_har(),
            config.include_response_bodies(),
            collaborators.merger,
        );

        Ok(Self {
            config,
            profiler,
            har,
            storage: collaborators.storage,
            device: collaborators.device,
            state: RunState::Idle,
            pending_failures: Vec::new(),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Get the configuration
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// HAR captures accumulated in the current run
    pub fn har_captures(&self) -> &[Har] {
        self.har.captures()
    }

    /// Whether the profiler will run in the next iteration
    pub fn profiling_active(&self) -> bool {
        self.profiler.is_active()
    }

    async fn output_dir(&self, url: &str) -> std::result::Result<PathBuf, CollectionError> {
        let options = FolderOptions {
            use_same_dir: self.config.use_same_dir(),
        };
        let folder = path_to_folder(url, &options).map_err(|e| CollectionError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.storage.create_sub_data_dir(&folder).await?)
    }

    async fn collect_profile(
        &mut self,
        channel: &dyn ScriptChannel,
        index: usize,
        url: &str,
    ) -> std::result::Result<Option<PathBuf>, CollectionError> {
        let dir = match self.output_dir(url).await {
            Ok(dir) => dir,
            Err(e) => {
                self.profiler.abort(channel).await;
                return Err(e);
            }
        };

        let destination = dir.join(profile_file_name(index));
        self.profiler
            .stop_and_collect(channel, self.device.as_deref(), &destination)
            .await
    }
}

/// Log a collection failure according to its policy
fn log_failure(step: &str, failure: &CollectionError) {
    match failure.policy() {
        FailurePolicy::LogAndSkipFeature => error!(
            kind = failure.kind(),
            "{} failed, disabled for the rest of the run: {}", step, failure
        ),
        FailurePolicy::LogAndContinue => {
            warn!(kind = failure.kind(), "{} failed: {}", step, failure)
        }
    }
}

#[async_trait]
impl BrowserDelegate for IterationOrchestrator {
    async fn on_start(&mut self) {
        if self.state == RunState::Iterating {
            warn!("Starting a new run while the previous one was never stopped");
        }
        self.har.reset();
        self.profiler.reset();
        self.pending_failures.clear();
        self.state = RunState::Started;
        debug!("Run started");
    }

    fn before_browser_start(&self) -> BTreeMap<String, String> {
        if !self.config.collect_moz_log() {
            return BTreeMap::new();
        }
        moz_log::browser_env(self.config.set_moz_log(), self.storage.base_dir())
    }

    async fn on_start_iteration(&mut self, channel: &dyn ScriptChannel) {
        match self.state {
            RunState::Started | RunState::Iterating => {}
            state => warn!("Iteration started in state {:?}", state),
        }
        self.state = RunState::Iterating;

        if !self.profiler.is_active() {
            return;
        }
        match self.profiler.start_if_enabled(channel).await {
            Ok(Some(session)) => debug!("Profiling with {:?}", session.api_variant),
            Ok(None) => {}
            Err(e) => {
                log_failure("Starting the gecko profiler", &e);
                self.pending_failures.push(e);
            }
        }
    }

    async fn on_collect(
        &mut self,
        channel: &dyn ScriptChannel,
        index: usize,
        result: &IterationResult,
    ) -> Result<CollectReport> {
        let mut report = CollectReport::new(index);
        report.failures.append(&mut self.pending_failures);

        // surfaced only after the profiler is stopped and the HAR captured
        let mut relocation_error = None;
        if self.config.collect_moz_log() {
            match self.output_dir(&result.url).await {
                Ok(dir) => match moz_log::relocate(self.storage.base_dir(), &dir, index).await {
                    Ok(moved) => report.moz_log = moved,
                    Err(e) => {
                        error!("Relocating the browser log failed: {}", e);
                        relocation_error = Some(e);
                    }
                },
                Err(e) => {
                    log_failure("Relocating the browser log", &e);
                    report.failures.push(e);
                }
            }
        }

        if self.profiler.session().is_some() {
            match self.collect_profile(channel, index, &result.url).await {
                Ok(profile) => report.profile = profile,
                Err(e) => {
                    log_failure("Collecting the gecko profile", &e);
                    report.failures.push(e);
                }
            }
        }

        if self.har.is_enabled() {
            match self.har.capture_iteration(channel, result).await {
                Ok(captured) => report.har_captured = captured.is_some(),
                Err(e) => {
                    log_failure("Capturing the HAR", &e);
                    report.failures.push(e);
                }
            }
        }

        if let Some(e) = relocation_error {
            return Err(e.into());
        }

        debug!(
            "Collected iteration {} ({} failures)",
            index,
            report.failures.len()
        );
        Ok(report)
    }

    fn on_failure(&mut self, url: &str) {
        if self.har.record_failure(url).is_some() {
            info!("Added placeholder HAR for failing {}", url);
        }
    }

    async fn on_stop(&mut self) -> RunOutput {
        self.state = RunState::Stopped;

        let har = self.har.merge_all();
        match &har {
            Some(merged) => info!(
                "Merged {} HARs into {} pages",
                self.har.captures().len(),
                merged.log.page_count()
            ),
            None => debug!("No HAR produced for this run"),
        }
        RunOutput { har }
    }
}
