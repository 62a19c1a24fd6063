//! Configuration for the iteration orchestrator

use profiler_control::GeckoProfilerParams;
use serde::{Deserialize, Serialize};
use telemetry_types::BodyPolicy;

use crate::moz_log::DEFAULT_MOZ_LOG_MODULES;
use crate::{OrchestratorError, Result};

/// Configuration of per-iteration telemetry collection
///
/// Deserializes from the harness's camelCase options; missing keys take
/// their [`Default`] values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectorConfig {
    /// Disable HAR collection for the run
    skip_har: bool,

    /// Which response bodies stay in the HAR
    include_response_bodies: BodyPolicy,

    /// Run the gecko profiler during each iteration
    gecko_profiler: bool,

    /// Profiler features, threads, interval, and buffer size
    gecko_profiler_params: GeckoProfilerParams,

    /// Collect the browser's internal network log
    collect_moz_log: bool,

    /// Log modules handed to the browser through `MOZ_LOG`
    set_moz_log: String,

    /// The browser runs on a remote/mobile device
    remote_target: bool,

    /// Write every URL's artifacts into the base directory
    use_same_dir: bool,
}

impl CollectorConfig {
    /// Create a new builder for CollectorConfig
    ///
    /// # Example
    ///
    /// ```
    /// use iteration_orchestrator::CollectorConfig;
    /// use telemetry_types::BodyPolicy;
    ///
    /// let config = CollectorConfig::builder()
    ///     .gecko_profiler(true)
    ///     .include_response_bodies(BodyPolicy::Html)
    ///     .build();
    /// ```
    pub fn builder() -> CollectorConfigBuilder {
        CollectorConfigBuilder::default()
    }

    /// Parse and validate a JSON options document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate an already decoded options value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the browser would choke on
    pub fn validate(&self) -> Result<()> {
        if !self.gecko_profiler {
            return Ok(());
        }

        let params = &self.gecko_profiler_params;
        if params.feature_list().is_empty() {
            return Err(OrchestratorError::InvalidConfiguration(
                "geckoProfilerParams.features must name at least one feature".to_string(),
            ));
        }
        if params.buffer_size == 0 {
            return Err(OrchestratorError::InvalidConfiguration(
                "geckoProfilerParams.bufferSize must be positive".to_string(),
            ));
        }
        if let Some(interval) = params.interval {
            if !(interval.is_finite() && interval > 0.0) {
                return Err(OrchestratorError::InvalidConfiguration(format!(
                    "geckoProfilerParams.interval must be a positive number, got {}",
                    interval
                )));
            }
        }
        Ok(())
    }

    /// Whether HAR collection is disabled
    pub fn skip_har(&self) -> bool {
        self.skip_har
    }

    /// Get the response body policy
    pub fn include_response_bodies(&self) -> BodyPolicy {
        self.include_response_bodies
    }

    /// Whether the gecko profiler runs
    pub fn gecko_profiler(&self) -> bool {
        self.gecko_profiler
    }

    /// Get the profiler parameters
    pub fn gecko_profiler_params(&self) -> &GeckoProfilerParams {
        &self.gecko_profiler_params
    }

    /// Whether the browser's network log is collected
    pub fn collect_moz_log(&self) -> bool {
        self.collect_moz_log
    }

    /// Get the `MOZ_LOG` module list
    pub fn set_moz_log(&self) -> &str {
        &self.set_moz_log
    }

    /// Whether the browser runs on a remote device
    pub fn remote_target(&self) -> bool {
        self.remote_target
    }

    /// Whether all URLs share the base directory
    pub fn use_same_dir(&self) -> bool {
        self.use_same_dir
    }
}

impl Default for CollectorConfig {
    /// Create a default configuration
    ///
    /// Default values:
    /// - HAR collected, response bodies dropped
    /// - profiler off, default profiler parameters
    /// - moz log off
    /// - desktop target, per-URL folders
    fn default() -> Self {
        Self {
            skip_har: false,
            include_response_bodies: BodyPolicy::None,
            gecko_profiler: false,
            gecko_profiler_params: GeckoProfilerParams::default(),
            collect_moz_log: false,
            set_moz_log: DEFAULT_MOZ_LOG_MODULES.to_string(),
            remote_target: false,
            use_same_dir: false,
        }
    }
}

/// Builder for CollectorConfig
///
/// Unset options fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfigBuilder {
    skip_har: Option<bool>,
    include_response_bodies: Option<BodyPolicy>,
    gecko_profiler: Option<bool>,
    gecko_profiler_params: Option<GeckoProfilerParams>,
    collect_moz_log: Option<bool>,
    set_moz_log: Option<String>,
    remote_target: Option<bool>,
    use_same_dir: Option<bool>,
}

impl CollectorConfigBuilder {
    /// Disable or enable HAR collection
    pub fn skip_har(mut self, skip: bool) -> Self {
        self.skip_har = Some(skip);
        self
    }

    /// Set the response body policy
    pub fn include_response_bodies(mut self, policy: BodyPolicy) -> Self {
        self.include_response_bodies = Some(policy);
        self
    }

    /// Enable or disable the gecko profiler
    pub fn gecko_profiler(mut self, enabled: bool) -> Self {
        self.gecko_profiler = Some(enabled);
        self
    }

    /// Set the profiler parameters
    pub fn gecko_profiler_params(mut self, params: GeckoProfilerParams) -> Self {
        self.gecko_profiler_params = Some(params);
        self
    }

    /// Enable or disable network log collection
    pub fn collect_moz_log(mut self, enabled: bool) -> Self {
        self.collect_moz_log = Some(enabled);
        self
    }

    /// Set the `MOZ_LOG` module list
    pub fn set_moz_log(mut self, modules: impl Into<String>) -> Self {
        self.set_moz_log = Some(modules.into());
        self
    }

    /// Mark the browser as running on a remote device
    pub fn remote_target(mut self, remote: bool) -> Self {
        self.remote_target = Some(remote);
        self
    }

    /// Put every URL's artifacts into the base directory
    pub fn use_same_dir(mut self, same_dir: bool) -> Self {
        self.use_same_dir = Some(same_dir);
        self
    }

    /// Build the CollectorConfig
    pub fn build(self) -> CollectorConfig {
        let default = CollectorConfig::default();

        CollectorConfig {
            skip_har: self.skip_har.unwrap_or(default.skip_har),
            include_response_bodies: self
                .include_response_bodies
                .unwrap_or(default.include_response_bodies),
            gecko_profiler: self.gecko_profiler.unwrap_or(default.gecko_profiler),
            gecko_profiler_params: self
                .gecko_profiler_params
                .unwrap_or(default.gecko_profiler_params),
            collect_moz_log: self.collect_moz_log.unwrap_or(default.collect_moz_log),
            set_moz_log: self.set_moz_log.unwrap_or(default.set_moz_log),
            remote_target: self.remote_target.unwrap_or(default.remote_target),
            use_same_dir: self.use_same_dir.unwrap_or(default.use_same_dir),
        }
    }
}
