//! Type definitions for the gecko profiler controller
//!
//! Contains the user-facing profiler parameters, the per-iteration session
//! built from them, and the start-function variants of the profiler API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Sampling interval used for desktop targets when none is configured (ms)
pub const DEFAULT_DESKTOP_INTERVAL_MS: f64 = 1.0;

/// Sampling interval used for remote/mobile targets when none is configured (ms)
pub const DEFAULT_REMOTE_INTERVAL_MS: f64 = 4.0;

// ============================================================================
// Configuration
// ============================================================================

/// Profiler parameters as given in the run configuration
///
/// Missing keys fall back to [`Default`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeckoProfilerParams {
    /// Comma separated profiler features
    pub features: String,
    /// Comma separated thread names to sample
    pub threads: String,
    /// Sampling interval in milliseconds; platform default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    /// Profiler buffer size in entries
    pub buffer_size: u64,
}

impl Default for GeckoProfilerParams {
    fn default() -> Self {
        Self {
            features: "js,stackwalk,leaf".to_string(),
            threads: "GeckoMain,Compositor,Renderer".to_string(),
            interval: None,
            buffer_size: 13_107_200,
        }
    }
}

impl GeckoProfilerParams {
    /// Parsed feature list
    pub fn feature_list(&self) -> Vec<String> {
        split_csv(&self.features)
    }

    /// Parsed thread list
    pub fn thread_list(&self) -> Vec<String> {
        split_csv(&self.threads)
    }
}

/// Split a comma separated list, trimming items and dropping empty and
/// repeated ones
fn split_csv(csv: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|seen| seen == item) {
            items.push(item.to_string());
        }
    }
    items
}

// ============================================================================
// Session
// ============================================================================

/// Shape of `Services.profiler.StartProfiler`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVariant {
    /// Seven parameters: feature and thread arrays carry explicit counts
    SevenArg,
    /// Five parameters: arrays without counts
    FiveArg,
    /// Anything else
    Unknown,
}

impl ApiVariant {
    /// Classify the `length` reported for the start function
    pub fn from_arity(arity: &Value) -> Self {
        match arity.as_u64() {
            Some(7) => ApiVariant::SevenArg,
            Some(5) => ApiVariant::FiveArg,
            _ => ApiVariant::Unknown,
        }
    }
}

/// Settings of one profiling session
///
/// Built at iteration start and dropped once the profile is dumped and the
/// profiler stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilerSession {
    pub features: Vec<String>,
    pub threads: Vec<String>,
    /// Sampling interval in milliseconds
    pub interval: f64,
    pub buffer_size: u64,
    pub api_variant: ApiVariant,
}

impl ProfilerSession {
    /// Build a session from configured parameters
    ///
    /// # Arguments
    /// * `params` - Configured profiler parameters
    /// * `remote_target` - Whether the browser runs on a remote device; picks
    ///   the default interval when `params.interval` is unset
    /// * `api_variant` - Start function shape detected in the live browser
    pub fn new(params: &GeckoProfilerParams, remote_target: bool, api_variant: ApiVariant) -> Self {
        let interval = params.interval.unwrap_or(if remote_target {
            DEFAULT_REMOTE_INTERVAL_MS
        } else {
            DEFAULT_DESKTOP_INTERVAL_MS
        });

        Self {
            features: params.feature_list(),
            threads: params.thread_list(),
            interval,
            buffer_size: params.buffer_size,
            api_variant,
        }
    }

    /// Script starting the profiler, `None` for an unknown API shape
    pub fn start_command(&self) -> Option<String> {
        let features = json!(self.features).to_string();
        let threads = json!(self.threads).to_string();

        match self.api_variant {
            ApiVariant::SevenArg => Some(format!(
                "Services.profiler.StartProfiler({},{},{},{},{},{});",
                self.buffer_size,
                self.interval,
                features,
                self.features.len(),
                threads,
                self.threads.len()
            )),
            ApiVariant::FiveArg => Some(format!(
                "Services.profiler.StartProfiler({},{},{},{});",
                self.buffer_size, self.interval, features, threads
            )),
            ApiVariant::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv() {
        let params = GeckoProfilerParams {
            features: "js, leaf,,js ,stackwalk".to_string(),
            ..Default::default()
        };
        assert_eq!(params.feature_list(), vec!["js", "leaf", "stackwalk"]);
    }

    #[test]
    fn test_partial_params_deserialize() {
        let params: GeckoProfilerParams =
            serde_json::from_value(json!({"features": "js", "interval": 2})).unwrap();
        assert_eq!(params.features, "js");
        assert_eq!(params.interval, Some(2.0));
        assert_eq!(params.threads, GeckoProfilerParams::default().threads);
    }

    #[test]
    fn test_api_variant_from_arity() {
        assert_eq!(ApiVariant::from_arity(&json!(7)), ApiVariant::SevenArg);
        assert_eq!(ApiVariant::from_arity(&json!(5)), ApiVariant::FiveArg);
        assert_eq!(ApiVariant::from_arity(&json!(6)), ApiVariant::Unknown);
        assert_eq!(ApiVariant::from_arity(&json!("7")), ApiVariant::Unknown);
        assert_eq!(ApiVariant::from_arity(&Value::Null), ApiVariant::Unknown);
    }

    #[test]
    fn test_default_interval_depends_on_target() {
        let params = GeckoProfilerParams::default();

        let desktop = ProfilerSession::new(&params, false, ApiVariant::FiveArg);
        assert_eq!(desktop.interval, DEFAULT_DESKTOP_INTERVAL_MS);

        let remote = ProfilerSession::new(&params, true, ApiVariant::FiveArg);
        assert_eq!(remote.interval, DEFAULT_REMOTE_INTERVAL_MS);
    }

    #[test]
    fn test_configured_interval_wins() {
        let params = GeckoProfilerParams {
            interval: Some(0.5),
            ..Default::default()
        };
        let session = ProfilerSession::new(&params, true, ApiVariant::SevenArg);
        assert_eq!(session.interval, 0.5);
    }

    #[test]
    fn test_seven_arg_command() {
        let params = GeckoProfilerParams {
            features: "js,leaf".to_string(),
            threads: "GeckoMain".to_string(),
            interval: Some(2.0),
            buffer_size: 1000,
        };
        let session = ProfilerSession::new(&params, false, ApiVariant::SevenArg);

        assert_eq!(
            session.start_command().unwrap(),
            r#"Services.profiler.StartProfiler(1000,2,["js","leaf"],2,["GeckoMain"],1);"#
        );
    }

    #[test]
    fn test_five_arg_command() {
        let params = GeckoProfilerParams {
            features: "js,leaf".to_string(),
            threads: "GeckoMain,Renderer".to_string(),
            interval: Some(0.5),
            buffer_size: 1000,
        };
        let session = ProfilerSession::new(&params, false, ApiVariant::FiveArg);

        assert_eq!(
            session.start_command().unwrap(),
            r#"Services.profiler.StartProfiler(1000,0.5,["js","leaf"],["GeckoMain","Renderer"]);"#
        );
    }

    #[test]
    fn test_unknown_variant_has_no_command() {
        let session =
            ProfilerSession::new(&GeckoProfilerParams::default(), false, ApiVariant::Unknown);
        assert!(session.start_command().is_none());
    }
}
