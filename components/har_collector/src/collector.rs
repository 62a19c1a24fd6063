//! HarCollector implementation
//!
//! Triggers the in-page HAR export once per iteration, normalizes the reply,
//! filters response bodies, stamps the canonical page URL, and keeps the
//! captures in iteration order until the run is merged.

use browser_bridge::{HarMerger, ScriptChannel};
use std::sync::Arc;
use telemetry_types::{BodyPolicy, CollectionError, Har, HarExportResult, IterationResult};
use tracing::{debug, info};

use crate::alias::AliasUrlResolver;
use crate::body_filter::ResponseBodyFilter;

/// Label of the HAR export script
pub const HAR_EXPORT_LABEL: &str = "GET_HAR_SCRIPT";

/// Browser name written into placeholder HARs
pub const FAILURE_GENERATOR: &str = "Firefox";

const HAR_EXPORT_SCRIPT: &str = r#"const callback = arguments[arguments.length - 1];
async function triggerExport() {
  try {
    const result = await HAR.triggerExport();
    return callback({har: result});
  } catch (e) {
    return callback({error: String(e)});
  }
}
return triggerExport();"#;

/// Accumulates one HAR per iteration for a run
pub struct HarCollector {
    /// Whether HAR collection is on for the run
    enabled: bool,
    /// Which response bodies are kept
    policy: BodyPolicy,
    /// Alias table of the run
    resolver: AliasUrlResolver,
    /// Merge and placeholder collaborator
    merger: Arc<dyn HarMerger>,
    /// Captures in iteration order
    captures: Vec<Har>,
}

impl HarCollector {
    /// Create a collector
    ///
    /// # Arguments
    /// * `enabled` - `false` turns every operation into a no-op
    /// * `policy` - Response body retention policy
    /// * `merger` - Merges captures at run end and builds placeholders
    pub fn new(enabled: bool, policy: BodyPolicy, merger: Arc<dyn HarMerger>) -> Self {
        Self {
            enabled,
            policy,
            resolver: AliasUrlResolver::new(),
            merger,
            captures: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn policy(&self) -> BodyPolicy {
        self.policy
    }

    /// Captures accumulated so far, in iteration order
    pub fn captures(&self) -> &[Har] {
        &self.captures
    }

    /// The run's alias table
    pub fn resolver(&self) -> &AliasUrlResolver {
        &self.resolver
    }

    /// Start a new run: drop captures and alias bindings
    pub fn reset(&mut self) {
        self.captures.clear();
        self.resolver.clear();
    }

    /// Export, normalize, filter, and store the HAR of one iteration
    ///
    /// Returns `Ok(None)` when HAR collection is disabled. On error nothing
    /// is stored.
    pub async fn capture_iteration(
        &mut self,
        channel: &dyn ScriptChannel,
        result: &IterationResult,
    ) -> Result<Option<&Har>, CollectionError> {
        if !self.enabled {
            return Ok(None);
        }

        let reply = channel
            .run_async_script(HAR_EXPORT_SCRIPT, HAR_EXPORT_LABEL)
            .await?;
        let mut har = HarExportResult::from_reply(reply)?.normalize()?;

        ResponseBodyFilter::apply(&mut har.log, self.policy);

        if har.log.page_count() > 0 {
            let canonical = self.resolver.resolve(result.alias(), &result.url);
            if let Some(page) = har.log.first_page_mut() {
                page.url = Some(canonical);
            }
        } else {
            debug!("HAR of iteration {} has no pages, not tagging a URL", result.index);
        }

        info!(
            "Captured HAR for iteration {} with {} entries",
            result.index,
            har.log.entries.len()
        );
        self.captures.push(har);
        Ok(self.captures.last())
    }

    /// Store a placeholder HAR for an iteration that failed before capture
    pub fn record_failure(&mut self, url: &str) -> Option<&Har> {
        if !self.enabled {
            return None;
        }

        debug!("Recording placeholder HAR for {}", url);
        self.captures.push(self.merger.empty_har(url, FAILURE_GENERATOR));
        self.captures.last()
    }

    /// Merge every capture in iteration order
    ///
    /// `None` when HAR collection is disabled or nothing was captured.
    pub fn merge_all(&self) -> Option<Har> {
        if !self.enabled || self.captures.is_empty() {
            return None;
        }
        self.merger.merge_hars(&self.captures)
    }
}
