//! Response body retention
//!
//! Strips `response.content.text` from HAR entries according to a
//! [`BodyPolicy`]. Entries without a response or content are left alone.

use telemetry_types::{BodyPolicy, HarLog};
use tracing::debug;

/// Applies a [`BodyPolicy`] to captured HAR logs
pub struct ResponseBodyFilter;

impl ResponseBodyFilter {
    /// Remove response bodies from `log` in place
    ///
    /// # Returns
    /// The number of bodies removed
    pub fn apply(log: &mut HarLog, policy: BodyPolicy) -> usize {
        if policy == BodyPolicy::All {
            return 0;
        }

        let mut removed = 0;
        for content in log.entries.iter_mut().filter_map(|e| e.content_mut()) {
            if policy == BodyPolicy::Html && content.is_html() {
                continue;
            }
            if content.text.take().is_some() {
                removed += 1;
            }
        }

        debug!("Removed {} response bodies (policy {})", removed, policy);
        removed
    }
}
