// Shared types for per-iteration telemetry collection
//
// HAR document model, iteration descriptors, and the collection error taxonomy.

pub mod errors;
pub mod har;

// Re-export commonly used types
pub use errors::{ChannelError, CollectionError, FailurePolicy};
pub use har::{
    BodyPolicy, Har, HarContent, HarCreator, HarEntry, HarExportResult, HarLog, HarPage,
    HarResponse,
};

use serde::{Deserialize, Serialize};

/// Outcome of one measured page load, as handed over by the harness
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IterationResult {
    /// URL the browser reported for the iteration
    pub url: String,
    /// Logical alias of the navigation step, if the script set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Zero-based iteration index
    pub index: usize,
}

impl IterationResult {
    /// Create a result without an alias
    pub fn new(url: impl Into<String>, index: usize) -> Self {
        Self {
            url: url.into(),
            alias: None,
            index,
        }
    }

    /// Attach an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The alias, or `None` when it is unset or empty
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|alias| !alias.is_empty())
    }
}
