//! Alias to canonical URL table
//!
//! Single-page apps change routes without a top-level navigation, so every
//! iteration sharing an alias reports the URL the alias was first seen with.

use std::collections::HashMap;
use tracing::debug;

/// First-write-wins mapping from alias to canonical URL, scoped to one run
#[derive(Debug, Clone, Default)]
pub struct AliasUrlResolver {
    table: HashMap<String, String>,
}

impl AliasUrlResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical URL for a page observed at `observed_url`
    ///
    /// Without an alias the observed URL is returned and nothing is recorded.
    /// An unseen alias is bound to `observed_url`; a bound alias returns its
    /// original URL.
    pub fn resolve(&mut self, alias: Option<&str>, observed_url: &str) -> String {
        let alias = match alias.filter(|alias| !alias.is_empty()) {
            Some(alias) => alias,
            None => return observed_url.to_string(),
        };

        self.table
            .entry(alias.to_string())
            .or_insert_with(|| {
                debug!("Bound alias {} to {}", alias, observed_url);
                observed_url.to_string()
            })
            .clone()
    }

    /// URL bound to `alias`, if any
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.table.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        self.table.clear();
    }
}
