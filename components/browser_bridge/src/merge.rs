//! HAR merging and placeholder HARs

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use telemetry_types::{Har, HarContent, HarCreator, HarEntry, HarLog, HarPage, HarResponse};
use tracing::debug;

/// Page id used by placeholder HARs
pub const FAILING_PAGE_ID: &str = "failing_page";

/// Merges per-iteration HARs into one document
pub trait HarMerger: Send + Sync {
    /// Merge `hars` in order; `None` for an empty list
    fn merge_hars(&self, hars: &[Har]) -> Option<Har>;

    /// Placeholder HAR for a URL whose iteration failed
    fn empty_har(&self, url: &str, generator: &str) -> Har;
}

/// Appends the pages and entries of every HAR onto the first one
#[derive(Debug, Clone)]
pub struct DefaultHarMerger {
    creator: HarCreator,
}

impl DefaultHarMerger {
    /// Create a merger stamping this crate as the HAR creator
    pub fn new() -> Self {
        Self {
            creator: HarCreator {
                name: "browser-telemetry".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                comment: None,
            },
        }
    }

    /// Creator record written into placeholder HARs
    pub fn creator(&self) -> &HarCreator {
        &self.creator
    }
}

impl Default for DefaultHarMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl HarMerger for DefaultHarMerger {
    fn merge_hars(&self, hars: &[Har]) -> Option<Har> {
        let (first, rest) = hars.split_first()?;
        let mut merged = first.clone();

        for har in rest {
            if let Some(pages) = &har.log.pages {
                merged
                    .log
                    .pages
                    .get_or_insert_with(Vec::new)
                    .extend(pages.iter().cloned());
            }
            merged.log.entries.extend(har.log.entries.iter().cloned());
        }

        debug!(
            "Merged {} HARs into {} pages and {} entries",
            hars.len(),
            merged.log.page_count(),
            merged.log.entries.len()
        );
        Some(merged)
    }

    fn empty_har(&self, url: &str, generator: &str) -> Har {
        empty_har(&self.creator, url, generator)
    }
}

/// Build a minimal HAR with one page and one zero-time entry for `url`
pub fn empty_har(creator: &HarCreator, url: &str, generator: &str) -> Har {
    let started = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let page = HarPage {
        id: FAILING_PAGE_ID.to_string(),
        started_date_time: started.clone(),
        title: url.to_string(),
        url: Some(url.to_string()),
        extra: object(json!({
            "pageTimings": {},
            "comment": "Failing page"
        })),
    };

    let entry = HarEntry {
        pageref: Some(FAILING_PAGE_ID.to_string()),
        response: Some(HarResponse {
            content: Some(HarContent {
                mime_type: Some("x-unknown".to_string()),
                text: None,
                extra: object(json!({ "size": 0 })),
            }),
            extra: object(json!({
                "status": 0,
                "statusText": "",
                "httpVersion": "",
                "headers": [],
                "cookies": [],
                "redirectURL": "",
                "headersSize": -1,
                "bodySize": -1
            })),
        }),
        extra: object(json!({
            "startedDateTime": started,
            "time": 0,
            "request": {
                "method": "GET",
                "url": url,
                "httpVersion": "",
                "headers": [],
                "cookies": [],
                "queryString": [],
                "headersSize": -1,
                "bodySize": -1
            },
            "cache": {},
            "timings": { "send": 0, "wait": 0, "receive": 0 }
        })),
    };

    Har {
        log: HarLog {
            version: Some("1.2".to_string()),
            creator: Some(creator.clone()),
            browser: Some(HarCreator {
                name: generator.to_string(),
                version: String::new(),
                comment: None,
            }),
            pages: Some(vec![page]),
            entries: vec![entry],
            extra: Map::new(),
        },
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
