// HAR (HTTP Archive) document model
//
// Only the fields the collector reads or writes are typed. Everything else is
// kept verbatim in the `extra` maps so a capture round-trips without loss.

use crate::errors::CollectionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which captured response bodies survive into the HAR
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyPolicy {
    /// Drop every response body
    #[default]
    None,
    /// Keep bodies of HTML responses only
    Html,
    /// Keep every response body
    All,
}

impl fmt::Display for BodyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyPolicy::None => "none",
            BodyPolicy::Html => "html",
            BodyPolicy::All => "all",
        };
        f.write_str(name)
    }
}

/// A HAR document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Har {
    pub log: HarLog,
}

/// The `log` object of a HAR document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HarLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<HarCreator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<HarCreator>,
    /// Absent in some exporter versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<HarPage>>,
    #[serde(default)]
    pub entries: Vec<HarEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `creator` / `browser` record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HarCreator {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One page of a HAR log
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarPage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub started_date_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Canonical page URL, stamped by the collector
    #[serde(rename = "_url", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One request/response pair
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HarResponse>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response half of an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HarResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<HarContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body description
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HarContent {
    /// Whether the declared MIME type names an HTML document
    pub fn is_html(&self) -> bool {
        self.mime_type
            .as_deref()
            .map_or(false, |mime| mime.contains("text/html"))
    }
}

impl HarEntry {
    /// Mutable access to `response.content`, if the entry has one
    pub fn content_mut(&mut self) -> Option<&mut HarContent> {
        self.response.as_mut().and_then(|r| r.content.as_mut())
    }

    /// `response.content`, if the entry has one
    pub fn content(&self) -> Option<&HarContent> {
        self.response.as_ref().and_then(|r| r.content.as_ref())
    }
}

impl HarLog {
    /// Number of pages, zero when `pages` is absent
    pub fn page_count(&self) -> usize {
        self.pages.as_ref().map_or(0, Vec::len)
    }

    /// First page of the log
    pub fn first_page_mut(&mut self) -> Option<&mut HarPage> {
        self.pages.as_mut().and_then(|pages| pages.first_mut())
    }
}

impl Har {
    /// Parse a HAR from a JSON value
    pub fn from_value(value: Value) -> Result<Self, CollectionError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize the HAR back into a JSON value
    pub fn to_value(&self) -> Result<Value, CollectionError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Raw reply of the in-page HAR export trigger
///
/// Exporter versions disagree on whether the HAR is wrapped in `{log: ...}`.
/// [`HarExportResult::from_reply`] classifies the reply once and
/// [`HarExportResult::normalize`] maps every success shape onto [`Har`].
#[derive(Debug, Clone, PartialEq)]
pub enum HarExportResult {
    /// `{log: {...}}`
    LogWrapper(Har),
    /// The log object itself
    BareLog(HarLog),
    /// `{error: ...}`
    ErrorPayload(Value),
}

impl HarExportResult {
    /// Classify the value the export script handed to its callback
    ///
    /// The script answers `{har: <payload>}` or `{error: <reason>}`; a reply
    /// without either key is treated as the payload itself.
    pub fn from_reply(reply: Value) -> Result<Self, CollectionError> {
        let mut reply = match reply {
            Value::Object(map) => map,
            other => {
                return Err(CollectionError::UnexpectedExportShape(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        if let Some(error) = reply.remove("error") {
            if !error.is_null() {
                return Ok(HarExportResult::ErrorPayload(error));
            }
        }

        let payload = match reply.remove("har") {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(CollectionError::UnexpectedExportShape(format!(
                    "har payload is not an object: {}",
                    other
                )))
            }
            None => reply,
        };

        if payload.contains_key("log") {
            Ok(HarExportResult::LogWrapper(serde_json::from_value(
                Value::Object(payload),
            )?))
        } else {
            Ok(HarExportResult::BareLog(serde_json::from_value(
                Value::Object(payload),
            )?))
        }
    }

    /// Map the reply onto a wrapped HAR, or the exporter's error
    pub fn normalize(self) -> Result<Har, CollectionError> {
        match self {
            HarExportResult::LogWrapper(har) => Ok(har),
            HarExportResult::BareLog(log) => Ok(Har { log }),
            HarExportResult::ErrorPayload(Value::String(message)) => {
                Err(CollectionError::Exporter(message))
            }
            HarExportResult::ErrorPayload(other) => {
                Err(CollectionError::Exporter(other.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_log() -> Value {
        json!({
            "version": "1.2",
            "creator": {"name": "Firefox", "version": "120.0"},
            "pages": [{"id": "page_1", "startedDateTime": "2024-01-01T00:00:00.000Z", "title": "Home", "pageTimings": {"onLoad": 120}}],
            "entries": [{
                "pageref": "page_1",
                "time": 12.5,
                "request": {"method": "GET", "url": "https://example.com/"},
                "response": {"status": 200, "content": {"mimeType": "text/html", "size": 5, "text": "hello"}}
            }]
        })
    }

    #[test]
    fn test_wrapped_reply_normalizes() {
        let reply = json!({"har": {"log": sample_log()}});
        let result = HarExportResult::from_reply(reply).unwrap();
        assert!(matches!(result, HarExportResult::LogWrapper(_)));

        let har = result.normalize().unwrap();
        assert_eq!(har.log.page_count(), 1);
        assert_eq!(har.log.entries.len(), 1);
    }

    #[test]
    fn test_bare_log_reply_normalizes() {
        let reply = json!({"har": sample_log()});
        let result = HarExportResult::from_reply(reply).unwrap();
        assert!(matches!(result, HarExportResult::BareLog(_)));

        let har = result.normalize().unwrap();
        assert_eq!(har.log.version.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_error_reply() {
        let result = HarExportResult::from_reply(json!({"error": "boom"})).unwrap();
        assert_eq!(result, HarExportResult::ErrorPayload(json!("boom")));

        let err = result.normalize().unwrap_err();
        assert!(matches!(err, CollectionError::Exporter(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_non_object_reply_is_rejected() {
        let err = HarExportResult::from_reply(json!(null)).unwrap_err();
        assert_eq!(err.kind(), "export_shape");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let value = json!({"log": sample_log()});
        let har = Har::from_value(value.clone()).unwrap();
        assert_eq!(har.to_value().unwrap(), value);
    }

    #[test]
    fn test_sparse_log_round_trips_without_added_fields() {
        let log = json!({"creator": {"name": "x"}, "pages": [{"id": "p"}], "entries": []});
        let har = HarExportResult::from_reply(log.clone())
            .unwrap()
            .normalize()
            .unwrap();

        assert_eq!(har.to_value().unwrap(), json!({ "log": log }));
    }

    #[test]
    fn test_missing_pages_is_tolerated() {
        let har = Har::from_value(json!({"log": {"entries": []}})).unwrap();
        assert_eq!(har.log.pages, None);
        assert_eq!(har.log.page_count(), 0);
        assert_eq!(har.to_value().unwrap(), json!({"log": {"entries": []}}));
    }

    #[test]
    fn test_is_html() {
        let content = HarContent {
            mime_type: Some("text/html; charset=utf-8".to_string()),
            ..Default::default()
        };
        assert!(content.is_html());
        assert!(!HarContent::default().is_html());
    }

    #[test]
    fn test_body_policy_serde() {
        let policy: BodyPolicy = serde_json::from_value(json!("html")).unwrap();
        assert_eq!(policy, BodyPolicy::Html);
        assert_eq!(BodyPolicy::default(), BodyPolicy::None);
        assert_eq!(BodyPolicy::All.to_string(), "all");
    }
}
