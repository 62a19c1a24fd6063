// Collection error taxonomy
//
// Every failure in the collection path is converted into a `CollectionError`.
// `CollectionError::policy` is the single table deciding what the orchestrator
// does with it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the browser script channel or the remote device link
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The script was rejected or threw inside the browser
    #[error("script '{label}' failed: {message}")]
    ScriptFailed { label: String, message: String },

    /// The channel gave up waiting for the script
    #[error("script '{label}' timed out")]
    Timeout { label: String },

    /// No browser session is attached to the channel
    #[error("browser session is not available")]
    SessionClosed,

    /// Connecting to the remote device failed
    #[error("device connection failed: {0}")]
    Connection(String),

    /// Pulling a file from the remote device failed
    #[error("device transfer failed: {0}")]
    Transfer(String),
}

impl ChannelError {
    /// Shorthand for a rejected script
    pub fn script_failed(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptFailed {
            label: label.into(),
            message: message.into(),
        }
    }
}

/// What the orchestrator does when a collection step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure; the iteration contributes nothing for that step
    LogAndContinue,
    /// Log the failure and stop using that feature for the rest of the run
    LogAndSkipFeature,
}

/// Failure of a single collection step
#[derive(Error, Debug)]
pub enum CollectionError {
    /// `StartProfiler` has an argument count this collector does not know
    #[error("unsupported profiler API: StartProfiler takes {found} arguments")]
    UnsupportedProfilerApi { found: String },

    /// A script call into the browser failed
    #[error("script channel error: {0}")]
    Channel(#[from] ChannelError),

    /// The in-browser profile dump reported an error
    #[error("profile dump failed: {0}")]
    ProfileDump(String),

    /// The HAR exporter answered with an error payload
    #[error("HAR exporter reported an error: {0}")]
    Exporter(String),

    /// The HAR exporter answered with something that is not a HAR
    #[error("unexpected HAR export shape: {0}")]
    UnexpectedExportShape(String),

    /// The HAR payload did not deserialize
    #[error("malformed HAR: {0}")]
    MalformedHar(#[from] serde_json::Error),

    /// Retrieving an artifact from the remote device failed
    #[error("failed to transfer {remote} to {}: {source}", local.display())]
    Transfer {
        remote: String,
        local: PathBuf,
        #[source]
        source: ChannelError,
    },

    /// The page URL could not be turned into an output folder
    #[error("invalid page URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Creating an output directory failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl CollectionError {
    /// Policy applied to this failure
    pub fn policy(&self) -> FailurePolicy {
        match self {
            CollectionError::UnsupportedProfilerApi { .. } => FailurePolicy::LogAndSkipFeature,
            _ => FailurePolicy::LogAndContinue,
        }
    }

    /// Short stable name of the failure kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            CollectionError::UnsupportedProfilerApi { .. } => "unsupported_api",
            CollectionError::Channel(_) => "channel",
            CollectionError::ProfileDump(_) => "profile_dump",
            CollectionError::Exporter(_) => "exporter",
            CollectionError::UnexpectedExportShape(_) => "export_shape",
            CollectionError::MalformedHar(_) => "malformed_har",
            CollectionError::Transfer { .. } => "transfer",
            CollectionError::InvalidUrl { .. } => "invalid_url",
            CollectionError::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let unsupported = CollectionError::UnsupportedProfilerApi {
            found: "3".to_string(),
        };
        assert_eq!(unsupported.policy(), FailurePolicy::LogAndSkipFeature);

        let exporter = CollectionError::Exporter("boom".to_string());
        assert_eq!(exporter.policy(), FailurePolicy::LogAndContinue);

        let channel = CollectionError::from(ChannelError::script_failed("GET_HAR", "dead"));
        assert_eq!(channel.policy(), FailurePolicy::LogAndContinue);

        let transfer = CollectionError::Transfer {
            remote: "/sdcard/geckoProfile-0.json".to_string(),
            local: PathBuf::from("/tmp/geckoProfile-0.json"),
            source: ChannelError::Transfer("no device".to_string()),
        };
        assert_eq!(transfer.policy(), FailurePolicy::LogAndContinue);
    }

    #[test]
    fn test_error_display() {
        let err = ChannelError::script_failed("GET_HAR", "boom");
        assert_eq!(err.to_string(), "script 'GET_HAR' failed: boom");

        let err = CollectionError::Exporter("boom".to_string());
        assert_eq!(err.to_string(), "HAR exporter reported an error: boom");

        let err = CollectionError::UnsupportedProfilerApi {
            found: "3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported profiler API: StartProfiler takes 3 arguments"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CollectionError::ProfileDump("x".into()).kind(), "profile_dump");
        assert_eq!(
            CollectionError::from(ChannelError::SessionClosed).kind(),
            "channel"
        );
    }
}
