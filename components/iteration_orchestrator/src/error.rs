//! Error types for the iteration orchestrator

use thiserror::Error;

/// Errors escaping the orchestrator
///
/// Collection failures never show up here; they are absorbed into the
/// iteration's [`CollectReport`](crate::CollectReport).
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration JSON did not parse
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// IO error while relocating browser logs
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::InvalidConfiguration("test".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: test");

        let err = OrchestratorError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.to_string(), "IO error: denied");
    }
}
