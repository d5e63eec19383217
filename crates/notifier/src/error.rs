// Error types for event notification

use thiserror::Error;

/// Result type alias for notifier operations
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Terminal errors surfaced to the invoking process.
///
/// Transport failures never appear here directly: the delivery engine retries
/// them and only reports [`NotifyError::ExhaustedRetries`] once the budget is
/// spent.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Event type is not in the variant's allow-list
    #[error("Invalid event type: {value}. Must be one of: {}", .allowed.join(", "))]
    InvalidEventType {
        value: String,
        allowed: Vec<&'static str>,
    },

    /// Target id cannot stand as a single path segment
    #[error("Invalid target id: {0:?}. It must be non-empty and not '.' or '..'")]
    InvalidTargetId(String),

    /// Identity token exchange failed
    #[error("Failed to acquire identity token: {0}")]
    TokenAcquisition(String),

    /// Every delivery attempt failed at the transport level
    #[error("Request failed after maximum retries. Last error after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// Remote endpoint answered with a status above 299
    #[error("Healthcheck API rejected the event ({status}): {message}")]
    RemoteRejection {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// Endpoint base URL cannot carry a path
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// HTTP client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Event could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NotifyError {
    /// Create a token acquisition error
    pub fn token(msg: impl Into<String>) -> Self {
        NotifyError::TokenAcquisition(msg.into())
    }

    /// Create an invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        NotifyError::InvalidUrl(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        NotifyError::Configuration(msg.into())
    }

    /// Whether the error was raised before any network activity
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NotifyError::InvalidEventType { .. }
                | NotifyError::InvalidTargetId(_)
                | NotifyError::InvalidUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_event_type_message() {
        let err = NotifyError::InvalidEventType {
            value: "release".to_string(),
            allowed: vec!["deploy", "incident"],
        };
        assert_eq!(
            err.to_string(),
            "Invalid event type: release. Must be one of: deploy, incident"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_invalid_target_id_is_validation() {
        let err = NotifyError::InvalidTargetId("..".to_string());
        assert!(err.to_string().contains("\"..\""));
        assert!(err.is_validation());
    }

    #[test]
    fn test_exhausted_retries_message() {
        let err = NotifyError::ExhaustedRetries {
            attempts: 3,
            last_error: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Request failed after maximum retries."));
        assert!(msg.contains("connection refused"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_remote_rejection_carries_message() {
        let err = NotifyError::RemoteRejection {
            status: 500,
            code: Some(500),
            message: "boom".to_string(),
        };
        assert!(err.to_string().contains("boom"));
    }
}
