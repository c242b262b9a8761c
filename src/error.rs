//! Error types for iBot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for iBot operations
///
/// This enum encompasses all possible errors that can occur while talking
/// to the RAG service: configuration loading, request preconditions,
/// transport failures, stream decoding, cancellation, and API envelope
/// errors.
#[derive(Error, Debug)]
pub enum IbotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input, rejected before any network call
    #[error("Invalid input: {0}")]
    Precondition(String),

    /// Non-2xx HTTP status, missing response body, or connection failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// A malformed stream frame; recovered locally, never propagated
    #[error("Stream parse error: {0}")]
    StreamParse(String),

    /// User-initiated abort of an in-flight stream
    #[error("Stream cancelled")]
    Cancelled,

    /// An explicit error event carried in the server's stream payload
    #[error("Server error: {0}")]
    ServerSignaled(String),

    /// A non-success code in the API response envelope
    #[error("API error (code {code}): {msg}")]
    Api {
        /// The `code` field from the response envelope
        code: i64,
        /// The `msg` field from the response envelope, if any
        msg: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for iBot operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = IbotError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_precondition_error_display() {
        let error = IbotError::Precondition("query is empty".to_string());
        assert_eq!(error.to_string(), "Invalid input: query is empty");
    }

    #[test]
    fn test_transport_error_display() {
        let error = IbotError::Transport("HTTP 502 Bad Gateway".to_string());
        assert_eq!(error.to_string(), "Transport error: HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_stream_parse_error_display() {
        let error = IbotError::StreamParse("invalid JSON in frame".to_string());
        assert_eq!(
            error.to_string(),
            "Stream parse error: invalid JSON in frame"
        );
    }

    #[test]
    fn test_cancelled_error_display() {
        let error = IbotError::Cancelled;
        assert_eq!(error.to_string(), "Stream cancelled");
    }

    #[test]
    fn test_server_signaled_error_display() {
        let error = IbotError::ServerSignaled("knowledge base not found".to_string());
        assert_eq!(error.to_string(), "Server error: knowledge base not found");
    }

    #[test]
    fn test_api_error_display() {
        let error = IbotError::Api {
            code: 500,
            msg: "internal error".to_string(),
        };
        assert_eq!(error.to_string(), "API error (code 500): internal error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: IbotError = io_error.into();
        assert!(matches!(error, IbotError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: IbotError = json_error.into();
        assert!(matches!(error, IbotError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: IbotError = yaml_error.into();
        assert!(matches!(error, IbotError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IbotError>();
    }
}
