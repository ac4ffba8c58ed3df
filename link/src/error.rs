//! Error types for spendly-link.
//!
//! Transport failures never reach callers through these types: they are
//! absorbed by the reconnect loop and only show up as connection-state
//! changes and `on_error` / `on_disconnect` hooks. What does surface here is
//! configuration, runtime and (internally) decode failures.

use thiserror::Error;

/// Errors produced by the notification channel client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpendlyLinkError {
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An inbound frame could not be turned into a notification.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The operation needs a tokio runtime and none is running.
    #[error("No tokio runtime available: {0}")]
    RuntimeUnavailable(String),
}

impl From<serde_json::Error> for SpendlyLinkError {
    fn from(err: serde_json::Error) -> Self {
        SpendlyLinkError::SerializationError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SpendlyLinkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SpendlyLinkError::WebSocketError(err.to_string())
    }
}

/// Result type for spendly-link operations.
pub type Result<T> = std::result::Result<T, SpendlyLinkError>;
