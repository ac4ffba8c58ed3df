//! Error types for spendly-cli
//!
//! Provides user-friendly error messages and context for common CLI failures.

use spendly_link::SpendlyLinkError;
use std::fmt;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CLIError>;

/// Errors that can occur in the CLI
#[derive(Debug)]
pub enum CLIError {
    /// Error from spendly-link library
    LinkError(SpendlyLinkError),

    /// Configuration file error
    ConfigurationError(String),

    /// File I/O error
    FileError(String),

    /// Session file error
    SessionError(String),

    /// Invalid feed command
    ParseError(String),

    /// Logging could not be set up
    LoggingError(String),

    /// User cancelled operation
    Cancelled,
}

impl CLIError {
    fn format_link_error(err: &SpendlyLinkError) -> String {
        match err {
            SpendlyLinkError::WebSocketError(msg) => Self::clean_nested_message(msg),
            SpendlyLinkError::ConfigurationError(msg) => msg.clone(),
            SpendlyLinkError::TimeoutError(msg) => msg.clone(),
            SpendlyLinkError::SerializationError(msg) => msg.clone(),
            SpendlyLinkError::DecodeError(msg) => msg.clone(),
            SpendlyLinkError::RuntimeUnavailable(msg) => format!("No async runtime: {}", msg),
        }
    }

    fn clean_nested_message(message: &str) -> String {
        let mut cleaned = message.trim();
        let prefixes = ["Connection failed:", "connection failed:", "WebSocket error:"];

        loop {
            let mut stripped = false;
            for prefix in &prefixes {
                if let Some(rest) = cleaned.strip_prefix(prefix) {
                    cleaned = rest.trim_start();
                    stripped = true;
                    break;
                }
            }

            if !stripped {
                break;
            }
        }

        cleaned.to_string()
    }
}

impl fmt::Display for CLIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CLIError::LinkError(e) => write!(f, "{}", Self::format_link_error(e)),
            CLIError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            CLIError::FileError(msg) => write!(f, "File error: {}", msg),
            CLIError::SessionError(msg) => write!(f, "Session error: {}", msg),
            CLIError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CLIError::LoggingError(msg) => write!(f, "Logging error: {}", msg),
            CLIError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for CLIError {}

impl From<SpendlyLinkError> for CLIError {
    fn from(err: SpendlyLinkError) -> Self {
        CLIError::LinkError(err)
    }
}

impl From<std::io::Error> for CLIError {
    fn from(err: std::io::Error) -> Self {
        CLIError::FileError(err.to_string())
    }
}

impl From<toml::de::Error> for CLIError {
    fn from(err: toml::de::Error) -> Self {
        CLIError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for CLIError {
    fn from(err: toml::ser::Error) -> Self {
        CLIError::ConfigurationError(format!("Failed to serialize: {}", err))
    }
}

impl From<anyhow::Error> for CLIError {
    fn from(err: anyhow::Error) -> Self {
        CLIError::LoggingError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CLIError::ParseError("Unknown command 'foo'".into());
        assert_eq!(err.to_string(), "Parse error: Unknown command 'foo'");

        let err = CLIError::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_link_error_strips_nested_prefixes() {
        let err = CLIError::from(SpendlyLinkError::WebSocketError(
            "Connection failed: connection failed: refused".into(),
        ));
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn test_toml_error_is_configuration_error() {
        let err: CLIError = toml::from_str::<toml::Value>("[server\nurl=").unwrap_err().into();
        assert!(err.to_string().starts_with("Configuration error: TOML parse error"));
    }
}
