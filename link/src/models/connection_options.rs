use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SpendlyLinkError};

/// Default notification endpoint of the Spendly notification service.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8086/ws/notifications";

/// Connection-level options for the notification channel.
///
/// These options control:
/// - Which endpoint the channel dials
/// - Whether and how quickly a dropped channel is re-opened
/// - How long a toast stays visible
///
/// Reconnection uses a fixed delay with unbounded retries. There is no
/// exponential growth, jitter, or attempt cap.
///
/// # Example
///
/// ```rust
/// use spendly_link::ConnectionOptions;
///
/// let options = ConnectionOptions::default()
///     .with_endpoint("ws://localhost:8086/ws/notifications")
///     .with_reconnect_delay_ms(2000)
///     .with_toast_duration_ms(3000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// WebSocket URL of the notification service (`ws://` or `wss://`)
    /// Default: ws://localhost:8086/ws/notifications
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Re-open the channel after an abnormal close
    /// Default: true
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Fixed delay in milliseconds before a reconnect attempt
    /// Default: 5000ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// How long a toast stays up before it dismisses itself
    /// Default: 5000ms
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,

    /// Upper bound on the TCP + WebSocket handshake. `0` waits indefinitely.
    /// Default: 10000ms
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_toast_duration_ms() -> u64 {
    5000
}

fn default_connection_timeout_ms() -> u64 {
    10_000
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auto_reconnect: true,
            reconnect_delay_ms: 5000,
            toast_duration_ms: 5000,
            connection_timeout_ms: 10_000,
        }
    }
}

impl ConnectionOptions {
    /// Create new connection options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the notification endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set whether to automatically reconnect after an abnormal close
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Set the fixed delay before a reconnect attempt (in milliseconds)
    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Set how long toasts stay visible (in milliseconds)
    pub fn with_toast_duration_ms(mut self, duration_ms: u64) -> Self {
        self.toast_duration_ms = duration_ms;
        self
    }

    /// Set the connection handshake timeout (in milliseconds, 0 = none)
    pub fn with_connection_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// `None` when the handshake may take as long as it needs.
    pub fn connection_timeout(&self) -> Option<Duration> {
        if self.connection_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.connection_timeout_ms))
        }
    }

    /// Reject endpoints the channel could never dial.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(SpendlyLinkError::ConfigurationError(
                "Notification endpoint must not be empty".to_string(),
            ));
        }
        let Some((scheme, rest)) = endpoint.split_once("://") else {
            return Err(SpendlyLinkError::ConfigurationError(format!(
                "Notification endpoint '{}' has no scheme (expected ws:// or wss://)",
                endpoint
            )));
        };
        if !scheme.eq_ignore_ascii_case("ws") && !scheme.eq_ignore_ascii_case("wss") {
            return Err(SpendlyLinkError::ConfigurationError(format!(
                "Unsupported notification endpoint scheme '{}' (expected ws or wss)",
                scheme
            )));
        }
        if rest.is_empty() || rest.starts_with('/') {
            return Err(SpendlyLinkError::ConfigurationError(format!(
                "Notification endpoint '{}' has no host",
                endpoint
            )));
        }
        if self.toast_duration_ms == 0 {
            return Err(SpendlyLinkError::ConfigurationError(
                "toast_duration_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
