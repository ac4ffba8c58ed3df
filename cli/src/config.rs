//! Configuration file management
//!
//! CLIConfiguration with TOML parsing for ~/.config/spendly/config.toml
//!
//! # Configuration Format
//!
//! ```toml
//! [server]
//! url = "ws://localhost:8086/ws/notifications"  # Notification endpoint
//!
//! [connection]
//! auto_reconnect = true          # Re-open the channel after a drop
//! reconnect_delay_ms = 5000      # Fixed delay before each reconnect
//! toast_duration_ms = 5000       # How long a toast stays up
//! connection_timeout_ms = 10000  # Handshake timeout (0 = none)
//!
//! [ui]
//! color = true
//! max_badge = 9                  # Badge shows "9+" above this
//!
//! [logging]
//! level = "warn"                 # error, warn, info, debug, trace
//! file = "/tmp/spendly.log"      # Optional; stderr when unset
//! format = "compact"             # compact, json
//! ```

use serde::{Deserialize, Serialize};
use spendly_link::ConnectionOptions;
use std::path::{Path, PathBuf};

use crate::error::{CLIError, Result};

/// CLI configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CLIConfiguration {
    /// Server connection settings
    pub server: Option<ServerConfig>,

    /// Connection/reconnection settings
    pub connection: Option<ConnectionConfig>,

    /// UI preferences
    pub ui: Option<UIConfig>,

    /// Log output
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Notification endpoint (e.g., ws://localhost:8086/ws/notifications)
    pub url: Option<String>,
}

/// Connection settings for reconnection behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Enable automatic reconnection on connection loss (default: true)
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Fixed delay between reconnection attempts in milliseconds (default: 5000)
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Toast auto-dismiss delay in milliseconds (default: 5000)
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,

    /// Handshake timeout in milliseconds, 0 = none (default: 10000)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,

    /// Largest unread count shown verbatim on the badge
    #[serde(default = "default_max_badge")]
    pub max_badge: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; logs go to stderr when unset
    pub file: Option<String>,

    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
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

fn default_color() -> bool {
    true
}

fn default_max_badge() -> usize {
    9
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for CLIConfiguration {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig {
                url: Some(spendly_link::models::DEFAULT_ENDPOINT.to_string()),
            }),
            connection: Some(ConnectionConfig {
                auto_reconnect: default_auto_reconnect(),
                reconnect_delay_ms: default_reconnect_delay_ms(),
                toast_duration_ms: default_toast_duration_ms(),
                connection_timeout_ms: default_connection_timeout_ms(),
            }),
            ui: Some(UIConfig {
                color: default_color(),
                max_badge: default_max_badge(),
            }),
            logging: None,
        }
    }
}

pub fn expand_config_path(path: &Path) -> PathBuf {
    let Some(path_str) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    }
    path.to_path_buf()
}

/// `~/.config/spendly/config.toml` (platform config dir when available)
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("spendly").join("config.toml"),
        None => expand_config_path(Path::new("~/.config/spendly/config.toml")),
    }
}

impl CLIConfiguration {
    /// Load configuration from file
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if !path.exists() {
            log::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CLIError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: CLIConfiguration = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn to_connection_options(&self) -> ConnectionOptions {
        let mut options = ConnectionOptions::default();

        if let Some(url) = self.server.as_ref().and_then(|s| s.url.clone()) {
            options = options.with_endpoint(url);
        }

        if let Some(ref conn) = self.connection {
            options = options
                .with_auto_reconnect(conn.auto_reconnect)
                .with_reconnect_delay_ms(conn.reconnect_delay_ms)
                .with_toast_duration_ms(conn.toast_duration_ms)
                .with_connection_timeout_ms(conn.connection_timeout_ms);
        }

        options
    }

    pub fn resolved_ui(&self) -> UIConfig {
        self.ui.clone().unwrap_or(UIConfig {
            color: default_color(),
            max_badge: default_max_badge(),
        })
    }

    pub fn resolved_logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or(LoggingConfig {
            level: default_log_level(),
            file: None,
            format: default_log_format(),
        })
    }
}
