use clap::Parser;
use std::path::PathBuf;

/// Spendly Notify - live dashboard notifications in the terminal
#[derive(Parser, Debug)]
#[command(name = "spendly-notify")]
#[command(author = "Spendly Team")]
#[command(version)]
#[command(about = "Live Spendly notification feed for the terminal", long_about = None)]
pub struct Cli {
    /// Notification endpoint (e.g., ws://localhost:8086/ws/notifications)
    #[arg(short = 'u', long = "url", env = "SPENDLY_NOTIFY_URL")]
    pub url: Option<String>,

    /// Register as this user instead of the one in the session file
    #[arg(long = "username")]
    pub username: Option<String>,

    /// Configuration file path (default: ~/.config/spendly/config.toml)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Session file path (default: ~/.config/spendly/session.toml)
    #[arg(long = "session-file")]
    pub session_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Print the feed once and exit instead of running interactively
    #[arg(long = "once")]
    pub once: bool,

    /// How long --once waits for the channel to come up, in milliseconds
    #[arg(long = "wait-ms", value_name = "MS", default_value_t = 3000)]
    pub wait_ms: u64,

    // Session management commands
    /// Store USERNAME in the session file and exit
    #[arg(long = "sign-in", value_name = "USERNAME", conflicts_with = "sign_out")]
    pub sign_in: Option<String>,

    /// Delete the session file and exit
    #[arg(long = "sign-out")]
    pub sign_out: bool,
}
