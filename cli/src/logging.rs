// Logging module, powered by tracing-subscriber
//
// `spendly-link` logs through the `log` facade. A compatibility bridge
// (`tracing_log::LogTracer`) routes those records into the tracing
// subscriber configured here.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Build the `EnvFilter` from the base level plus quiet defaults for the
/// WebSocket stack.
pub fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];

    let noisy: &[(&str, &str)] = &[
        ("tungstenite", "warn"),
        ("tokio_tungstenite", "warn"),
        ("rustls", "warn"),
    ];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Initialize logging.
///
/// Without a file, records go to stderr so they never interleave with the
/// feed on stdout.
pub fn init_logging(level: &str, file_path: Option<&str>, format: &str) -> anyhow::Result<()> {
    let log_format = LogFormat::parse(format);

    let layer = match file_path {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                fs::create_dir_all(parent)?;
            }
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = Mutex::new(log_file);

            if log_format == LogFormat::Json {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_filter(build_env_filter(level)?)
                    .boxed()
            } else {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_target(true)
                    .with_filter(build_env_filter(level)?)
                    .boxed()
            }
        },
        None => {
            if log_format == LogFormat::Json {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_filter(build_env_filter(level)?)
                    .boxed()
            } else {
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_filter(build_env_filter(level)?)
                    .boxed()
            }
        },
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    // Bridge `log` crate → tracing. try_init() already does this when
    // tracing-subscriber is built with its `tracing-log` feature.
    tracing_log::LogTracer::init().ok();

    log::debug!("Logging initialized: level={}, file={:?}", level, file_path);
    Ok(())
}
