//! Library entry point for spendly-cli components.
//!
//! Exposes reusable modules (formatter, session store, config, etc.) so
//! integration tests can exercise CLI behaviour without going through the
//! binary entry point.

pub mod app;
pub mod config;
pub mod error;
pub mod formatter;
pub mod logging;
pub mod parser;
pub mod session;

pub use app::{CommandOutcome, FeedSession};
pub use config::CLIConfiguration;
pub use error::{CLIError, Result};
pub use formatter::NotificationFormatter;
pub use session::FileSessionStore;
