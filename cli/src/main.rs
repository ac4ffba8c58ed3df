//! Spendly Notify - terminal client for the Spendly notification channel
//!
//! # Usage
//!
//! ```bash
//! # Sign in once, then follow the live feed
//! spendly-notify --sign-in alice
//! spendly-notify
//!
//! # One-shot status check against a custom endpoint
//! spendly-notify --url ws://localhost:8086/ws/notifications --username alice --once
//! ```

use clap::Parser;
use colored::Colorize;
use spendly_link::{EventHandlers, NotificationClient, SessionStore, StaticSession, Username};
use std::sync::Arc;
use std::time::Duration;

use spendly_cli::{
    config::default_config_path, logging::init_logging, CLIConfiguration, FeedSession,
    FileSessionStore, NotificationFormatter, Result,
};

mod args;

use args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = CLIConfiguration::load(&config_path)?;

    let logging = config.resolved_logging();
    let level = cli.log_level.clone().unwrap_or(logging.level);
    init_logging(&level, logging.file.as_deref(), &logging.format)?;

    let session_store = FileSessionStore::with_path(
        cli.session_file.clone().unwrap_or_else(FileSessionStore::default_path),
    );

    // Session management commands
    if let Some(name) = cli.sign_in {
        let username = Username::new(name);
        session_store.sign_in(&username)?;
        println!("Signed in as {} ({})", username, session_store.path().display());
        return Ok(());
    }
    if cli.sign_out {
        session_store.sign_out()?;
        println!("Signed out");
        return Ok(());
    }

    let mut options = config.to_connection_options();
    if let Some(url) = cli.url {
        options = options.with_endpoint(url);
    }

    let session: Arc<dyn SessionStore> = match cli.username {
        Some(name) => Arc::new(StaticSession::new(name)),
        None => Arc::new(session_store),
    };

    let handlers = EventHandlers::new()
        .on_error(|e| log::debug!("Channel error: {}", e))
        .on_disconnect(|reason| log::info!("Channel closed: {}", reason));

    let client = NotificationClient::builder()
        .connection_options(options)
        .session(session)
        .event_handlers(handlers)
        .build()?;

    let ui = config.resolved_ui();
    let formatter = NotificationFormatter::new(ui.color && !cli.no_color, ui.max_badge);

    let started = client.connect()?;
    if !started {
        eprintln!("Not signed in: live notifications are disabled (use --username or --sign-in)");
    }

    let app = FeedSession::new(client, formatter);
    if cli.once {
        let wait = if started { Duration::from_millis(cli.wait_ms) } else { Duration::ZERO };
        app.print_once(wait).await;
        Ok(())
    } else {
        app.run_interactive().await
    }
}
