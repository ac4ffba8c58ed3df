//! Interactive feed session
//!
//! Drives one [`NotificationClient`]: prints status changes and toasts as
//! snapshots arrive, and applies the commands typed on stdin.

use chrono::Utc;
use spendly_link::{FeedSnapshot, NotificationClient};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    error::Result,
    formatter::NotificationFormatter,
    parser::{Command, CommandParser, HELP_TEXT},
};

/// Result of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Print this and keep going
    Continue(String),
    Quit,
}

pub struct FeedSession {
    client: NotificationClient,
    formatter: NotificationFormatter,
    parser: CommandParser,
}

impl FeedSession {
    pub fn new(client: NotificationClient, formatter: NotificationFormatter) -> Self {
        Self {
            client,
            formatter,
            parser: CommandParser::new(),
        }
    }

    pub fn client(&self) -> &NotificationClient {
        &self.client
    }

    /// Parse and run one input line.
    pub fn handle_line(&self, line: &str) -> CommandOutcome {
        match self.parser.parse(line) {
            Ok(command) => self.execute(command),
            Err(e) => CommandOutcome::Continue(e.to_string()),
        }
    }

    pub fn execute(&self, command: Command) -> CommandOutcome {
        let message = match command {
            Command::Read(id) => {
                if self.client.mark_as_read(id) {
                    format!("Marked #{} as read", id)
                } else {
                    format!("No unread notification #{}", id)
                }
            },
            Command::ReadAll => {
                if self.client.mark_all_as_read() {
                    "Marked all notifications as read".to_string()
                } else {
                    "Nothing unread".to_string()
                }
            },
            Command::Clear(id) => {
                if self.client.clear(id) {
                    format!("Removed #{}", id)
                } else {
                    format!("No notification #{}", id)
                }
            },
            Command::ClearAll => {
                if self.client.clear_all() {
                    "Cleared all notifications".to_string()
                } else {
                    "Nothing to clear".to_string()
                }
            },
            Command::Dismiss => {
                let msg = if self.client.hide_toast() {
                    "Toast dismissed"
                } else {
                    "No toast showing"
                };
                return CommandOutcome::Continue(msg.to_string());
            },
            Command::Reconnect => match self.client.reconnect() {
                Ok(true) => "Reconnecting...".to_string(),
                Ok(false) => "Not signed in".to_string(),
                Err(e) => return CommandOutcome::Continue(format!("Reconnect failed: {}", e)),
            },
            Command::List => {
                return CommandOutcome::Continue(
                    self.formatter.format_list(&self.client.snapshot(), Utc::now()),
                );
            },
            Command::Help => return CommandOutcome::Continue(HELP_TEXT.to_string()),
            Command::Quit => return CommandOutcome::Quit,
        };

        CommandOutcome::Continue(format!(
            "{}\n{}",
            message,
            self.formatter.format_header(&self.client.snapshot())
        ))
    }

    /// Lines to print when the feed moves from `prev` to `next`.
    pub fn render_changes(&self, prev: &FeedSnapshot, next: &FeedSnapshot) -> Vec<String> {
        let mut out = Vec::new();

        let new_toast = next
            .current_toast
            .as_ref()
            .filter(|t| prev.current_toast.as_ref().map(|p| p.id) != Some(t.id));
        if let Some(toast) = new_toast {
            out.push(self.formatter.format_toast(toast));
        }

        if new_toast.is_some() || prev.connection_state != next.connection_state {
            out.push(self.formatter.format_header(next));
        }
        out
    }

    /// Run until `quit`, end of input, or Ctrl-C.
    pub async fn run_interactive(&self) -> Result<()> {
        let mut feed = self.client.subscribe();
        let mut last = feed.borrow_and_update().clone();
        println!("{}", self.formatter.format_header(&last));
        println!("Type 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                changed = feed.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = feed.borrow_and_update().clone();
                    for line in self.render_changes(&last, &next) {
                        println!("{}", line);
                    }
                    last = next;
                }

                line = lines.next_line() => match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match self.handle_line(&line) {
                        CommandOutcome::Continue(out) => println!("{}", out),
                        CommandOutcome::Quit => break,
                    },
                    None => break,
                },

                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }

        self.client.shutdown().await;
        Ok(())
    }

    /// Wait up to `wait` for the channel, print the feed, and shut down.
    pub async fn print_once(&self, wait: Duration) {
        if !wait.is_zero() {
            let mut feed = self.client.subscribe();
            let connected = tokio::time::timeout(wait, feed.wait_for(|s| s.is_connected()))
                .await
                .is_ok_and(|r| r.is_ok());
            if !connected {
                log::info!("Channel not live after {:?}", wait);
            }
        }

        println!("{}", self.formatter.format_list(&self.client.snapshot(), Utc::now()));
        self.client.shutdown().await;
    }
}
