//! Command parser for the interactive feed
//!
//! Turns a line typed on stdin into a feed action.

use spendly_link::NotificationId;

use crate::error::{CLIError, Result};

/// Parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `read <id>`
    Read(NotificationId),
    /// `read-all`
    ReadAll,
    /// `clear <id>`
    Clear(NotificationId),
    /// `clear-all`
    ClearAll,
    /// `dismiss`: hide the current toast
    Dismiss,
    /// `reconnect`: retry now instead of waiting out the delay
    Reconnect,
    List,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  list            Show all notifications
  read <id>       Mark one notification as read
  read-all        Mark every notification as read
  clear <id>      Remove one notification
  clear-all       Remove every notification
  dismiss         Hide the current toast
  reconnect       Reconnect now
  help            Show this help
  quit            Exit";

/// Command parser
#[derive(Debug, Default)]
pub struct CommandParser;

impl CommandParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a command line
    pub fn parse(&self, line: &str) -> Result<Command> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Err(CLIError::ParseError("Empty command".into()));
        };

        let command = command.to_ascii_lowercase();
        let command = command.trim_start_matches('\\');

        match command {
            "read" | "r" => Ok(Command::Read(Self::parse_id(command, args)?)),
            "read-all" | "readall" => Self::no_args(Command::ReadAll, command, args),
            "clear" | "rm" => Ok(Command::Clear(Self::parse_id(command, args)?)),
            "clear-all" | "clearall" => Self::no_args(Command::ClearAll, command, args),
            "dismiss" | "hide" => Self::no_args(Command::Dismiss, command, args),
            "reconnect" => Self::no_args(Command::Reconnect, command, args),
            "list" | "ls" | "l" => Self::no_args(Command::List, command, args),
            "help" | "?" | "h" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CLIError::ParseError(format!(
                "Unknown command '{}'. Type 'help' for a list.",
                other
            ))),
        }
    }

    fn parse_id(command: &str, args: &[&str]) -> Result<NotificationId> {
        match args {
            [id] => id
                .trim_start_matches('#')
                .parse::<u64>()
                .map(NotificationId::new)
                .map_err(|_| CLIError::ParseError(format!("'{}' is not a notification id", id))),
            [] => Err(CLIError::ParseError(format!("Usage: {} <id>", command))),
            _ => Err(CLIError::ParseError(format!("{} takes exactly one id", command))),
        }
    }

    fn no_args(cmd: Command, command: &str, args: &[&str]) -> Result<Command> {
        if args.is_empty() {
            Ok(cmd)
        } else {
            Err(CLIError::ParseError(format!("{} takes no arguments", command)))
        }
    }
}
