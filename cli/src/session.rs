//! File-based session storage for the CLI
//!
//! FileSessionStore keeps the signed-in username in a small TOML file so
//! the terminal feed knows whom to register as.
//!
//! # File Location
//!
//! - Linux/macOS: `~/.config/spendly/session.toml`
//! - Fallback: `~/.spendly/session.toml`
//!
//! # File Format
//!
//! ```toml
//! username = "alice"
//! signed_in_at = "2025-06-01T12:00:00Z"
//! ```
//!
//! The file is re-read every time the channel asks for the username, so
//! signing out in another terminal stops the next reconnect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendly_link::{SessionStore, Username};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CLIError, Result};

/// On-disk session record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SessionFile {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    signed_in_at: Option<DateTime<Utc>>,
}

/// File-backed [`SessionStore`]
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    file_path: PathBuf,
}

impl FileSessionStore {
    /// Default session file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("spendly").join("session.toml")
        } else if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".spendly").join("session.toml")
        } else {
            PathBuf::from(".spendly").join("session.toml")
        }
    }

    /// Session store at the default location
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Session store at a custom location
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// Get the file path used by this store
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Read the stored username. A missing file means nobody is signed in.
    pub fn load(&self) -> Result<Option<Username>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.file_path).map_err(|e| {
            CLIError::SessionError(format!(
                "Cannot read session file {}: {}",
                self.file_path.display(),
                e
            ))
        })?;

        let file: SessionFile = toml::from_str(&contents).map_err(|e| {
            CLIError::SessionError(format!(
                "Corrupted session file {}: {}",
                self.file_path.display(),
                e.message()
            ))
        })?;

        let username = Username::new(file.username);
        Ok((!username.is_blank()).then_some(username))
    }

    /// Persist a sign-in.
    pub fn sign_in(&self, username: &Username) -> Result<()> {
        if username.is_blank() {
            return Err(CLIError::SessionError("Username must not be blank".to_string()));
        }

        let file = SessionFile {
            username: username.as_str().to_string(),
            signed_in_at: Some(Utc::now()),
        };
        let contents = toml::to_string_pretty(&file)?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CLIError::SessionError(format!(
                    "Failed to create session directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(&self.file_path, contents).map_err(|e| {
            CLIError::SessionError(format!(
                "Failed to write session file at '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        // Set file permissions to 0600 (owner read/write only) on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.file_path, fs::Permissions::from_mode(0o600)).map_err(
                |e| {
                    CLIError::SessionError(format!(
                        "Failed to set file permissions for '{}': {}",
                        self.file_path.display(),
                        e
                    ))
                },
            )?;
        }

        Ok(())
    }

    /// Remove the session file. Signing out twice is fine.
    pub fn sign_out(&self) -> Result<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CLIError::SessionError(format!(
                "Failed to remove session file '{}': {}",
                self.file_path.display(),
                e
            ))),
        }
    }
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for FileSessionStore {
    fn username(&self) -> Option<Username> {
        match self.load() {
            Ok(username) => username,
            Err(e) => {
                log::warn!("{}", e);
                None
            },
        }
    }
}
