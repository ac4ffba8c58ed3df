use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe wrapper for the username the channel registers with.
///
/// Keeps the session identity from being mixed up with other string
/// values (endpoints, notification titles, raw frames) at compile time.
///
/// # Example
/// ```rust
/// use spendly_link::Username;
///
/// let username = Username::new("alice");
/// assert_eq!(username.as_str(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Create a new Username from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner String.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// `true` when the name is empty or whitespace only.
    ///
    /// A blank name counts as "no user signed in".
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Username {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
