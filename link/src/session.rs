//! Session store abstraction.
//!
//! The channel only needs one thing from the surrounding application: who
//! is signed in. Where that answer lives (a login form, a session file, a
//! keychain, an environment variable) is up to the implementation.
//!
//! The username is read every time the channel connects or reconnects, so a
//! user switch is picked up by the next connection attempt.

use std::sync::RwLock;

use crate::models::Username;

/// Trait for session storage backends.
///
/// # Example Implementation
///
/// ```rust
/// use spendly_link::{SessionStore, Username};
///
/// struct EnvSession;
///
/// impl SessionStore for EnvSession {
///     fn username(&self) -> Option<Username> {
///         std::env::var("SPENDLY_USER").ok().map(Username::from)
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync {
    /// The signed-in user, or `None` when nobody is.
    fn username(&self) -> Option<Username>;

    /// Whether a (non-blank) user is signed in.
    fn is_signed_in(&self) -> bool {
        self.username().is_some_and(|u| !u.is_blank())
    }
}

impl<F> SessionStore for F
where
    F: Fn() -> Option<Username> + Send + Sync,
{
    fn username(&self) -> Option<Username> {
        self()
    }
}

/// In-memory session, settable at runtime.
#[derive(Debug, Default)]
pub struct StaticSession {
    username: RwLock<Option<Username>>,
}

impl StaticSession {
    pub fn new(username: impl Into<Username>) -> Self {
        Self {
            username: RwLock::new(Some(username.into())),
        }
    }

    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set_username(&self, username: impl Into<Username>) {
        let mut guard = self.username.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(username.into());
    }

    pub fn sign_out(&self) {
        let mut guard = self.username.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl SessionStore for StaticSession {
    fn username(&self) -> Option<Username> {
        self.username
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Resolve the username to register with, treating blank names as absent.
pub(crate) fn signed_in_user(session: &dyn SessionStore) -> Option<Username> {
    session.username().filter(|u| !u.is_blank())
}
