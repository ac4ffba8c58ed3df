use serde::{Deserialize, Serialize};

use super::username::Username;

/// Client-to-server messages.
///
/// The notification server only ever hears one thing from us: the
/// registration frame sent right after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind this socket to a user so the server can route pushes to it.
    ///
    /// Wire form: `{"type":"register","username":"alice"}`.
    Register {
        /// The signed-in user
        username: Username,
    },
}

impl ClientMessage {
    pub fn register(username: Username) -> Self {
        ClientMessage::Register { username }
    }
}
