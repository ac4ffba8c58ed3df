use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use super::notification_kind::NotificationKind;

/// Locally assigned notification identifier.
///
/// The server does not send ids; the decoder hands them out from a
/// per-client monotonic counter so two frames decoded in the same clock
/// tick still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(u64);

impl NotificationId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NotificationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A notification received over the live channel.
///
/// Everything but `read` is fixed at decode time. Fields the server sent
/// beyond `type`/`title`/`message` (for example `username` or the server's
/// own `timestamp`) are kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,

    #[serde(rename = "type")]
    pub kind: NotificationKind,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub message: String,

    /// Client clock at decode time; independent of any server timestamp.
    pub received_at: DateTime<Utc>,

    #[serde(default)]
    pub read: bool,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Notification {
    /// Create an unread notification with no passthrough fields.
    pub fn new(
        id: NotificationId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            received_at,
            read: false,
            extra: Map::new(),
        }
    }

    /// The `timestamp` field the server attached, if it sent one as a string.
    pub fn server_timestamp(&self) -> Option<&str> {
        self.extra.get("timestamp").and_then(JsonValue::as_str)
    }

    /// Look up a passthrough field.
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.extra.get(name)
    }
}
