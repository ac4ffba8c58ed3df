use serde::{Deserialize, Serialize};

use crate::connection::ConnectionState;

use super::notification::{Notification, NotificationId};

/// Point-in-time view of everything the presentation layer renders.
///
/// Snapshots are published atomically: the list, the unread counter, the
/// connection state and the toast always belong to the same moment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    /// Newest first.
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub connection_state: ConnectionState,
    pub current_toast: Option<Notification>,
}

impl FeedSnapshot {
    /// `true` while the live channel is open (the "● Live" indicator).
    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }
}
