//! In-memory notification store.
//!
//! Holds the notification list (newest first) and the unread counter. The
//! counter is maintained alongside the list by the same five operations
//! that mutate it, so the two can never be observed out of step. There is
//! no eviction; the store grows until it is cleared.

use std::collections::VecDeque;

use crate::models::{Notification, NotificationId};

#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    items: VecDeque<Notification>,
    unread: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head. Returns `false` (and changes nothing) if a
    /// notification with the same id is already stored.
    pub fn append(&mut self, mut notification: Notification) -> bool {
        if self.position(notification.id).is_some() {
            log::warn!(
                "[spendly-link] Ignoring duplicate notification id {}",
                notification.id
            );
            return false;
        }
        notification.read = false;
        self.items.push_front(notification);
        self.unread += 1;
        true
    }

    /// Mark one notification read. No-op if it is missing or already read.
    pub fn mark_as_read(&mut self, id: NotificationId) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.read => {
                n.read = true;
                self.unread = self.unread.saturating_sub(1);
                true
            },
            _ => false,
        }
    }

    /// Mark everything read. Returns whether anything was unread.
    pub fn mark_all_as_read(&mut self) -> bool {
        let changed = self.unread > 0;
        for n in self.items.iter_mut() {
            n.read = true;
        }
        self.unread = 0;
        changed
    }

    /// Remove one notification. No-op if it is missing.
    pub fn clear(&mut self, id: NotificationId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if let Some(removed) = self.items.remove(index) {
            if !removed.read {
                self.unread = self.unread.saturating_sub(1);
            }
        }
        true
    }

    /// Remove everything. Returns whether the store had anything in it.
    pub fn clear_all(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        self.unread = 0;
        changed
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.items.iter().cloned().collect()
    }

    fn position(&self, id: NotificationId) -> Option<usize> {
        self.items.iter().position(|n| n.id == id)
    }
}
