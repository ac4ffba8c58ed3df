//! Shared feed state.
//!
//! The store, the toast slot and the connection state live behind a single
//! mutex. Every mutation publishes a fresh [`FeedSnapshot`] on a watch
//! channel before the lock is released, so readers only ever see states in
//! which the list, the unread counter and the flags agree.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use crate::{
    connection::ConnectionState,
    decoder::{InboundFrame, MessageDecoder},
    event_handlers::{ConnectionError, EventHandlers},
    models::{FeedSnapshot, Notification, NotificationId},
    store::NotificationStore,
    toast::{ToastHost, ToastScheduler},
};

struct FeedState {
    store: NotificationStore,
    toast: ToastScheduler,
    connection_state: ConnectionState,
}

impl FeedState {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            notifications: self.store.to_vec(),
            unread_count: self.store.unread_count(),
            connection_state: self.connection_state,
            current_toast: self.toast.current().cloned(),
        }
    }
}

pub(crate) struct Feed {
    state: Mutex<FeedState>,
    decoder: MessageDecoder,
    snapshot_tx: watch::Sender<FeedSnapshot>,
}

impl Feed {
    pub(crate) fn new(toast_duration: Duration) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(FeedSnapshot::default());
        Arc::new(Self {
            state: Mutex::new(FeedState {
                store: NotificationStore::new(),
                toast: ToastScheduler::new(toast_duration),
                connection_state: ConnectionState::Disconnected,
            }),
            decoder: MessageDecoder::new(),
            snapshot_tx,
        })
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &FeedState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    /// Run `f` under the lock and publish if it reports a change.
    fn mutate(&self, f: impl FnOnce(&mut FeedState) -> bool) -> bool {
        let mut state = self.lock();
        let changed = f(&mut state);
        if changed {
            self.publish(&state);
        }
        changed
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot()
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        self.lock().connection_state
    }

    pub(crate) fn set_connection_state(&self, next: ConnectionState) {
        self.mutate(|state| {
            let changed = state.connection_state != next;
            state.connection_state = next;
            changed
        });
    }

    /// Decode one inbound frame and apply it.
    ///
    /// Acks and undecodable frames leave the feed untouched. Returns the id
    /// of the stored notification, if one was created.
    pub(crate) fn ingest_frame(
        self: &Arc<Self>,
        raw: &str,
        handlers: &EventHandlers,
    ) -> Option<NotificationId> {
        match self.decoder.decode(raw) {
            Ok(InboundFrame::Ack { message }) => {
                log::info!(
                    "[spendly-link] Registered for notifications{}",
                    message.map(|m| format!(": {}", m)).unwrap_or_default()
                );
                None
            },
            Ok(InboundFrame::Notification(notification)) => {
                log::debug!(
                    "[spendly-link] Notification {} ({}) received: {}",
                    notification.id,
                    notification.kind,
                    notification.title
                );
                let id = notification.id;
                let stored = self.insert(notification.clone());
                if stored {
                    handlers.emit_notification(&notification);
                    Some(id)
                } else {
                    None
                }
            },
            Err(e) => {
                log::warn!("[spendly-link] Discarding inbound frame: {}", e);
                handlers.emit_error(ConnectionError::new(e.to_string(), true));
                None
            },
        }
    }

    /// Append to the store and show as toast in one step.
    pub(crate) fn insert(self: &Arc<Self>, notification: Notification) -> bool {
        let host = Arc::downgrade(self);
        self.mutate(|state| {
            if !state.store.append(notification.clone()) {
                return false;
            }
            state.toast.show(notification, host);
            true
        })
    }

    pub(crate) fn mark_as_read(&self, id: NotificationId) -> bool {
        self.mutate(|state| state.store.mark_as_read(id))
    }

    pub(crate) fn mark_all_as_read(&self) -> bool {
        self.mutate(|state| state.store.mark_all_as_read())
    }

    pub(crate) fn clear(&self, id: NotificationId) -> bool {
        self.mutate(|state| state.store.clear(id))
    }

    pub(crate) fn clear_all(&self) -> bool {
        self.mutate(|state| state.store.clear_all())
    }

    pub(crate) fn hide_toast(&self) -> bool {
        self.mutate(|state| state.toast.hide())
    }

    #[cfg(test)]
    pub(crate) fn has_pending_toast_timer(&self) -> bool {
        self.lock().toast.has_pending_timer()
    }

    /// Cancel the toast timer for teardown. The slot itself is emptied too,
    /// so nothing is left that a late callback could act on.
    pub(crate) fn teardown(&self) {
        self.mutate(|state| {
            let had_toast = state.toast.hide();
            let was_live = state.connection_state != ConnectionState::Disconnected;
            state.connection_state = ConnectionState::Disconnected;
            had_toast || was_live
        });
    }
}

impl ToastHost for Feed {
    fn expire_toast(&self, generation: u64) {
        self.mutate(|state| state.toast.expire(generation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    const GOAL_FRAME: &str =
        r#"{"type":"GOAL_ACHIEVED","title":"Goal reached","message":"You hit $500"}"#;

    fn feed() -> Arc<Feed> {
        Feed::new(Duration::from_millis(5000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_ack_leaves_feed_empty() {
        let feed = feed();
        let rx = feed.subscribe();
        assert_eq!(feed.ingest_frame(r#"{"type":"connected"}"#, &EventHandlers::new()), None);

        let snapshot = feed.snapshot();
        assert!(snapshot.notifications.is_empty());
        assert_eq!(snapshot.unread_count, 0);
        assert!(snapshot.current_toast.is_none());
        assert!(!rx.has_changed().unwrap(), "an ack must not publish");
    }

    #[tokio::test(start_paused = true)]
    async fn test_goal_frame_stores_toasts_and_expires() {
        let feed = feed();
        let id = feed
            .ingest_frame(GOAL_FRAME, &EventHandlers::new())
            .expect("frame should produce a notification");

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.notifications[0].kind, NotificationKind::GoalAchieved);
        assert!(!snapshot.notifications[0].read);
        assert_eq!(snapshot.unread_count, 1);
        assert_eq!(snapshot.current_toast.as_ref().map(|n| n.id), Some(id));

        tokio::time::sleep(Duration::from_millis(5001)).await;
        tokio::task::yield_now().await;

        let snapshot = feed.snapshot();
        assert!(snapshot.current_toast.is_none());
        assert_eq!(snapshot.notifications.len(), 1, "expiry must not touch the store");
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_is_discarded() {
        let feed = feed();
        assert_eq!(feed.ingest_frame("{oops", &EventHandlers::new()), None);
        assert!(feed.snapshot().notifications.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_does_not_retract_toast() {
        let feed = feed();
        let id = feed.ingest_frame(GOAL_FRAME, &EventHandlers::new()).unwrap();
        assert!(feed.clear(id));

        let snapshot = feed.snapshot();
        assert!(snapshot.notifications.is_empty());
        assert_eq!(snapshot.current_toast.map(|n| n.id), Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hiding_toast_keeps_notification() {
        let feed = feed();
        let id = feed.ingest_frame(GOAL_FRAME, &EventHandlers::new()).unwrap();
        assert!(feed.hide_toast());
        assert!(!feed.has_pending_toast_timer());

        let snapshot = feed.snapshot();
        assert!(snapshot.current_toast.is_none());
        assert_eq!(snapshot.get(id).map(|n| n.read), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_published_snapshot_is_consistent() {
        let feed = feed();
        let mut rx = feed.subscribe();
        let handlers = EventHandlers::new();

        let a = feed.ingest_frame(GOAL_FRAME, &handlers).unwrap();
        let b = feed.ingest_frame(r#"{"type":"BUDGET_EXCEEDED","title":"Food"}"#, &handlers).unwrap();
        feed.mark_as_read(a);
        feed.clear(b);
        feed.mark_all_as_read();

        let last = rx.borrow_and_update().clone();
        assert_eq!(
            last.unread_count,
            last.notifications.iter().filter(|n| !n.read).count()
        );
        assert_eq!(last.notifications.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_toast_timer() {
        let feed = feed();
        feed.set_connection_state(ConnectionState::Connected);
        feed.ingest_frame(GOAL_FRAME, &EventHandlers::new());
        assert!(feed.has_pending_toast_timer());

        feed.teardown();
        assert!(!feed.has_pending_toast_timer());
        assert_eq!(feed.connection_state(), ConnectionState::Disconnected);
        assert!(feed.snapshot().current_toast.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_hook_sees_stored_item() {
        let feed = feed();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handlers = EventHandlers::new().on_notification(move |n| {
            sink.lock().unwrap().push(n.title.clone());
        });
        feed.ingest_frame(GOAL_FRAME, &handlers);
        feed.ingest_frame(r#"{"type":"connected"}"#, &handlers);
        assert_eq!(*seen.lock().unwrap(), vec!["Goal reached".to_string()]);
    }
}
