//! Notification channel client with builder pattern.
//!
//! Provides the primary interface the dashboard uses to receive live
//! notifications and to reconcile read/unread state.

use crate::{
    connection::{ConnectionManager, ConnectionState},
    error::Result,
    event_handlers::EventHandlers,
    feed::Feed,
    models::{ConnectionOptions, FeedSnapshot, Notification, NotificationId, Username},
    session::{SessionStore, StaticSession},
};
use std::sync::Arc;
use tokio::sync::watch;

/// Notification channel client.
///
/// One instance owns at most one live channel, the notification list, and
/// the toast slot. Dropping it cancels every timer and the channel task.
///
/// Use [`NotificationClientBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust,no_run
/// use spendly_link::NotificationClient;
///
/// # async fn example() -> spendly_link::Result<()> {
/// let client = NotificationClient::builder()
///     .endpoint("ws://localhost:8086/ws/notifications")
///     .username("alice")
///     .build()?;
///
/// client.connect()?;
///
/// let mut feed = client.subscribe();
/// while feed.changed().await.is_ok() {
///     let snapshot = feed.borrow_and_update().clone();
///     println!("{} unread", snapshot.unread_count);
/// }
/// # Ok(())
/// # }
/// ```
pub struct NotificationClient {
    options: ConnectionOptions,
    feed: Arc<Feed>,
    manager: ConnectionManager,
}

impl NotificationClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> NotificationClientBuilder {
        NotificationClientBuilder::new()
    }

    /// Open the channel for the signed-in user.
    ///
    /// Returns `Ok(false)` when the session has no username. Must be called
    /// from within a tokio runtime.
    pub fn connect(&self) -> Result<bool> {
        self.manager.connect()
    }

    /// Close the channel and cancel any pending reconnect.
    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
    }

    /// Skip the remaining reconnect delay, or connect if idle. `Ok(false)`
    /// when nobody is signed in.
    pub fn reconnect(&self) -> Result<bool> {
        self.manager.reconnect()
    }

    /// Disconnect and cancel the toast timer. Nothing fires afterwards.
    pub async fn shutdown(&self) {
        self.manager.disconnect().await;
        self.feed.teardown();
    }

    /// Watch every change of the feed.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.feed.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.feed.snapshot()
    }

    /// Notifications, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.feed.snapshot().notifications
    }

    pub fn unread_count(&self) -> usize {
        self.feed.snapshot().unread_count
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.feed.connection_state()
    }

    /// Whether a channel task is running (connected, connecting or waiting
    /// to reconnect).
    pub fn is_active(&self) -> bool {
        self.manager.is_active()
    }

    pub fn current_toast(&self) -> Option<Notification> {
        self.feed.snapshot().current_toast
    }

    /// Mark one notification as read. Unknown ids are ignored.
    pub fn mark_as_read(&self, id: NotificationId) -> bool {
        self.feed.mark_as_read(id)
    }

    pub fn mark_all_as_read(&self) -> bool {
        self.feed.mark_all_as_read()
    }

    /// Remove one notification. Unknown ids are ignored.
    pub fn clear(&self, id: NotificationId) -> bool {
        self.feed.clear(id)
    }

    pub fn clear_all(&self) -> bool {
        self.feed.clear_all()
    }

    /// Dismiss the current toast before its timer fires.
    pub fn hide_toast(&self) -> bool {
        self.feed.hide_toast()
    }

    /// Get the configured connection options
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

impl Drop for NotificationClient {
    fn drop(&mut self) {
        self.manager.abort();
        self.feed.teardown();
    }
}

impl std::fmt::Debug for NotificationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationClient")
            .field("endpoint", &self.options.endpoint)
            .field("connection_state", &self.connection_state())
            .finish()
    }
}

/// Builder for configuring [`NotificationClient`] instances.
pub struct NotificationClientBuilder {
    options: ConnectionOptions,
    session: Option<Arc<dyn SessionStore>>,
    event_handlers: EventHandlers,
}

impl NotificationClientBuilder {
    fn new() -> Self {
        Self {
            options: ConnectionOptions::default(),
            session: None,
            event_handlers: EventHandlers::default(),
        }
    }

    /// Set the WebSocket endpoint (e.g., "ws://localhost:8086/ws/notifications")
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.options.endpoint = url.into();
        self
    }

    /// Replace all connection options at once.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use spendly_link::{ConnectionOptions, NotificationClient};
    ///
    /// # fn example() -> spendly_link::Result<()> {
    /// let client = NotificationClient::builder()
    ///     .connection_options(
    ///         ConnectionOptions::new()
    ///             .with_reconnect_delay_ms(2_000)
    ///             .with_toast_duration_ms(3_000),
    ///     )
    ///     .username("alice")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Read the username from a shared session store at every (re)connect.
    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Shorthand for a fixed username.
    pub fn username(mut self, username: impl Into<Username>) -> Self {
        self.session = Some(Arc::new(StaticSession::new(username)));
        self
    }

    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Build the client
    ///
    /// Without a session the client never connects (`connect()` returns
    /// `Ok(false)`).
    pub fn build(self) -> Result<NotificationClient> {
        self.options.validate()?;

        let session = self
            .session
            .unwrap_or_else(|| Arc::new(StaticSession::anonymous()));
        let feed = Feed::new(self.options.toast_duration());
        let manager =
            ConnectionManager::new(self.options.clone(), session, self.event_handlers, feed.clone());

        Ok(NotificationClient {
            options: self.options,
            feed,
            manager,
        })
    }
}
