//! Hooks into the notification channel lifecycle.
//!
//! The feed snapshot already tells a renderer everything it draws. These
//! callbacks are for the side channel: status lines, desktop alerts, wire
//! tracing.
//!
//! ```rust,no_run
//! use spendly_link::{EventHandlers, NotificationClient};
//!
//! # fn example() -> spendly_link::Result<()> {
//! let handlers = EventHandlers::new()
//!     .on_notification(|n| println!("{}: {}", n.title, n.message))
//!     .on_disconnect(|reason| eprintln!("offline: {}", reason))
//!     .on_send(|raw| println!("-> {}", raw));
//!
//! let client = NotificationClient::builder()
//!     .username("alice")
//!     .event_handlers(handlers)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::models::Notification;

/// Why the channel went offline.
#[derive(Debug, Clone)]
pub struct DisconnectReason {
    pub message: String,
    /// Close code from the close frame, `None` for drops and failed dials.
    pub code: Option<u16>,
}

impl DisconnectReason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code: {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// A transport or frame problem reported through `on_error`.
///
/// `recoverable` is `true` when the reconnect timer will take care of it.
#[derive(Debug, Clone)]
pub struct ConnectionError {
    pub message: String,
    pub recoverable: bool,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            message: message.into(),
            recoverable,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

type Hook<A> = Option<Arc<dyn Fn(A) + Send + Sync>>;
type TextHook = Option<Arc<dyn Fn(&str) + Send + Sync>>;
type NotificationHook = Option<Arc<dyn Fn(&Notification) + Send + Sync>>;

/// Optional lifecycle callbacks, set builder-style.
///
/// Every callback runs on the connection task, between frames. A slow
/// callback holds up the channel.
#[derive(Clone, Default)]
pub struct EventHandlers {
    on_connect: Hook<()>,
    on_disconnect: Hook<DisconnectReason>,
    on_error: Hook<ConnectionError>,
    on_notification: NotificationHook,
    on_receive: TextHook,
    on_send: TextHook,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_notification", &self.on_notification.is_some())
            .field("on_receive", &self.on_receive.is_some())
            .field("on_send", &self.on_send.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel open and the register frame sent.
    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(move |()| f()));
        self
    }

    /// Channel closed, by either side.
    pub fn on_disconnect(mut self, f: impl Fn(DisconnectReason) + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// A decoded event. By the time this runs the notification is already
    /// in the store and on the toast.
    pub fn on_notification(mut self, f: impl Fn(&Notification) + Send + Sync + 'static) -> Self {
        self.on_notification = Some(Arc::new(f));
        self
    }

    /// Raw inbound text, before decoding. Acks and malformed frames included.
    pub fn on_receive(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_receive = Some(Arc::new(f));
        self
    }

    /// Raw outbound text.
    pub fn on_send(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_send = Some(Arc::new(f));
        self
    }

    pub fn has_any(&self) -> bool {
        self.on_connect.is_some()
            || self.on_disconnect.is_some()
            || self.on_error.is_some()
            || self.on_notification.is_some()
            || self.on_receive.is_some()
            || self.on_send.is_some()
    }

    pub(crate) fn emit_connect(&self) {
        if let Some(cb) = &self.on_connect {
            cb(());
        }
    }

    pub(crate) fn emit_disconnect(&self, reason: DisconnectReason) {
        if let Some(cb) = &self.on_disconnect {
            cb(reason);
        }
    }

    pub(crate) fn emit_error(&self, error: ConnectionError) {
        if let Some(cb) = &self.on_error {
            cb(error);
        }
    }

    pub(crate) fn emit_notification(&self, notification: &Notification) {
        if let Some(cb) = &self.on_notification {
            cb(notification);
        }
    }

    pub(crate) fn emit_receive(&self, raw: &str) {
        if let Some(cb) = &self.on_receive {
            cb(raw);
        }
    }

    pub(crate) fn emit_send(&self, raw: &str) {
        if let Some(cb) = &self.on_send {
            cb(raw);
        }
    }
}
