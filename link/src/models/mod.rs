//! Data models for the notification channel client.
//!
//! Defines the notification entity, its kind, the one outbound wire message,
//! connection options, and the snapshot handed to renderers.

pub mod client_message;
pub mod connection_options;
pub mod feed_snapshot;
pub mod notification;
pub mod notification_kind;
pub mod username;


pub use client_message::ClientMessage;
pub use connection_options::{ConnectionOptions, DEFAULT_ENDPOINT};
pub use feed_snapshot::FeedSnapshot;
pub use notification::{Notification, NotificationId};
pub use notification_kind::NotificationKind;
pub use username::Username;
