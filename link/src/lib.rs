//! # spendly-link
//!
//! Client for the Spendly live notification channel.
//!
//! The crate keeps one WebSocket open to the notification service, registers
//! the signed-in user, and turns every pushed event into a [`Notification`]
//! in a newest-first feed with an unread counter and a transient toast.
//! Presentation layers subscribe to [`FeedSnapshot`]s and call back into the
//! five feed operations.
//!
//! ## Features
//!
//! - Single live channel with fixed-delay reconnection
//! - Explicit connection state machine
//! - Lenient decoding of unknown notification kinds
//! - Auto-dismissing toast slot
//! - Connection lifecycle hooks ([`EventHandlers`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use spendly_link::{NotificationClient, EventHandlers};
//!
//! #[tokio::main]
//! async fn main() -> spendly_link::Result<()> {
//!     let client = NotificationClient::builder()
//!         .username("alice")
//!         .event_handlers(EventHandlers::new().on_connect(|| println!("live")))
//!         .build()?;
//!
//!     client.connect()?;
//!     let mut feed = client.subscribe();
//!     feed.changed().await.ok();
//!     println!("unread: {}", feed.borrow().unread_count);
//!
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod connection;
pub mod decoder;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod session;
pub mod store;
pub mod toast;

pub(crate) mod feed;

pub use client::{NotificationClient, NotificationClientBuilder};
pub use connection::{ConnectionEvent, ConnectionState};
pub use decoder::{InboundFrame, MessageDecoder};
pub use error::{Result, SpendlyLinkError};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    ClientMessage, ConnectionOptions, FeedSnapshot, Notification, NotificationId, NotificationKind,
    Username,
};
pub use session::{SessionStore, StaticSession};
pub use store::NotificationStore;
pub use toast::ToastScheduler;
