//! Notification channel connection management.
//!
//! This module contains:
//! - [`state`]: The connection state machine and its transition table
//! - [`websocket`]: Low-level WebSocket helpers (open, register, close)
//! - [`manager`]: The connection task and its public handle

pub(crate) mod manager;
pub mod state;
pub(crate) mod websocket;

pub(crate) use manager::ConnectionManager;
pub use state::{ConnectionAction, ConnectionEvent, ConnectionMachine, ConnectionState, Transition};

/// Maximum text frame size (64 MiB).
pub(crate) const MAX_TEXT_FRAME_BYTES: usize = 64 << 20;

/// How long `disconnect()` waits for the close handshake before aborting.
pub(crate) const DISCONNECT_GRACE: std::time::Duration = std::time::Duration::from_secs(2);
