//! Inbound frame decoding.
//!
//! Turns one raw text frame into either a registration acknowledgement or a
//! [`Notification`]. Decoding never panics and never touches the store;
//! the caller decides what to do with the result (the feed appends and
//! toasts, a decode error is logged and the frame dropped).
//!
//! The decoder is lenient on purpose:
//!
//! - a missing `type` becomes [`NotificationKind::General`]
//! - an unrecognised `type` is kept verbatim as [`NotificationKind::Other`]
//! - missing `title` / `message` become empty strings, non-string values are
//!   rendered as their JSON text
//! - any other field is passed through in [`Notification::extra`]

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    error::{Result, SpendlyLinkError},
    models::{Notification, NotificationId, NotificationKind},
};

/// `type` value the server uses to acknowledge a `register` frame.
pub const ACK_TYPE: &str = "connected";

/// Keys the client assigns itself; inbound values for them are dropped.
const CLIENT_OWNED_KEYS: &[&str] = &["id", "read", "receivedAt"];

/// What a frame turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// `{"type":"connected",...}`: the server accepted our registration.
    Ack {
        /// The server's accompanying text, if any.
        message: Option<String>,
    },
    /// A user-facing notification.
    Notification(Notification),
}

/// Frame decoder with its own id counter.
///
/// Ids start at 1 and only go up, so every notification decoded by one
/// decoder is unique for the decoder's lifetime.
#[derive(Debug)]
pub struct MessageDecoder {
    next_id: AtomicU64,
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDecoder {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Decode a frame, stamping notifications with the current time.
    pub fn decode(&self, raw: &str) -> Result<InboundFrame> {
        self.decode_at(raw, Utc::now())
    }

    /// Decode a frame with an explicit receipt time.
    pub fn decode_at(&self, raw: &str, received_at: DateTime<Utc>) -> Result<InboundFrame> {
        let value: JsonValue = serde_json::from_str(raw)
            .map_err(|e| SpendlyLinkError::DecodeError(format!("Invalid JSON frame: {}", e)))?;

        let mut fields = match value {
            JsonValue::Object(map) => map,
            other => {
                return Err(SpendlyLinkError::DecodeError(format!(
                    "Expected a JSON object frame, got {}",
                    json_type_name(&other)
                )))
            },
        };

        if fields.get("type").and_then(JsonValue::as_str) == Some(ACK_TYPE) {
            let message = fields.get("message").and_then(JsonValue::as_str).map(str::to_string);
            return Ok(InboundFrame::Ack { message });
        }

        let kind = match fields.remove("type") {
            None | Some(JsonValue::Null) => NotificationKind::General,
            Some(JsonValue::String(raw_kind)) => NotificationKind::from_wire(&raw_kind),
            Some(other) => NotificationKind::Other(other.to_string()),
        };
        let title = take_text(&mut fields, "title");
        let message = take_text(&mut fields, "message");
        for key in CLIENT_OWNED_KEYS {
            fields.remove(*key);
        }

        let id = self.next_id();
        Ok(InboundFrame::Notification(Notification {
            id,
            kind,
            title,
            message,
            received_at,
            read: false,
            extra: fields,
        }))
    }

    fn next_id(&self) -> NotificationId {
        NotificationId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

fn take_text(fields: &mut Map<String, JsonValue>, key: &str) -> String {
    match fields.remove(key) {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
