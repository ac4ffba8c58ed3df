//! Low-level WebSocket helpers for the notification channel.
//!
//! Opening the socket, the register handshake, closing, and classifying
//! close frames. Everything stateful lives in [`super::manager`].

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        error::Error as WsError,
        protocol::{frame::coding::CloseCode, CloseFrame, Message},
    },
    MaybeTlsStream,
};

use crate::{
    error::{Result, SpendlyLinkError},
    event_handlers::{DisconnectReason, EventHandlers},
    models::{ClientMessage, Username},
};

use super::state::ConnectionEvent;

pub(crate) type WebSocketStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dial the endpoint and complete the WebSocket handshake.
pub(crate) async fn open_channel(endpoint: &str, timeout: Option<Duration>) -> Result<WebSocketStream> {
    let request = endpoint.into_client_request().map_err(|e| {
        SpendlyLinkError::WebSocketError(format!("Failed to build WebSocket request: {}", e))
    })?;

    let connect_result = match timeout {
        Some(limit) => tokio::time::timeout(limit, connect_async(request))
            .await
            .map_err(|_| SpendlyLinkError::TimeoutError(format!("Connection timeout ({:?})", limit)))?,
        None => connect_async(request).await,
    };

    match connect_result {
        Ok((stream, _response)) => Ok(stream),
        Err(WsError::Http(response)) => {
            let status = response.status();
            let body_text = response
                .into_body()
                .as_ref()
                .and_then(|b| {
                    if b.is_empty() { None } else { Some(String::from_utf8_lossy(b).into_owned()) }
                })
                .unwrap_or_default();
            let message = if body_text.is_empty() {
                format!("WebSocket HTTP error: {}", status.as_u16())
            } else {
                format!("WebSocket HTTP error {}: {}", status.as_u16(), body_text)
            };
            Err(SpendlyLinkError::WebSocketError(message))
        },
        Err(e) => Err(SpendlyLinkError::WebSocketError(format!("Connection failed: {}", e))),
    }
}

/// Send `{"type":"register","username":...}`.
pub(crate) async fn send_register(
    ws: &mut WebSocketStream,
    username: &Username,
    handlers: &EventHandlers,
) -> Result<()> {
    let payload = serde_json::to_string(&ClientMessage::register(username.clone()))?;
    ws.send(Message::Text(payload.clone().into()))
        .await
        .map_err(|e| SpendlyLinkError::WebSocketError(format!("Failed to send register: {}", e)))?;
    handlers.emit_send(&payload);
    log::debug!("[spendly-link] Registered as '{}'", username);
    Ok(())
}

/// Best-effort close handshake initiated by us.
pub(crate) async fn close_channel(ws: &mut WebSocketStream) {
    if let Err(e) = ws
        .close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "client disconnect".into(),
        }))
        .await
    {
        log::debug!("[spendly-link] Close handshake failed: {}", e);
    }
}

/// Finish a close the server started.
///
/// tungstenite queues the close reply when the server's close frame is
/// read, but only writes it on the next poll. Flush it, then read until the
/// server drops the socket, bounded by `grace`.
pub(crate) async fn finish_close(ws: &mut WebSocketStream, grace: Duration) {
    let drained = tokio::time::timeout(grace, async {
        if let Err(e) = ws.flush().await {
            log::debug!("[spendly-link] Failed to flush close reply: {}", e);
        }
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;
    if drained.is_err() {
        log::debug!("[spendly-link] Server kept the socket open after close, dropping it");
    }
}

/// Map a server close frame to a state machine event.
///
/// Only a Normal (1000) close counts as clean. Going-away, errors, and
/// status-less closes are treated as drops and lead to a reconnect.
pub(crate) fn classify_close(frame: Option<CloseFrame>) -> (ConnectionEvent, DisconnectReason) {
    match frame {
        Some(f) if f.code == CloseCode::Normal => (
            ConnectionEvent::ClosedCleanly,
            DisconnectReason::with_code(reason_or(&f, "Server closed connection"), f.code.into()),
        ),
        Some(f) => (
            ConnectionEvent::ClosedAbnormally,
            DisconnectReason::with_code(reason_or(&f, "Server closed connection"), f.code.into()),
        ),
        None => (
            ConnectionEvent::ClosedAbnormally,
            DisconnectReason::new("Server closed connection without a status"),
        ),
    }
}

fn reason_or(frame: &CloseFrame, fallback: &str) -> String {
    if frame.reason.is_empty() {
        fallback.to_string()
    } else {
        frame.reason.to_string()
    }
}
