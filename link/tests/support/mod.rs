//! In-process notification server for integration tests.
//!
//! Binds `127.0.0.1:0`, completes the WebSocket handshake for every client,
//! and hands each accepted socket to the test so it can play the server
//! side frame by frame.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value as JsonValue;
use spendly_link::FeedSnapshot;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame, Message};
use tokio_tungstenite::WebSocketStream;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MockServer {
    url: String,
    accepted: mpsc::UnboundedReceiver<ServerSide>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock notification server");
        let addr = listener.local_addr().expect("local addr");
        let (tx, accepted) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => {
                        if tx.send(ServerSide { ws }).is_err() {
                            break;
                        }
                    },
                    Err(e) => eprintln!("mock server handshake failed: {}", e),
                }
            }
        });

        Self {
            url: format!("ws://{}/ws/notifications", addr),
            accepted,
            accept_task,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the next client connection.
    pub async fn accept(&mut self) -> ServerSide {
        tokio::time::timeout(TEST_TIMEOUT, self.accepted.recv())
            .await
            .expect("timed out waiting for a client connection")
            .expect("mock server stopped")
    }

    /// `true` if a client connected within `window`.
    pub async fn connects_within(&mut self, window: Duration) -> bool {
        matches!(tokio::time::timeout(window, self.accepted.recv()).await, Ok(Some(_)))
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Server end of one accepted channel.
pub struct ServerSide {
    ws: WebSocketStream<TcpStream>,
}

impl ServerSide {
    /// Next text frame from the client, parsed as JSON.
    pub async fn recv_json(&mut self) -> JsonValue {
        loop {
            let msg = tokio::time::timeout(TEST_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a client frame")
                .expect("client closed the channel")
                .expect("websocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("client sent invalid JSON");
            }
        }
    }

    /// Receive the register frame and return the username it carried.
    pub async fn expect_register(&mut self) -> String {
        let frame = self.recv_json().await;
        assert_eq!(frame["type"], "register", "first frame must be register: {}", frame);
        frame["username"].as_str().expect("username string").to_string()
    }

    pub async fn send_json(&mut self, value: JsonValue) {
        self.send_text(value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.ws
            .send(Message::Text(text.into().into()))
            .await
            .expect("send frame to client");
    }

    pub async fn send_ack(&mut self) {
        self.send_json(serde_json::json!({
            "type": "connected",
            "message": "Registered for notifications"
        }))
        .await;
    }

    /// Close with a status code, then drain until the client answers.
    pub async fn close_with(mut self, code: CloseCode) {
        let _ = self
            .ws
            .close(Some(CloseFrame {
                code,
                reason: "server closing".into(),
            }))
            .await;
        let _ = tokio::time::timeout(TEST_TIMEOUT, async {
            while let Some(Ok(_)) = self.ws.next().await {}
        })
        .await;
    }

    /// Close with a status code and return the code the client answers
    /// with. `None` means the socket ended without a close reply.
    pub async fn close_expecting_reply(mut self, code: CloseCode) -> Option<u16> {
        self.ws
            .close(Some(CloseFrame {
                code,
                reason: "server closing".into(),
            }))
            .await
            .expect("send close frame");
        self.expect_close().await
    }

    /// Drop the TCP connection without a close handshake.
    pub fn kill(self) {
        drop(self.ws);
    }

    /// Wait for the client's close frame and return its code.
    pub async fn expect_close(&mut self) -> Option<u16> {
        loop {
            let next = tokio::time::timeout(TEST_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for client close");
            match next {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| f.code.into()),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    }
}

/// Wait until a published snapshot satisfies `pred`.
pub async fn wait_for_snapshot(
    rx: &mut watch::Receiver<FeedSnapshot>,
    pred: impl FnMut(&FeedSnapshot) -> bool,
) -> FeedSnapshot {
    tokio::time::timeout(TEST_TIMEOUT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for snapshot")
        .expect("feed dropped")
        .clone()
}
