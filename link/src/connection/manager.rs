//! Live channel manager.
//!
//! Keeps at most one notification channel open per client. The channel is
//! owned by a single background task which:
//!
//! 1. Opens the WebSocket and sends the `register` frame
//! 2. Feeds every inbound frame to the decoder / feed
//! 3. On an abnormal close waits the fixed reconnect delay, then reopens
//! 4. Exits on `disconnect()` after a clean close handshake
//!
//! The reconnect timer is just a deadline inside that task, so there can
//! never be two pending reconnects. The state machine in [`super::state`]
//! decides every transition.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;
use tokio_tungstenite::tungstenite::{error::Error as WsError, protocol::Message};

use crate::{
    error::{Result, SpendlyLinkError},
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    feed::Feed,
    models::{ConnectionOptions, Username},
    session::{signed_in_user, SessionStore},
};

use super::{
    state::{ConnectionAction, ConnectionEvent, ConnectionMachine, ConnectionState},
    websocket::{self, WebSocketStream},
    DISCONNECT_GRACE, MAX_TEXT_FRAME_BYTES,
};

// ── Commands ────────────────────────────────────────────────────────────────

/// Commands sent from the public API to the background connection task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnCmd {
    /// `connect()` on an existing task: reopen if idle, otherwise nothing.
    Connect,
    /// Manual reconnect: skip the remaining backoff delay.
    ReconnectNow,
    /// Close the channel and end the task.
    Disconnect,
}

struct LiveConnection {
    cmd_tx: mpsc::UnboundedSender<ConnCmd>,
    task: JoinHandle<()>,
}

impl LiveConnection {
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

// ── ConnectionManager (public handle) ───────────────────────────────────────

pub(crate) struct ConnectionManager {
    options: ConnectionOptions,
    session: Arc<dyn SessionStore>,
    handlers: EventHandlers,
    feed: Arc<Feed>,
    live: Mutex<Option<LiveConnection>>,
}

impl ConnectionManager {
    pub(crate) fn new(
        options: ConnectionOptions,
        session: Arc<dyn SessionStore>,
        handlers: EventHandlers,
        feed: Arc<Feed>,
    ) -> Self {
        Self {
            options,
            session,
            handlers,
            feed,
            live: Mutex::new(None),
        }
    }

    fn lock_live(&self) -> MutexGuard<'_, Option<LiveConnection>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start the channel for the signed-in user.
    ///
    /// Returns `Ok(false)` without doing anything when nobody is signed in.
    /// Calling it while a channel task is already running never opens a
    /// second channel.
    pub(crate) fn connect(&self) -> Result<bool> {
        if signed_in_user(self.session.as_ref()).is_none() {
            log::info!("[spendly-link] No username in session, skipping notification channel");
            return Ok(false);
        }

        let mut live = self.lock_live();
        if let Some(existing) = live.as_ref().filter(|l| l.is_running()) {
            let _ = existing.cmd_tx.send(ConnCmd::Connect);
            return Ok(true);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SpendlyLinkError::RuntimeUnavailable(e.to_string()))?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = ConnectionTask {
            options: self.options.clone(),
            session: self.session.clone(),
            handlers: self.handlers.clone(),
            feed: self.feed.clone(),
            machine: ConnectionMachine::new(),
            reconnect_at: None,
        };
        let handle = runtime.spawn(task.run(cmd_rx));
        *live = Some(LiveConnection { cmd_tx, task: handle });
        Ok(true)
    }

    /// Fire a pending reconnect now, or start the channel if none is running.
    ///
    /// Like `connect()`, returns `Ok(false)` when nobody is signed in, even
    /// if an idle channel task is still around.
    pub(crate) fn reconnect(&self) -> Result<bool> {
        if signed_in_user(self.session.as_ref()).is_none() {
            log::info!("[spendly-link] No username in session, not reconnecting");
            return Ok(false);
        }
        {
            let live = self.lock_live();
            if let Some(existing) = live.as_ref().filter(|l| l.is_running()) {
                let _ = existing.cmd_tx.send(ConnCmd::ReconnectNow);
                return Ok(true);
            }
        }
        self.connect()
    }

    /// Cancel any pending reconnect and close the channel. Idempotent.
    pub(crate) async fn disconnect(&self) {
        let live = self.lock_live().take();
        if let Some(mut live) = live {
            let _ = live.cmd_tx.send(ConnCmd::Disconnect);
            if tokio::time::timeout(DISCONNECT_GRACE, &mut live.task).await.is_err() {
                log::warn!(
                    "[spendly-link] Channel task did not stop within {:?}, aborting",
                    DISCONNECT_GRACE
                );
                live.task.abort();
            }
        }
        self.feed.set_connection_state(ConnectionState::Disconnected);
    }

    /// Synchronous teardown for `Drop`: no close handshake, no callbacks.
    pub(crate) fn abort(&self) {
        if let Some(live) = self.lock_live().take() {
            let _ = live.cmd_tx.send(ConnCmd::Disconnect);
            live.task.abort();
        }
    }

    /// Whether a channel task exists (connected, connecting, or waiting to
    /// reconnect).
    pub(crate) fn is_active(&self) -> bool {
        self.lock_live().as_ref().is_some_and(LiveConnection::is_running)
    }
}

// ── Background connection task ──────────────────────────────────────────────

enum OpenOutcome {
    Opened(WebSocketStream, Username),
    Failed(SpendlyLinkError),
    SignedOut,
    Shutdown,
}

struct ConnectionTask {
    options: ConnectionOptions,
    session: Arc<dyn SessionStore>,
    handlers: EventHandlers,
    feed: Arc<Feed>,
    machine: ConnectionMachine,
    /// Deadline of the one pending reconnect, mirrors `machine.reconnect_pending()`.
    reconnect_at: Option<TokioInstant>,
}

impl ConnectionTask {
    /// Apply an event, keep the reconnect deadline in sync, and publish the
    /// resulting state. Channel I/O actions are left to the caller.
    fn step(&mut self, event: ConnectionEvent) -> &'static [ConnectionAction] {
        let event = if event == ConnectionEvent::ClosedAbnormally && !self.options.auto_reconnect {
            log::info!("[spendly-link] Auto-reconnect disabled, staying offline");
            ConnectionEvent::ClosedCleanly
        } else {
            event
        };

        let actions = self.machine.apply(event);
        for action in actions {
            match action {
                ConnectionAction::ScheduleReconnect => {
                    let delay = self.options.reconnect_delay();
                    log::info!(
                        "[spendly-link] Attempting reconnection in {}ms",
                        delay.as_millis()
                    );
                    self.reconnect_at = Some(TokioInstant::now() + delay);
                },
                ConnectionAction::OpenChannel | ConnectionAction::CancelReconnect => {
                    self.reconnect_at = None;
                },
                ConnectionAction::SendRegister | ConnectionAction::CloseChannel => {},
            }
        }
        self.feed.set_connection_state(self.machine.state());
        actions
    }

    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<ConnCmd>) {
        let mut ws_stream: Option<WebSocketStream> = None;
        self.step(ConnectionEvent::ConnectRequested);

        loop {
            match self.machine.state() {
                ConnectionState::Connecting => match self.open(&mut cmd_rx).await {
                    OpenOutcome::Opened(mut stream, username) => {
                        self.step(ConnectionEvent::Opened);
                        if let Err(e) = websocket::send_register(&mut stream, &username, &self.handlers).await {
                            log::warn!("[spendly-link] {}", e);
                            self.handlers.emit_error(ConnectionError::new(e.to_string(), true));
                            self.handlers.emit_disconnect(DisconnectReason::new(e.to_string()));
                            self.step(ConnectionEvent::ClosedAbnormally);
                            continue;
                        }
                        log::info!("[spendly-link] Notification channel connected");
                        self.handlers.emit_connect();
                        ws_stream = Some(stream);
                    },
                    OpenOutcome::Failed(e) => {
                        log::warn!("[spendly-link] Failed to open notification channel: {}", e);
                        self.handlers.emit_error(ConnectionError::new(e.to_string(), true));
                        self.step(ConnectionEvent::ClosedAbnormally);
                    },
                    OpenOutcome::SignedOut => {
                        log::info!("[spendly-link] Session has no username anymore, not reconnecting");
                        self.step(ConnectionEvent::ClosedCleanly);
                    },
                    OpenOutcome::Shutdown => {
                        self.step(ConnectionEvent::DisconnectRequested);
                        return;
                    },
                },

                ConnectionState::Connected => {
                    let Some(ws) = ws_stream.as_mut() else {
                        self.step(ConnectionEvent::ClosedAbnormally);
                        continue;
                    };

                    tokio::select! {
                        biased;

                        cmd = cmd_rx.recv() => match cmd {
                            Some(ConnCmd::Connect) | Some(ConnCmd::ReconnectNow) => {
                                log::debug!("[spendly-link] Already connected, ignoring connect request");
                            },
                            Some(ConnCmd::Disconnect) | None => {
                                self.step(ConnectionEvent::DisconnectRequested);
                                if let Some(mut stream) = ws_stream.take() {
                                    websocket::close_channel(&mut stream).await;
                                }
                                self.handlers.emit_disconnect(DisconnectReason::with_code(
                                    "Client disconnected",
                                    1000,
                                ));
                                return;
                            },
                        },

                        frame = ws.next() => {
                            if let Some((event, reason)) = self.handle_frame(ws, frame).await {
                                log::info!("[spendly-link] Notification channel closed: {}", reason);
                                ws_stream = None;
                                self.handlers.emit_disconnect(reason);
                                self.step(event);
                            }
                        }
                    }
                },

                ConnectionState::Disconnected => match self.reconnect_at {
                    Some(deadline) => {
                        tokio::select! {
                            biased;

                            cmd = cmd_rx.recv() => match cmd {
                                Some(ConnCmd::ReconnectNow) => {
                                    log::info!("[spendly-link] Manual reconnect requested");
                                    self.step(ConnectionEvent::ReconnectTimerFired);
                                },
                                Some(ConnCmd::Connect) => {
                                    self.step(ConnectionEvent::ConnectRequested);
                                },
                                Some(ConnCmd::Disconnect) | None => {
                                    self.step(ConnectionEvent::DisconnectRequested);
                                    return;
                                },
                            },

                            _ = tokio::time::sleep_until(deadline) => {
                                log::info!("[spendly-link] Attempting to reconnect...");
                                self.step(ConnectionEvent::ReconnectTimerFired);
                            }
                        }
                    },
                    None => match cmd_rx.recv().await {
                        Some(ConnCmd::Connect) => {
                            self.step(ConnectionEvent::ConnectRequested);
                        },
                        Some(ConnCmd::ReconnectNow) => {
                            self.step(ConnectionEvent::ReconnectTimerFired);
                        },
                        Some(ConnCmd::Disconnect) | None => {
                            self.step(ConnectionEvent::DisconnectRequested);
                            return;
                        },
                    },
                },
            }
        }
    }

    /// Open the socket while still answering `disconnect()`.
    async fn open(&mut self, cmd_rx: &mut mpsc::UnboundedReceiver<ConnCmd>) -> OpenOutcome {
        let Some(username) = signed_in_user(self.session.as_ref()) else {
            return OpenOutcome::SignedOut;
        };

        let endpoint = self.options.endpoint.clone();
        log::debug!("[spendly-link] Opening notification channel to {}", endpoint);
        let open = websocket::open_channel(&endpoint, self.options.connection_timeout());
        tokio::pin!(open);

        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => match cmd {
                    Some(ConnCmd::Connect) | Some(ConnCmd::ReconnectNow) => continue,
                    Some(ConnCmd::Disconnect) | None => return OpenOutcome::Shutdown,
                },

                result = &mut open => {
                    return match result {
                        Ok(stream) => OpenOutcome::Opened(stream, username),
                        Err(e) => OpenOutcome::Failed(e),
                    };
                }
            }
        }
    }

    /// Handle one inbound frame. Returns the close event when the channel
    /// is gone.
    async fn handle_frame(
        &mut self,
        ws: &mut WebSocketStream,
        frame: Option<std::result::Result<Message, WsError>>,
    ) -> Option<(ConnectionEvent, DisconnectReason)> {
        match frame {
            Some(Ok(Message::Text(text))) => {
                self.ingest(text.as_str());
                None
            },
            Some(Ok(Message::Binary(data))) => {
                match std::str::from_utf8(&data) {
                    Ok(text) => self.ingest(text),
                    Err(e) => {
                        log::warn!("[spendly-link] Discarding non UTF-8 binary frame: {}", e);
                        self.handlers.emit_error(ConnectionError::new(
                            format!("Binary frame is not UTF-8: {}", e),
                            true,
                        ));
                    },
                }
                None
            },
            Some(Ok(Message::Ping(payload))) => {
                if let Err(e) = ws.send(Message::Pong(payload)).await {
                    log::debug!("[spendly-link] Failed to answer ping: {}", e);
                }
                None
            },
            Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => None,
            Some(Ok(Message::Close(frame))) => {
                websocket::finish_close(ws, DISCONNECT_GRACE).await;
                Some(websocket::classify_close(frame))
            },
            Some(Err(e)) => {
                let msg = e.to_string();
                log::warn!("[spendly-link] WebSocket error: {}", msg);
                self.handlers.emit_error(ConnectionError::new(&msg, true));
                self.step(ConnectionEvent::Errored);
                Some((
                    ConnectionEvent::ClosedAbnormally,
                    DisconnectReason::new(format!("WebSocket error: {}", msg)),
                ))
            },
            None => Some((
                ConnectionEvent::ClosedAbnormally,
                DisconnectReason::new("WebSocket stream ended"),
            )),
        }
    }

    fn ingest(&self, text: &str) {
        if text.len() > MAX_TEXT_FRAME_BYTES {
            log::warn!("[spendly-link] Text frame too large ({} bytes), discarding", text.len());
            return;
        }
        self.handlers.emit_receive(text);
        self.feed.ingest_frame(text, &self.handlers);
    }
}
