//! Connection state machine.
//!
//! All lifecycle decisions of the channel go through one transition table,
//! [`ConnectionState::on`]. The table is pure: it maps the current state, an
//! event and whether a reconnect is already pending to the next state and
//! the side effects the connection task must carry out.
//!
//! | From                     | Event                          | To           | Actions                         |
//! |--------------------------|--------------------------------|--------------|---------------------------------|
//! | Disconnected             | ConnectRequested (none pending)| Connecting   | OpenChannel                     |
//! | Disconnected             | ReconnectTimerFired            | Connecting   | OpenChannel                     |
//! | Connecting               | Opened                         | Connected    | SendRegister                    |
//! | any                      | ClosedAbnormally (none pending)| Disconnected | ScheduleReconnect               |
//! | any                      | ClosedAbnormally (pending)     | Disconnected | -                               |
//! | any                      | ClosedCleanly                  | Disconnected | -                               |
//! | any                      | DisconnectRequested            | Disconnected | CancelReconnect, CloseChannel   |
//! | any                      | Errored                        | unchanged    | -                               |
//!
//! Every other pair leaves the state unchanged and does nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Something that happened to (or was asked of) the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// `connect()` was called.
    ConnectRequested,
    /// The WebSocket handshake completed.
    Opened,
    /// The server completed a normal (1000) close handshake.
    ClosedCleanly,
    /// The channel dropped, failed to open, or closed with a non-normal code.
    ClosedAbnormally,
    /// A transport error was observed. Closing is driven by the close event
    /// that follows, never by the error itself.
    Errored,
    /// The pending reconnect delay elapsed (or a manual reconnect forced it).
    ReconnectTimerFired,
    /// `disconnect()` was called.
    DisconnectRequested,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    OpenChannel,
    SendRegister,
    ScheduleReconnect,
    CancelReconnect,
    CloseChannel,
}

/// Result of looking up one row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ConnectionState,
    pub actions: &'static [ConnectionAction],
}

impl Transition {
    const fn to(next: ConnectionState, actions: &'static [ConnectionAction]) -> Self {
        Self { next, actions }
    }

    const fn stay(state: ConnectionState) -> Self {
        Self { next: state, actions: &[] }
    }
}

impl ConnectionState {
    /// The transition table.
    pub fn on(self, event: ConnectionEvent, reconnect_pending: bool) -> Transition {
        use ConnectionAction::*;
        use ConnectionEvent::*;
        use ConnectionState::*;

        match (self, event) {
            (Disconnected, ConnectRequested) if !reconnect_pending => {
                Transition::to(Connecting, &[OpenChannel])
            },
            (Disconnected, ReconnectTimerFired) => Transition::to(Connecting, &[OpenChannel]),
            (Connecting, Opened) => Transition::to(Connected, &[SendRegister]),
            (_, ClosedAbnormally) if !reconnect_pending => {
                Transition::to(Disconnected, &[ScheduleReconnect])
            },
            (_, ClosedAbnormally) | (_, ClosedCleanly) => Transition::to(Disconnected, &[]),
            (_, DisconnectRequested) => {
                Transition::to(Disconnected, &[CancelReconnect, CloseChannel])
            },
            (state, _) => Transition::stay(state),
        }
    }
}

/// The state plus the single reconnect slot, driven by the table above.
#[derive(Debug, Clone, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
    reconnect_pending: bool,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Apply an event and return the actions to perform.
    pub fn apply(&mut self, event: ConnectionEvent) -> &'static [ConnectionAction] {
        let transition = self.state.on(event, self.reconnect_pending);
        if transition.next != self.state {
            log::debug!(
                "[spendly-link] {} --{:?}--> {}",
                self.state,
                event,
                transition.next
            );
        }
        self.state = transition.next;
        for action in transition.actions {
            match action {
                ConnectionAction::ScheduleReconnect => self.reconnect_pending = true,
                // Opening consumes the pending slot; cancelling empties it.
                ConnectionAction::OpenChannel | ConnectionAction::CancelReconnect => {
                    self.reconnect_pending = false
                },
                ConnectionAction::SendRegister | ConnectionAction::CloseChannel => {},
            }
        }
        transition.actions
    }
}
