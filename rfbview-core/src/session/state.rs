//! Connection state and its observable stream

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Connection state reported by the protocol engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No connection (initial and final state)
    #[default]
    Disconnected,
    /// Transport open, handshake in progress
    Connecting,
    /// Handshake complete, processing server messages
    Connected,
}

impl ConnectionState {
    /// Returns the state name as a lowercase string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Returns true when the session is established
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true if `next` is a forward move within one connection attempt
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting | Self::Connected)
                | (Self::Connecting, Self::Connected | Self::Disconnected)
                | (Self::Connected, Self::Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver side of the connection-state stream
///
/// Latest value wins: a slow observer sees the most recent state, not every
/// intermediate one.
pub type StateReceiver = watch::Receiver<ConnectionState>;

/// Mirrors engine state into a `watch` channel
///
/// Only forward transitions are accepted. Once the attempt has ended
/// (returned to `Disconnected`) or the publisher is sealed, every further
/// update is ignored, so no state is re-entered.
#[derive(Debug)]
pub struct StatePublisher {
    tx: watch::Sender<ConnectionState>,
    ended: AtomicBool,
}

impl StatePublisher {
    /// Creates a publisher starting at `initial`
    #[must_use]
    pub fn new(initial: ConnectionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            ended: AtomicBool::new(false),
        }
    }

    /// Publishes `next` if it is a valid transition.
    ///
    /// Returns `true` if the state changed. Never blocks on observers.
    pub fn publish(&self, next: ConnectionState) -> bool {
        self.tx.send_if_modified(|current| {
            if self.ended.load(Ordering::SeqCst) || !current.can_transition_to(next) {
                return false;
            }
            if next == ConnectionState::Disconnected {
                self.ended.store(true, Ordering::SeqCst);
            }
            *current = next;
            true
        })
    }

    /// Forces the final `Disconnected` state and rejects later updates
    pub fn seal(&self) {
        self.publish(ConnectionState::Disconnected);
        self.ended.store(true, Ordering::SeqCst);
    }

    /// Returns the current state
    #[must_use]
    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Returns true once the attempt has ended
    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Subscribes to state changes
    #[must_use]
    pub fn subscribe(&self) -> StateReceiver {
        self.tx.subscribe()
    }
}
