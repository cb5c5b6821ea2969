//! Protocol engine boundary
//!
//! The wire protocol (handshake, pixel formats, encodings) lives behind the
//! [`ProtocolEngine`] trait. The session drives it from two threads:
//!
//! - the network thread calls [`ProtocolEngine::connect`] and then
//!   [`ProtocolEngine::process_next_message`] in a loop;
//! - the sender thread calls [`ProtocolEngine::send`] for each queued
//!   message, in order.
//!
//! Implementations report back through an [`EngineObserver`] handed to them
//! when the session constructs the engine. Observer methods are invoked on
//! the network thread.

use secrecy::SecretString;
use thiserror::Error;

use crate::models::UserCredential;
use crate::sender::OutboundMessage;
use crate::session::ConnectionState;

/// Error reported by an engine when an outbound message cannot be written
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine has no open transport
    #[error("Not connected")]
    NotConnected,

    /// IO error while writing to the transport
    #[error("IO error: {0}")]
    Io(String),

    /// The message could not be encoded
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Wire-protocol implementation driven by a session
pub trait ProtocolEngine: Send + Sync + 'static {
    /// Opens the transport and performs the handshake.
    ///
    /// May call back into [`EngineObserver::on_password_required`] or
    /// [`EngineObserver::on_credential_required`], which block until the
    /// user answers. Returns `true` once the session is established.
    fn connect(&self, address: &str, port: u16) -> bool;

    /// Reads and handles one server message.
    ///
    /// Returns `false` when the connection has ended, whether closed by the
    /// server, by [`ProtocolEngine::disconnect`] or by an error.
    fn process_next_message(&self) -> bool;

    /// Requests the connection to close.
    fn disconnect(&self);

    /// Releases all resources. Called exactly once per session.
    fn cleanup(&self);

    /// Current connection state as seen by the engine.
    fn state(&self) -> ConnectionState;

    /// Writes one outbound message to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed or the write fails.
    fn send(&self, message: &OutboundMessage) -> Result<(), EngineError>;
}

/// Callbacks from an engine to its session
pub trait EngineObserver: Send + Sync {
    /// Server asked for a password (VNC authentication).
    fn on_password_required(&self) -> SecretString;

    /// Server asked for both username and password.
    fn on_credential_required(&self) -> UserCredential;

    /// Part of the framebuffer changed.
    fn on_framebuffer_updated(&self);

    /// Server cut text arrived.
    fn on_remote_clipboard_text(&self, text: String);

    /// Engine moved to a new connection state.
    fn on_state_changed(&self, state: ConnectionState);

    /// Server resized the framebuffer.
    fn on_framebuffer_size_changed(&self, width: u32, height: u32);
}
