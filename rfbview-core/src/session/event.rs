//! One-shot session events for the UI

use tokio::sync::mpsc;

/// Events emitted by a session to the UI
///
/// Each event is delivered exactly once to the holder of the
/// [`SessionEventReceiver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server asked for credentials and the profile has none.
    ///
    /// The UI answers with `Session::provide_credential`.
    CredentialRequired {
        /// `true` if a username is needed as well as a password
        username_required: bool,
    },

    /// Server clipboard text (already copied to the local clipboard)
    RemoteClipboardText(String),
}

/// Sender half of the event channel
pub(crate) type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiver half of the event channel
///
/// Works from any thread: `recv().await` inside a runtime, `blocking_recv()`
/// on plain threads, `try_recv()` from a UI main loop.
pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;
