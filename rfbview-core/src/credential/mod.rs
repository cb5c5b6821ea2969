//! Credential hand-off between the UI and the network thread
//!
//! During the handshake the network thread needs a password the user has not
//! typed yet. [`CredentialBroker`] is a single-slot rendezvous: the network
//! thread clears the slot, tells the UI what it needs, and blocks until the
//! UI drops exactly one credential in.
//!
//! Cancelling the network task does not interrupt that wait. Teardown calls
//! [`CredentialBroker::shutdown`], which closes the broker and pushes the
//! empty sentinel credential so a parked thread always wakes up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Mutex;

use tracing::debug;

use crate::models::UserCredential;
use crate::sync::lock_or_recover;

/// Single-slot rendezvous for one credential at a time
#[derive(Debug)]
pub struct CredentialBroker {
    /// Producer side, used by the UI and by shutdown
    slot_tx: SyncSender<UserCredential>,
    /// Consumer side; the lock also serializes concurrent requests
    slot_rx: Mutex<Receiver<UserCredential>>,
    /// Set by shutdown, checked before every wait
    closed: AtomicBool,
}

impl Default for CredentialBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBroker {
    /// Creates an empty broker
    #[must_use]
    pub fn new() -> Self {
        let (slot_tx, slot_rx) = mpsc::sync_channel(1);
        Self {
            slot_tx,
            slot_rx: Mutex::new(slot_rx),
            closed: AtomicBool::new(false),
        }
    }

    /// Requests a credential and blocks until one is provided.
    ///
    /// Any stale value left in the slot is discarded first, then `notify`
    /// is called with `username_required` so the UI can prompt the user.
    /// Returns the empty sentinel if the broker is shut down before or
    /// during the wait.
    pub fn obtain(&self, username_required: bool, notify: impl FnOnce(bool)) -> UserCredential {
        let slot = lock_or_recover(&self.slot_rx);

        while slot.try_recv().is_ok() {
            debug!("Discarded stale credential");
        }

        if self.is_closed() {
            return UserCredential::empty();
        }

        notify(username_required);
        debug!(username_required, "Waiting for credential");

        slot.recv().unwrap_or_else(|_| UserCredential::empty())
    }

    /// Places a credential in the slot.
    ///
    /// Returns `false` if a value is already pending or the broker is closed.
    pub fn provide(&self, credential: UserCredential) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.slot_tx.try_send(credential) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                debug!("Credential slot already filled");
                false
            }
        }
    }

    /// Closes the broker and wakes any waiting thread with the sentinel
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // A full slot already holds a value that wakes the waiter.
        let _ = self.slot_tx.try_send(UserCredential::empty());
    }

    /// Returns true after [`CredentialBroker::shutdown`]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
