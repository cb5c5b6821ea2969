//! Network thread
//!
//! One thread per session performs the handshake and pumps server messages.
//! When the server goes away it parks on the cancellation token, so release
//! of engine resources always happens at session teardown and always on this
//! thread, unless the thread was never started.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::ProtocolEngine;
use crate::error::{SessionError, SessionResult};
use crate::models::ServerProfile;
use crate::sender::MessageSender;
use crate::trace_operation;
use crate::tracing::span_names;

use super::observer::SessionShared;
use super::state::ConnectionState;

const NETWORK_THREAD_NAME: &str = "rfb-network";

/// Everything the network thread owns
pub(crate) struct NetworkTask<E: ProtocolEngine> {
    pub(crate) engine: Arc<E>,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) sender: Arc<MessageSender>,
    pub(crate) cancel: CancellationToken,
}

impl<E: ProtocolEngine> NetworkTask<E> {
    /// Starts the network thread for `profile`
    pub(crate) fn spawn(self, profile: ServerProfile) -> SessionResult<JoinHandle<()>> {
        thread::Builder::new()
            .name(NETWORK_THREAD_NAME.to_string())
            .spawn(move || self.run(&profile))
            .map_err(|e| SessionError::ThreadSpawn {
                name: NETWORK_THREAD_NAME,
                reason: e.to_string(),
            })
    }

    fn run(self, profile: &ServerProfile) {
        // Runs on every exit path, unwinding included.
        let _cleanup = CleanupGuard {
            engine: &*self.engine,
            shared: &self.shared,
            sender: &self.sender,
        };

        let span = trace_operation!(
            span_names::SESSION_CONNECT,
            host = %profile.address,
            port = profile.port
        );
        let _enter = span.enter();

        self.pump(profile);

        let engine_state = self.engine.state();
        if engine_state != ConnectionState::Disconnected {
            debug!(engine_state = %engine_state, "Engine did not report the disconnect");
        }
        self.shared.state.publish(ConnectionState::Disconnected);

        self.wait_for_teardown();
    }

    fn pump(&self, profile: &ServerProfile) {
        if self.cancel.is_cancelled() {
            debug!("Session closed before handshake");
            return;
        }

        info!("Connecting");
        if !self.engine.connect(&profile.address, profile.port) {
            warn!("Handshake failed");
            return;
        }

        let mut processed: u64 = 0;
        while !self.cancel.is_cancelled() && self.engine.process_next_message() {
            processed += 1;
        }
        info!(processed, "Message loop ended");
    }

    fn wait_for_teardown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "Failed to create runtime, releasing engine now");
                return;
            }
        };
        debug!("Waiting for teardown");
        runtime.block_on(self.cancel.cancelled());
    }
}

/// Releases sender and engine when dropped
///
/// Shared with `Session::close` for sessions whose network thread never
/// started. The first of the two to run does the work.
pub(crate) struct CleanupGuard<'a, E: ProtocolEngine> {
    pub(crate) engine: &'a E,
    pub(crate) shared: &'a SessionShared,
    pub(crate) sender: &'a MessageSender,
}

impl<E: ProtocolEngine> Drop for CleanupGuard<'_, E> {
    fn drop(&mut self) {
        if !self.shared.begin_cleanup() {
            return;
        }
        let span = trace_operation!(span_names::SESSION_CLEANUP);
        let _enter = span.enter();

        // Sender first: it must not write to an engine being released.
        if panic::catch_unwind(AssertUnwindSafe(|| self.sender.cleanup())).is_err() {
            warn!("Sender cleanup panicked");
        }
        if panic::catch_unwind(AssertUnwindSafe(|| self.engine.cleanup())).is_err() {
            warn!("Engine cleanup panicked");
        }
        info!("Session resources released");
    }
}
