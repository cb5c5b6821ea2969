//! Session orchestration
//!
//! [`Session`] owns one protocol engine for one connection attempt. It starts
//! the network thread, routes engine callbacks, exposes the outbound sender
//! and the viewport to the UI, and tears everything down exactly once.

use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::engine::{EngineObserver, ProtocolEngine};
use crate::error::SessionResult;
use crate::models::{ServerProfile, UserCredential};
use crate::sender::MessageSender;
use crate::store::{Clipboard, ProfileStore};
use crate::sync::lock_or_recover;
use crate::viewport::{FrameViewport, RenderSurface};

use super::event::SessionEventReceiver;
use super::observer::SessionShared;
use super::state::{ConnectionState, StateReceiver};
use super::task::{CleanupGuard, NetworkTask};

/// Where the session is in its single connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// `connect` not called yet
    Idle,
    /// Network thread started
    Running,
    /// Torn down; terminal
    Closed,
}

/// One remote framebuffer session
///
/// Safe to share between the UI thread and anything else: every method takes
/// `&self`. Dropping the session tears it down without waiting for the
/// network thread.
pub struct Session<E: ProtocolEngine> {
    engine: Arc<E>,
    shared: Arc<SessionShared>,
    sender: Arc<MessageSender>,
    cancel: CancellationToken,
    phase: Mutex<Phase>,
    network: Mutex<Option<JoinHandle<()>>>,
    events: Mutex<Option<SessionEventReceiver>>,
    known_credentials: OnceLock<Vec<UserCredential>>,
}

impl<E: ProtocolEngine> Session<E> {
    /// Creates a session and its engine.
    ///
    /// `make_engine` receives the observer the engine must report to. The
    /// sender thread starts immediately; the network thread starts on
    /// [`Session::connect`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if `config` fails validation and
    /// `SessionError::ThreadSpawn` if the sender thread cannot start.
    pub fn new<F>(
        config: SessionConfig,
        store: Arc<dyn ProfileStore>,
        clipboard: Arc<dyn Clipboard>,
        make_engine: F,
    ) -> SessionResult<Self>
    where
        F: FnOnce(Arc<dyn EngineObserver>) -> E,
    {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let sender_config = config.sender;
        let shared = Arc::new(SessionShared::new(config, store, clipboard, event_tx));

        let observer: Arc<dyn EngineObserver> = Arc::clone(&shared) as Arc<dyn EngineObserver>;
        let engine = Arc::new(make_engine(observer));

        let sender = Arc::new(MessageSender::spawn(Arc::clone(&engine), sender_config)?);
        let _ = shared.sender.set(Arc::clone(&sender));

        Ok(Self {
            engine,
            shared,
            sender,
            cancel: CancellationToken::new(),
            phase: Mutex::new(Phase::Idle),
            network: Mutex::new(None),
            events: Mutex::new(Some(event_rx)),
            known_credentials: OnceLock::new(),
        })
    }

    /// Starts the connection attempt for `profile`.
    ///
    /// Only the first call does anything; later calls, and calls after
    /// [`Session::close`], return `Ok(())` without side effects. The profile
    /// is captured here and stays fixed for the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ThreadSpawn` if the network thread cannot
    /// start. The session is closed in that case.
    pub fn connect(&self, profile: ServerProfile) -> SessionResult<()> {
        let mut phase = lock_or_recover(&self.phase);
        if *phase != Phase::Idle {
            debug!(phase = ?*phase, "Connect ignored");
            return Ok(());
        }

        let profile = self.shared.profile.get_or_init(|| profile).clone();
        info!(
            host = %profile.address,
            port = profile.port,
            profile_id = ?profile.id,
            "Starting connection"
        );

        self.shared.state.publish(ConnectionState::Connecting);

        let task = NetworkTask {
            engine: Arc::clone(&self.engine),
            shared: Arc::clone(&self.shared),
            sender: Arc::clone(&self.sender),
            cancel: self.cancel.clone(),
        };
        match task.spawn(profile) {
            Ok(handle) => {
                *lock_or_recover(&self.network) = Some(handle);
                *phase = Phase::Running;
                Ok(())
            }
            Err(e) => {
                drop(phase);
                warn!(error = %e, "Failed to start network thread");
                self.close();
                Err(e)
            }
        }
    }

    /// Asks the engine to close the connection; the message loop then ends
    /// and the state returns to `Disconnected`.
    pub fn disconnect(&self) {
        debug!("Disconnect requested");
        self.engine.disconnect();
    }

    /// Tears the session down.
    ///
    /// Cancels the network thread, wakes it if it is waiting for a
    /// credential, and freezes the state at `Disconnected`. Sender and
    /// engine cleanup run exactly once: on the network thread if it was
    /// started, here otherwise. Does not wait; see [`Session::join`].
    pub fn close(&self) {
        let launched = {
            let mut phase = lock_or_recover(&self.phase);
            let previous = *phase;
            if previous == Phase::Closed {
                return;
            }
            *phase = Phase::Closed;
            previous == Phase::Running
        };
        info!(launched, "Closing session");

        self.cancel.cancel();
        self.shared.broker.shutdown();
        self.shared.state.seal();

        if !launched {
            drop(CleanupGuard {
                engine: &*self.engine,
                shared: &self.shared,
                sender: &self.sender,
            });
        }
    }

    /// Waits for the network and sender threads to exit.
    ///
    /// Only returns after [`Session::close`] has been called (or the
    /// network thread was never started).
    pub fn join(&self) {
        let handle = lock_or_recover(&self.network).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                warn!("Session joined from its own network thread");
                return;
            }
            if handle.join().is_err() {
                warn!("Network thread panicked");
            }
        }
        self.sender.join();
    }

    /// Answers a [`SessionEvent::CredentialRequired`](super::SessionEvent)
    ///
    /// Returns `false` if an answer is already pending or the session is
    /// closed.
    pub fn provide_credential(&self, credential: UserCredential) -> bool {
        self.shared.broker.provide(credential)
    }

    /// Sends the local clipboard text to the server, if it is non-blank
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after teardown.
    pub fn send_clipboard_text(&self) -> SessionResult<()> {
        self.shared.sync_clipboard()
    }

    /// Outbound message queue
    #[must_use]
    pub fn sender(&self) -> &MessageSender {
        &self.sender
    }

    /// Scale and translation state
    #[must_use]
    pub fn viewport(&self) -> &FrameViewport {
        &self.shared.viewport
    }

    /// Points render requests at `surface`. The session keeps only a weak
    /// reference.
    pub fn attach_render_surface<S: RenderSurface + 'static>(&self, surface: &Arc<S>) {
        self.shared.viewport.render_handle().attach(surface);
    }

    /// Stops render requests
    pub fn detach_render_surface(&self) {
        self.shared.viewport.render_handle().detach();
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.current()
    }

    /// Subscribes to connection state changes
    #[must_use]
    pub fn subscribe_state(&self) -> StateReceiver {
        self.shared.state.subscribe()
    }

    /// Takes the one-shot event receiver. Returns `None` after the first
    /// call.
    #[must_use]
    pub fn take_event_receiver(&self) -> Option<SessionEventReceiver> {
        lock_or_recover(&self.events).take()
    }

    /// Credentials previously used with the profile store, for prompt
    /// suggestions. Loaded on first call.
    #[must_use]
    pub fn known_credentials(&self) -> &[UserCredential] {
        self.known_credentials
            .get_or_init(|| self.shared.store.known_credentials())
    }

    /// Profile captured by [`Session::connect`]
    #[must_use]
    pub fn profile(&self) -> Option<&ServerProfile> {
        self.shared.profile.get()
    }

    /// Session settings
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// The protocol engine
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns true once [`Session::close`] has run
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *lock_or_recover(&self.phase) == Phase::Closed
    }
}

impl<E: ProtocolEngine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("engine_state", &self.engine.state())
            .field("phase", &*lock_or_recover(&self.phase))
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl<E: ProtocolEngine> Drop for Session<E> {
    fn drop(&mut self) {
        self.close();
    }
}
