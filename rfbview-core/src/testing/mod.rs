//! In-memory collaborators for exercising a session without a server
//!
//! [`MockEngine`] plays a scripted server: it runs a chosen handshake,
//! replays queued [`ServerEvent`]s through the observer, and records every
//! call the session makes on it. [`MemoryProfileStore`], [`MemoryClipboard`]
//! and [`RecordingSurface`] stand in for the host application.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use secrecy::ExposeSecret;

use crate::engine::{EngineError, EngineObserver, ProtocolEngine};
use crate::models::{ServerProfile, UserCredential};
use crate::sender::OutboundMessage;
use crate::session::ConnectionState;
use crate::store::{Clipboard, ProfileStore};
use crate::sync::lock_or_recover;
use crate::viewport::RenderSurface;

/// How long `process_next_message` waits before reporting an idle tick
const IDLE_TICK: Duration = Duration::from_millis(10);

/// Polls `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Handshake outcome played by [`MockEngine::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handshake {
    /// No authentication
    #[default]
    Accept,
    /// Server refuses the connection
    Reject,
    /// Password-only authentication
    Password,
    /// Username and password authentication
    Credential,
}

/// Something the mock server sends during the message loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Framebuffer update
    FramebufferUpdate,
    /// Server cut text
    ClipboardText(String),
    /// Desktop size change
    Resize(u32, u32),
    /// Server closes the connection
    Close,
}

/// Scripted protocol engine
pub struct MockEngine {
    observer: Arc<dyn EngineObserver>,
    handshake: Handshake,
    state: Mutex<ConnectionState>,
    events_tx: mpsc::Sender<ServerEvent>,
    events_rx: Mutex<mpsc::Receiver<ServerEvent>>,
    sent: Mutex<Vec<OutboundMessage>>,
    credentials: Mutex<Vec<UserCredential>>,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    cleanup_calls: AtomicUsize,
}

impl MockEngine {
    /// Creates an engine that accepts the connection without authentication
    #[must_use]
    pub fn new(observer: Arc<dyn EngineObserver>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            observer,
            handshake: Handshake::Accept,
            state: Mutex::new(ConnectionState::Disconnected),
            events_tx,
            events_rx: Mutex::new(events_rx),
            sent: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            cleanup_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the handshake to play
    #[must_use]
    pub fn with_handshake(mut self, handshake: Handshake) -> Self {
        self.handshake = handshake;
        self
    }

    /// Queues a server event for the message loop
    pub fn push(&self, event: ServerEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Messages written by the sender, in order
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundMessage> {
        lock_or_recover(&self.sent).clone()
    }

    /// Waits until at least `count` messages were written
    pub fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<OutboundMessage> {
        wait_until(timeout, || lock_or_recover(&self.sent).len() >= count);
        self.sent()
    }

    /// Credentials the handshake received, in order
    #[must_use]
    pub fn received_credentials(&self) -> Vec<UserCredential> {
        lock_or_recover(&self.credentials).clone()
    }

    /// Number of `connect` calls
    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls
    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Number of `cleanup` calls
    #[must_use]
    pub fn cleanup_calls(&self) -> usize {
        self.cleanup_calls.load(Ordering::SeqCst)
    }

    fn report(&self, state: ConnectionState) {
        *lock_or_recover(&self.state) = state;
        self.observer.on_state_changed(state);
    }

    fn authenticate(&self) -> bool {
        let credential = match self.handshake {
            Handshake::Accept => return true,
            Handshake::Reject => return false,
            Handshake::Password => {
                UserCredential::password_only(self.observer.on_password_required().expose_secret())
            }
            Handshake::Credential => self.observer.on_credential_required(),
        };
        let accepted = !credential.password.expose_secret().is_empty();
        lock_or_recover(&self.credentials).push(credential);
        accepted
    }
}

impl ProtocolEngine for MockEngine {
    fn connect(&self, _address: &str, _port: u16) -> bool {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.report(ConnectionState::Connecting);
        if !self.authenticate() {
            // A rejected handshake leaves the state for the session to settle.
            *lock_or_recover(&self.state) = ConnectionState::Disconnected;
            return false;
        }
        self.report(ConnectionState::Connected);
        true
    }

    fn process_next_message(&self) -> bool {
        let next = lock_or_recover(&self.events_rx).recv_timeout(IDLE_TICK);
        match next {
            Ok(ServerEvent::FramebufferUpdate) => self.observer.on_framebuffer_updated(),
            Ok(ServerEvent::ClipboardText(text)) => self.observer.on_remote_clipboard_text(text),
            Ok(ServerEvent::Resize(width, height)) => {
                self.observer.on_framebuffer_size_changed(width, height);
            }
            Ok(ServerEvent::Close) | Err(RecvTimeoutError::Disconnected) => {
                self.report(ConnectionState::Disconnected);
                return false;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
        true
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.push(ServerEvent::Close);
    }

    fn cleanup(&self) {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn state(&self) -> ConnectionState {
        *lock_or_recover(&self.state)
    }

    fn send(&self, message: &OutboundMessage) -> Result<(), EngineError> {
        if self.cleanup_calls() > 0 {
            return Err(EngineError::NotConnected);
        }
        lock_or_recover(&self.sent).push(message.clone());
        Ok(())
    }
}

/// Profile store kept in memory
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    credentials: Vec<UserCredential>,
    updates: Mutex<Vec<ServerProfile>>,
    known_credentials_calls: AtomicUsize,
}

impl MemoryProfileStore {
    /// Creates a store that knows `credentials`
    #[must_use]
    pub fn with_credentials(credentials: Vec<UserCredential>) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Profiles saved so far
    #[must_use]
    pub fn updates(&self) -> Vec<ServerProfile> {
        lock_or_recover(&self.updates).clone()
    }

    /// Number of `known_credentials` calls
    #[must_use]
    pub fn known_credentials_calls(&self) -> usize {
        self.known_credentials_calls.load(Ordering::SeqCst)
    }
}

impl ProfileStore for MemoryProfileStore {
    fn known_credentials(&self) -> Vec<UserCredential> {
        self.known_credentials_calls.fetch_add(1, Ordering::SeqCst);
        self.credentials.clone()
    }

    fn update(&self, profile: &ServerProfile) {
        lock_or_recover(&self.updates).push(profile.clone());
    }
}

/// Clipboard kept in memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    /// Creates a clipboard holding `text`
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
        }
    }

    /// Current contents
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        lock_or_recover(&self.text).clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn text(&self) -> Option<String> {
        self.contents()
    }

    fn set_text(&self, text: &str) {
        *lock_or_recover(&self.text) = Some(text.to_string());
    }
}

/// Render surface that counts requests
#[derive(Debug, Default)]
pub struct RecordingSurface {
    renders: AtomicUsize,
}

impl RecordingSurface {
    /// Number of render requests received
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl RenderSurface for RecordingSurface {
    fn request_render(&self) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }
}
