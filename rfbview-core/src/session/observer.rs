//! Engine callback routing
//!
//! [`SessionShared`] is the state the network thread, the UI and the
//! sender worker have in common. It implements [`EngineObserver`], so every
//! engine callback lands here, on the network thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::credential::CredentialBroker;
use crate::engine::EngineObserver;
use crate::error::{SessionError, SessionResult};
use crate::models::{ServerProfile, UserCredential};
use crate::sender::MessageSender;
use crate::store::{Clipboard, ProfileStore};
use crate::sync::lock_or_recover;
use crate::viewport::FrameViewport;

use super::event::{SessionEvent, SessionEventSender};
use super::state::{ConnectionState, StatePublisher};

const PERSIST_THREAD_NAME: &str = "rfb-profile-save";

/// State shared by all session actors
pub(crate) struct SessionShared {
    pub(crate) config: SessionConfig,
    /// Captured once by `Session::connect`
    pub(crate) profile: OnceLock<ServerProfile>,
    pub(crate) state: StatePublisher,
    pub(crate) broker: CredentialBroker,
    pub(crate) viewport: FrameViewport,
    /// Set right after the engine is built
    pub(crate) sender: OnceLock<Arc<MessageSender>>,
    pub(crate) events: SessionEventSender,
    pub(crate) clipboard: Arc<dyn Clipboard>,
    pub(crate) store: Arc<dyn ProfileStore>,
    /// Last non-empty credential the user typed, saved with the profile
    prompted_credential: Mutex<Option<UserCredential>>,
    /// Guards the one-time work on entering `Connected`
    connected_once: AtomicBool,
    /// Guards sender/engine cleanup
    cleaned_up: AtomicBool,
}

impl SessionShared {
    pub(crate) fn new(
        config: SessionConfig,
        store: Arc<dyn ProfileStore>,
        clipboard: Arc<dyn Clipboard>,
        events: SessionEventSender,
    ) -> Self {
        Self {
            viewport: FrameViewport::new(config.viewport),
            config,
            profile: OnceLock::new(),
            state: StatePublisher::new(ConnectionState::Disconnected),
            broker: CredentialBroker::new(),
            sender: OnceLock::new(),
            events,
            clipboard,
            store,
            prompted_credential: Mutex::new(None),
            connected_once: AtomicBool::new(false),
            cleaned_up: AtomicBool::new(false),
        }
    }

    /// Marks cleanup as done; returns `true` for the first caller only
    pub(crate) fn begin_cleanup(&self) -> bool {
        !self.cleaned_up.swap(true, Ordering::SeqCst)
    }

    /// Pushes the local clipboard to the server if it holds non-blank text
    pub(crate) fn sync_clipboard(&self) -> SessionResult<()> {
        let Some(text) = self.clipboard.text() else {
            return Ok(());
        };
        if text.trim().is_empty() {
            return Ok(());
        }
        let sender = self.sender.get().ok_or(SessionError::ChannelClosed)?;
        sender.send_clipboard_text(text)
    }

    fn obtain_credential(&self, username_required: bool) -> UserCredential {
        let credential = self.broker.obtain(username_required, |username_required| {
            if self
                .events
                .send(SessionEvent::CredentialRequired { username_required })
                .is_err()
            {
                warn!("Credential requested but no UI is listening");
            }
        });
        if !credential.is_empty() {
            *lock_or_recover(&self.prompted_credential) = Some(credential.clone());
        }
        credential
    }

    /// The captured profile plus whatever the user typed at the prompt
    fn profile_to_save(&self, mut profile: ServerProfile) -> ServerProfile {
        if let Some(credential) = lock_or_recover(&self.prompted_credential).take() {
            if let Some(username) = credential.username.filter(|name| !name.trim().is_empty()) {
                profile.username = Some(username);
            }
            profile.password = Some(credential.password);
        }
        profile
    }

    /// One-time work after the first transition into `Connected`
    fn on_connected(&self) {
        if self.connected_once.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.config.sync_clipboard_on_connect {
            if let Err(e) = self.sync_clipboard() {
                warn!(error = %e, "Initial clipboard sync failed");
            }
        }

        let Some(profile) = self.profile.get() else {
            return;
        };
        if profile.is_persisted() {
            self.persist_profile(self.profile_to_save(profile.clone()));
        }
    }

    /// Saves the profile on a short-lived thread so the network thread
    /// never waits on storage.
    fn persist_profile(&self, profile: ServerProfile) {
        let store = Arc::clone(&self.store);
        let spawned = std::thread::Builder::new()
            .name(PERSIST_THREAD_NAME.to_string())
            .spawn(move || {
                store.update(&profile);
                debug!(profile_id = ?profile.id, "Profile saved");
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to start profile save");
        }
    }
}

impl EngineObserver for SessionShared {
    fn on_password_required(&self) -> SecretString {
        if let Some(password) = self.profile.get().and_then(ServerProfile::stored_password) {
            return password.clone();
        }
        self.obtain_credential(false).password
    }

    fn on_credential_required(&self) -> UserCredential {
        if let Some(credential) = self.profile.get().and_then(ServerProfile::stored_credential) {
            return credential;
        }
        self.obtain_credential(true)
    }

    fn on_framebuffer_updated(&self) {
        self.viewport.request_render();
    }

    fn on_remote_clipboard_text(&self, text: String) {
        self.clipboard.set_text(&text);
        let _ = self.events.send(SessionEvent::RemoteClipboardText(text));
    }

    fn on_state_changed(&self, state: ConnectionState) {
        if !self.state.publish(state) {
            debug!(state = %state, "Ignored state change");
            return;
        }
        info!(state = %state, "Connection state changed");
        if state.is_connected() {
            self.on_connected();
        }
    }

    fn on_framebuffer_size_changed(&self, width: u32, height: u32) {
        debug!(width, height, "Framebuffer resized");
        self.viewport
            .set_framebuffer_size(width as f32, height as f32);
    }
}
