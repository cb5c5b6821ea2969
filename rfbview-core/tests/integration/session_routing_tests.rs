//! Integration tests for engine callback routing
//!
//! Clipboard sync, profile persistence, render requests and framebuffer
//! resizes as seen from the host application.

use rfbview_core::testing::{
    Handshake, MemoryClipboard, MemoryProfileStore, MockEngine, RecordingSurface, ServerEvent,
    wait_until,
};
use rfbview_core::{
    Clipboard, ConnectionState, OutboundMessage, ProfileStore, ServerProfile, Session,
    SessionConfig, SessionEvent, UserCredential,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    session: Session<MockEngine>,
    store: Arc<MemoryProfileStore>,
    clipboard: Arc<MemoryClipboard>,
}

impl Harness {
    fn new(config: SessionConfig, clipboard: MemoryClipboard) -> Self {
        let store = Arc::new(MemoryProfileStore::default());
        let clipboard = Arc::new(clipboard);
        let session = Session::new(
            config,
            Arc::clone(&store) as Arc<dyn ProfileStore>,
            Arc::clone(&clipboard) as Arc<dyn Clipboard>,
            MockEngine::new,
        )
        .expect("Failed to create session");
        Self {
            session,
            store,
            clipboard,
        }
    }

    fn connected(config: SessionConfig, clipboard: MemoryClipboard, profile: ServerProfile) -> Self {
        let harness = Self::new(config, clipboard);
        harness.session.connect(profile).expect("Failed to connect");
        assert!(wait_until(TIMEOUT, || {
            harness.session.state() == ConnectionState::Connected
        }));
        harness
    }

    fn clipboard_messages(&self) -> Vec<OutboundMessage> {
        self.session
            .engine()
            .sent()
            .into_iter()
            .filter(|message| matches!(message, OutboundMessage::ClipboardText(_)))
            .collect()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.session.close();
        self.session.join();
    }
}

// ========== Clipboard Tests ==========

#[test]
fn test_clipboard_synced_once_on_connect() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::with_text("copied before connect"),
        ServerProfile::new("localhost"),
    );

    let sent = harness.session.engine().wait_for_sent(1, TIMEOUT);
    assert_eq!(
        sent,
        vec![OutboundMessage::ClipboardText(
            "copied before connect".to_string()
        )]
    );

    // Later traffic does not repeat the initial sync.
    harness.session.engine().push(ServerEvent::FramebufferUpdate);
    harness.session.engine().push(ServerEvent::Resize(640, 480));
    assert!(wait_until(TIMEOUT, || {
        harness.session.viewport().framebuffer_size() == (640.0, 480.0)
    }));
    assert_eq!(harness.clipboard_messages().len(), 1);
}

#[test]
fn test_blank_clipboard_not_synced() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::with_text("  \n "),
        ServerProfile::new("localhost"),
    );

    std::thread::sleep(Duration::from_millis(50));
    assert!(harness.clipboard_messages().is_empty());
}

#[test]
fn test_clipboard_sync_can_be_disabled() {
    let harness = Harness::connected(
        SessionConfig::default().with_clipboard_sync(false),
        MemoryClipboard::with_text("private"),
        ServerProfile::new("localhost"),
    );

    std::thread::sleep(Duration::from_millis(50));
    assert!(harness.clipboard_messages().is_empty());
}

#[test]
fn test_manual_clipboard_send() {
    let harness = Harness::connected(
        SessionConfig::default().with_clipboard_sync(false),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );

    harness.clipboard.set_text("pasted");
    harness
        .session
        .send_clipboard_text()
        .expect("Failed to send clipboard");

    let sent = harness.session.engine().wait_for_sent(1, TIMEOUT);
    assert_eq!(sent, vec![OutboundMessage::ClipboardText("pasted".to_string())]);
}

#[test]
fn test_remote_clipboard_reaches_host() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );
    let mut events = harness
        .session
        .take_event_receiver()
        .expect("Receiver already taken");

    harness
        .session
        .engine()
        .push(ServerEvent::ClipboardText("from server".to_string()));

    let mut event = None;
    assert!(wait_until(TIMEOUT, || {
        event = events.try_recv().ok();
        event.is_some()
    }));
    assert_eq!(
        event,
        Some(SessionEvent::RemoteClipboardText("from server".to_string()))
    );
    // The local clipboard is written before the event goes out.
    assert_eq!(harness.clipboard.contents().as_deref(), Some("from server"));
}

// ========== Profile Persistence Tests ==========

#[test]
fn test_persisted_profile_saved_on_connect() {
    let id = Uuid::new_v4();
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("desk.example.com").with_id(id),
    );

    assert!(wait_until(TIMEOUT, || !harness.store.updates().is_empty()));
    std::thread::sleep(Duration::from_millis(50));

    let updates = harness.store.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, Some(id));
    assert_eq!(updates[0].address, "desk.example.com");
}

/// Connects a persisted profile through a prompting handshake and answers
/// the prompt with `answer`; returns the profiles the store received.
fn save_after_prompt(
    handshake: Handshake,
    profile: ServerProfile,
    answer: UserCredential,
) -> Vec<ServerProfile> {
    let store = Arc::new(MemoryProfileStore::default());
    let session = Session::new(
        SessionConfig::default().with_clipboard_sync(false),
        Arc::clone(&store) as Arc<dyn ProfileStore>,
        Arc::new(MemoryClipboard::default()),
        move |observer| MockEngine::new(observer).with_handshake(handshake),
    )
    .expect("Failed to create session");
    let mut events = session.take_event_receiver().expect("Receiver already taken");

    session.connect(profile).expect("Failed to connect");
    assert!(wait_until(TIMEOUT, || matches!(
        events.try_recv(),
        Ok(SessionEvent::CredentialRequired { .. })
    )));
    assert!(session.provide_credential(answer));

    assert!(wait_until(TIMEOUT, || !store.updates().is_empty()));
    session.close();
    session.join();
    store.updates()
}

#[test]
fn test_prompted_credential_saved_with_profile() {
    let updates = save_after_prompt(
        Handshake::Credential,
        ServerProfile::new("desk.example.com").with_id(Uuid::new_v4()),
        UserCredential::new("alice", "secret"),
    );

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].username.as_deref(), Some("alice"));
    assert_eq!(
        updates[0].password.as_ref().map(|p| p.expose_secret().to_string()),
        Some("secret".to_string())
    );
}

#[test]
fn test_prompted_password_keeps_stored_username() {
    let updates = save_after_prompt(
        Handshake::Password,
        ServerProfile::new("desk.example.com")
            .with_id(Uuid::new_v4())
            .with_username("bob"),
        UserCredential::password_only("hunter2"),
    );

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].username.as_deref(), Some("bob"));
    assert_eq!(
        updates[0].password.as_ref().map(|p| p.expose_secret().to_string()),
        Some("hunter2".to_string())
    );
}

#[test]
fn test_ad_hoc_profile_not_saved() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("10.0.0.7"),
    );

    std::thread::sleep(Duration::from_millis(50));
    assert!(harness.store.updates().is_empty());
}

// ========== Viewport Tests ==========

#[test]
fn test_framebuffer_update_requests_render() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );
    let surface = Arc::new(RecordingSurface::default());
    harness.session.attach_render_surface(&surface);

    harness.session.engine().push(ServerEvent::FramebufferUpdate);
    assert!(wait_until(TIMEOUT, || surface.render_count() >= 1));
}

#[test]
fn test_render_request_without_surface_is_dropped() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );
    let surface = Arc::new(RecordingSurface::default());
    harness.session.attach_render_surface(&surface);
    harness.session.detach_render_surface();

    harness.session.engine().push(ServerEvent::FramebufferUpdate);
    harness.session.engine().push(ServerEvent::Resize(320, 200));
    assert!(wait_until(TIMEOUT, || {
        harness.session.viewport().framebuffer_size() == (320.0, 200.0)
    }));
    assert_eq!(surface.render_count(), 0);
    assert_eq!(harness.session.state(), ConnectionState::Connected);
}

#[test]
fn test_dropped_surface_does_not_stop_session() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );
    let surface = Arc::new(RecordingSurface::default());
    harness.session.attach_render_surface(&surface);
    drop(surface);

    harness.session.engine().push(ServerEvent::FramebufferUpdate);
    harness.session.engine().push(ServerEvent::Resize(1024, 768));
    assert!(wait_until(TIMEOUT, || {
        harness.session.viewport().framebuffer_size() == (1024.0, 768.0)
    }));
    assert_eq!(harness.session.state(), ConnectionState::Connected);
}

#[test]
fn test_resize_recomputes_fit() {
    let harness = Harness::connected(
        SessionConfig::default(),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );
    let viewport = harness.session.viewport();
    viewport.set_viewport_size(800.0, 600.0);

    harness.session.engine().push(ServerEvent::Resize(1600, 1200));
    assert!(wait_until(TIMEOUT, || {
        viewport.framebuffer_size() == (1600.0, 1200.0)
    }));
    assert!((viewport.base_scale() - 0.5).abs() < f32::EPSILON);
}

// ========== Input Tests ==========

#[test]
fn test_view_only_session_drops_input() {
    let harness = Harness::connected(
        SessionConfig::default()
            .with_view_only(true)
            .with_clipboard_sync(false),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );
    let sender = harness.session.sender();

    sender.send_key(0x61, true).expect("Failed to queue key");
    sender.send_pointer(10, 10, 1).expect("Failed to queue pointer");
    sender.request_refresh().expect("Failed to queue refresh");

    let sent = harness.session.engine().wait_for_sent(1, TIMEOUT);
    assert_eq!(sent, vec![OutboundMessage::RefreshScreen]);
}

#[test]
fn test_ctrl_alt_del_sent_as_one_batch() {
    let harness = Harness::connected(
        SessionConfig::default().with_clipboard_sync(false),
        MemoryClipboard::default(),
        ServerProfile::new("localhost"),
    );

    harness
        .session
        .sender()
        .send_ctrl_alt_del()
        .expect("Failed to queue Ctrl+Alt+Del");

    let sent = harness.session.engine().wait_for_sent(6, TIMEOUT);
    assert_eq!(sent, OutboundMessage::ctrl_alt_del());
}
