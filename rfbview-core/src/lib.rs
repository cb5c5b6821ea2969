//! `rfbview` Core Library
//!
//! Connection lifecycle for a remote framebuffer (VNC) client: the session
//! state machine, the ordered outbound message queue, the credential
//! hand-off between the network thread and the UI, and the viewport
//! transform shared with the renderer.
//!
//! # Crate Structure
//!
//! - [`session`] - [`Session`] orchestrator, connection state stream, UI events
//! - [`sender`] - FIFO outbound queue with a dedicated writer thread
//! - [`credential`] - Single-slot credential rendezvous
//! - [`viewport`] - Zoom/pan state and the weak render-surface handle
//! - [`engine`] - Boundary to the wire-protocol implementation
//! - [`store`] - Profile store and clipboard collaborators
//! - [`models`] - Server profiles and credentials
//! - [`config`] - Session settings, loadable from TOML
//! - [`testing`] - Scripted engine and in-memory collaborators

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod credential;
pub mod engine;
pub mod error;
pub mod models;
pub mod sender;
pub mod session;
pub mod store;
pub mod testing;
pub mod tracing;
pub mod viewport;

mod sync;

pub use config::{SenderConfig, SessionConfig, ViewportConfig};
pub use credential::CredentialBroker;
pub use engine::{EngineError, EngineObserver, ProtocolEngine};
pub use error::{ConfigError, ConfigResult, SessionError, SessionResult};
pub use models::{DEFAULT_RFB_PORT, ServerProfile, UserCredential};
pub use sender::{MessageSender, OutboundMessage};
pub use session::{
    ConnectionState, Session, SessionEvent, SessionEventReceiver, StatePublisher, StateReceiver,
};
pub use store::{Clipboard, ProfileStore};
pub use tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, get_tracing_config,
    init_tracing, is_tracing_initialized, span_names,
};
pub use viewport::{FrameViewport, RenderHandle, RenderSurface, ViewportSnapshot};
