//! Connection lifecycle
//!
//! A [`Session`] drives one connection attempt through
//! `Disconnected → Connecting → Connected → Disconnected`, coordinating the
//! network thread, the outbound sender, the UI and the render surface.

mod event;
mod manager;
mod observer;
mod state;
mod task;

pub use event::{SessionEvent, SessionEventReceiver};
pub use manager::Session;
pub use state::{ConnectionState, StatePublisher, StateReceiver};
