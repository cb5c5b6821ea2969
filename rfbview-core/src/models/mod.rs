//! Core data structures shared by the session components

mod credential;
mod profile;

pub use credential::UserCredential;
pub use profile::{DEFAULT_RFB_PORT, ServerProfile};
