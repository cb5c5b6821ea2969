//! Collaborators the session consumes but does not implement
//!
//! Profile persistence and the local clipboard belong to the host
//! application. The session only needs the narrow views defined here.

use crate::models::{ServerProfile, UserCredential};

/// Persistent store of server profiles
pub trait ProfileStore: Send + Sync {
    /// Previously used credentials, offered as suggestions in the
    /// credential prompt.
    fn known_credentials(&self) -> Vec<UserCredential>;

    /// Saves `profile`. Called off the network thread, once per successful
    /// connection of a persisted profile.
    ///
    /// When the user answered a credential prompt, `profile` carries the
    /// typed username and password; otherwise it is the profile as
    /// captured at connect.
    fn update(&self, profile: &ServerProfile);
}

/// Local clipboard of the host
pub trait Clipboard: Send + Sync {
    /// Current clipboard text, if any.
    ///
    /// May be called from any thread. The clipboard sync on connect reads it
    /// on the network thread.
    fn text(&self) -> Option<String>;

    /// Replaces the clipboard text.
    fn set_text(&self, text: &str);
}
