//! Server profile used to start a connection

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserCredential;

/// Default port for remote framebuffer servers (display :0)
pub const DEFAULT_RFB_PORT: u16 = 5900;

/// Connection target and optional stored credentials
///
/// A profile is captured once when a session connects and stays unchanged
/// for the lifetime of that session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Identity in the profile store, `None` for ad-hoc connections
    #[serde(default)]
    pub id: Option<Uuid>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Target hostname or IP address
    pub address: String,

    /// Target port (default: 5900)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Stored username, if any
    #[serde(default)]
    pub username: Option<String>,

    /// Stored password, if any
    #[serde(skip)]
    pub password: Option<SecretString>,
}

const fn default_port() -> u16 {
    DEFAULT_RFB_PORT
}

impl Default for ServerProfile {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            address: String::new(),
            port: DEFAULT_RFB_PORT,
            username: None,
            password: None,
        }
    }
}

impl ServerProfile {
    /// Creates an ad-hoc profile for the given address
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Sets the store identity
    #[must_use]
    pub const fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the stored username
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the stored password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Returns true if the profile lives in the profile store
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns the stored username if it is not blank
    #[must_use]
    pub fn stored_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Returns the stored password if it is not blank
    #[must_use]
    pub fn stored_password(&self) -> Option<&SecretString> {
        self.password
            .as_ref()
            .filter(|pass| !pass.expose_secret().trim().is_empty())
    }

    /// Returns the full stored credential when both fields are present
    #[must_use]
    pub fn stored_credential(&self) -> Option<UserCredential> {
        let username = self.stored_username()?;
        let password = self.stored_password()?;
        Some(UserCredential::new(username, password.expose_secret()))
    }

    /// Returns the server address as "address:port"
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
