//! Credentials exchanged during authentication

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Username and password supplied for server authentication
///
/// The empty credential (no username, empty password) is the shutdown
/// sentinel: it unblocks a waiting handshake and simply fails
/// authentication.
#[derive(Clone)]
pub struct UserCredential {
    /// Username, `None` for password-only security types
    pub username: Option<String>,
    /// Password
    pub password: SecretString,
}

impl UserCredential {
    /// Creates a credential with both username and password
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: SecretString::from(password.into()),
        }
    }

    /// Creates a password-only credential
    #[must_use]
    pub fn password_only(password: impl Into<String>) -> Self {
        Self {
            username: None,
            password: SecretString::from(password.into()),
        }
    }

    /// Creates the empty sentinel credential
    #[must_use]
    pub fn empty() -> Self {
        Self {
            username: None,
            password: SecretString::from(String::new()),
        }
    }

    /// Returns true for the empty sentinel credential
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.as_deref().is_none_or(str::is_empty)
            && self.password.expose_secret().is_empty()
    }

    /// Returns the username, or an empty string when absent
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }
}

impl Default for UserCredential {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for UserCredential {
    fn eq(&self, other: &Self) -> bool {
        self.username() == other.username()
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Eq for UserCredential {}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
