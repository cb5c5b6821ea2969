//! Session settings
//!
//! Settings are handed to a session at construction. Nothing in the crate
//! reads ambient preferences.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default lower zoom bound
pub const DEFAULT_MIN_ZOOM: f32 = 0.5;

/// Default upper zoom bound
pub const DEFAULT_MAX_ZOOM: f32 = 5.0;

/// Zoom limits applied by the frame viewport (stored under `[viewport]`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Smallest zoom factor relative to the fit-to-viewport scale
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    /// Largest zoom factor relative to the fit-to-viewport scale
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
}

const fn default_min_zoom() -> f32 {
    DEFAULT_MIN_ZOOM
}

const fn default_max_zoom() -> f32 {
    DEFAULT_MAX_ZOOM
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl ViewportConfig {
    /// Creates zoom limits
    #[must_use]
    pub const fn new(min_zoom: f32, max_zoom: f32) -> Self {
        Self { min_zoom, max_zoom }
    }

    /// Checks that the bounds are finite, positive and ordered
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the offending bound.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.min_zoom.is_finite() || self.min_zoom <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_zoom must be positive, got {}",
                self.min_zoom
            )));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return Err(ConfigError::Invalid(format!(
                "max_zoom must be at least min_zoom ({}), got {}",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }
}

/// Outbound message settings (stored under `[sender]`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    /// View-only mode: keyboard and pointer input is dropped
    #[serde(default)]
    pub view_only: bool,
}

/// Settings for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Zoom limits
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Outbound message settings
    #[serde(default)]
    pub sender: SenderConfig,
    /// Push the local clipboard to the server once connected (default: true)
    #[serde(default = "default_true")]
    pub sync_clipboard_on_connect: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            sender: SenderConfig::default(),
            sync_clipboard_on_connect: true,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the zoom limits
    #[must_use]
    pub const fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    /// Sets view-only mode
    #[must_use]
    pub const fn with_view_only(mut self, view_only: bool) -> Self {
        self.sender.view_only = view_only;
        self
    }

    /// Sets whether the clipboard is pushed on connect
    #[must_use]
    pub const fn with_clipboard_sync(mut self, enabled: bool) -> Self {
        self.sync_clipboard_on_connect = enabled;
        self
    }

    /// Validates all sections
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.viewport.validate()
    }

    /// Parses and validates a TOML document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`SessionConfig::from_toml_str`].
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded session config");
        Ok(config)
    }
}
