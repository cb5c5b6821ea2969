//! Configuration for `rfbview` sessions
//!
//! Settings are plain serde structs that can be loaded from TOML and are
//! passed explicitly into the components that need them.

mod settings;

pub use settings::{
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, SenderConfig, SessionConfig, ViewportConfig,
};
