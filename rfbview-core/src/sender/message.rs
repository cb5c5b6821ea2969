//! Client-to-server messages

/// X11 keysym for the left Control key
pub const XK_CONTROL_L: u32 = 0xffe3;

/// X11 keysym for the left Alt key
pub const XK_ALT_L: u32 = 0xffe9;

/// X11 keysym for Delete
pub const XK_DELETE: u32 = 0xffff;

/// Message queued for delivery to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Key press or release (keysym, down)
    KeyEvent {
        /// X11 keysym
        keysym: u32,
        /// `true` for press, `false` for release
        down: bool,
    },

    /// Pointer position and button mask
    PointerEvent {
        /// X coordinate in framebuffer pixels
        x: u16,
        /// Y coordinate in framebuffer pixels
        y: u16,
        /// Button mask (bit 0 = left, 1 = middle, 2 = right, 3/4 = wheel)
        buttons: u8,
    },

    /// Client cut text
    ClipboardText(String),

    /// Request a full (non-incremental) framebuffer update
    RefreshScreen,
}

impl OutboundMessage {
    /// Returns true for keyboard and pointer input
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::KeyEvent { .. } | Self::PointerEvent { .. })
    }

    /// Short name used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::KeyEvent { .. } => "key",
            Self::PointerEvent { .. } => "pointer",
            Self::ClipboardText(_) => "clipboard",
            Self::RefreshScreen => "refresh",
        }
    }

    /// Key events for Ctrl+Alt+Del: press all three, release in reverse
    #[must_use]
    pub fn ctrl_alt_del() -> Vec<Self> {
        let key = |keysym, down| Self::KeyEvent { keysym, down };
        vec![
            key(XK_CONTROL_L, true),
            key(XK_ALT_L, true),
            key(XK_DELETE, true),
            key(XK_DELETE, false),
            key(XK_ALT_L, false),
            key(XK_CONTROL_L, false),
        ]
    }
}
