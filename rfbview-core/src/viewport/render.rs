//! Non-owning link to the rendering surface

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::sync::lock_or_recover;

/// Surface that draws the framebuffer on its own thread
///
/// `request_render` must be cheap and callable from any thread; it only
/// schedules a frame.
pub trait RenderSurface: Send + Sync {
    /// Schedules a redraw.
    fn request_render(&self);
}

/// Weak, nullable handle to the current render surface
///
/// The surface may be destroyed and recreated at any time. The handle never
/// keeps it alive; a render request to a missing surface is dropped.
#[derive(Default)]
pub struct RenderHandle {
    surface: Mutex<Option<Weak<dyn RenderSurface>>>,
}

impl RenderHandle {
    /// Creates an empty handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the handle at `surface` without taking ownership
    pub fn attach<S: RenderSurface + 'static>(&self, surface: &Arc<S>) {
        let weak = Arc::downgrade(surface) as Weak<dyn RenderSurface>;
        *lock_or_recover(&self.surface) = Some(weak);
    }

    /// Clears the handle
    pub fn detach(&self) {
        *lock_or_recover(&self.surface) = None;
    }

    /// Returns true if a live surface is attached
    #[must_use]
    pub fn is_attached(&self) -> bool {
        lock_or_recover(&self.surface)
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Asks the surface to redraw.
    ///
    /// Returns `false` when no live surface is attached.
    pub fn request_render(&self) -> bool {
        let surface = lock_or_recover(&self.surface)
            .as_ref()
            .and_then(Weak::upgrade);
        // Called outside the lock so a surface may re-enter the handle.
        match surface {
            Some(surface) => {
                surface.request_render();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}
