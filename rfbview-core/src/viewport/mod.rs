//! Frame viewport: scale and translation of the remote framebuffer
//!
//! The UI mutates the viewport through gestures while the render surface
//! reads it on its own thread. Every field is an independent atomic, so
//! reads never block and never see a torn value, but a frame drawn in the
//! middle of an update may mix old and new fields. That race is visually
//! harmless and is accepted in exchange for a lock-free render path.
//!
//! The displayed scale is `base_scale * zoom_scale`. `base_scale` fits the
//! framebuffer into the viewport; `zoom_scale` is the user's zoom, clamped by
//! [`ViewportConfig`]. A framebuffer pixel `p` is drawn at
//! `frame + scale * p` on each axis.

mod render;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::ViewportConfig;

pub use render::{RenderHandle, RenderSurface};

/// `f32` stored in an `AtomicU32`
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Values read together by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    /// Effective scale (`base_scale * zoom_scale`)
    pub scale: f32,
    /// Horizontal translation in screen pixels
    pub frame_x: f32,
    /// Vertical translation in screen pixels
    pub frame_y: f32,
    /// Framebuffer width
    pub framebuffer_width: f32,
    /// Framebuffer height
    pub framebuffer_height: f32,
}

/// Scale/translation state shared between UI gestures and rendering
#[derive(Debug)]
pub struct FrameViewport {
    config: ViewportConfig,
    framebuffer_width: AtomicF32,
    framebuffer_height: AtomicF32,
    viewport_width: AtomicF32,
    viewport_height: AtomicF32,
    zoom_scale: AtomicF32,
    frame_x: AtomicF32,
    frame_y: AtomicF32,
    render: RenderHandle,
}

impl FrameViewport {
    /// Creates a viewport with unit zoom and no known sizes.
    ///
    /// Invalid zoom limits are replaced by the defaults.
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid viewport config, using defaults");
                ViewportConfig::default()
            }
        };
        Self {
            config,
            framebuffer_width: AtomicF32::new(0.0),
            framebuffer_height: AtomicF32::new(0.0),
            viewport_width: AtomicF32::new(0.0),
            viewport_height: AtomicF32::new(0.0),
            zoom_scale: AtomicF32::new(1.0_f32.clamp(config.min_zoom, config.max_zoom)),
            frame_x: AtomicF32::new(0.0),
            frame_y: AtomicF32::new(0.0),
            render: RenderHandle::new(),
        }
    }

    /// Returns the zoom limits
    #[must_use]
    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Returns the render surface handle
    #[must_use]
    pub const fn render_handle(&self) -> &RenderHandle {
        &self.render
    }

    /// Asks the render surface to redraw; dropped if none is attached
    pub fn request_render(&self) {
        if !self.render.request_render() {
            tracing::trace!("Render request dropped, no surface attached");
        }
    }

    /// Multiplies the zoom by `scale_delta`, keeping the screen point
    /// (`focus_x`, `focus_y`) fixed.
    ///
    /// Returns the factor actually applied after clamping to the zoom limits.
    /// A non-positive or non-finite delta is ignored and yields `1.0`.
    pub fn update_zoom(&self, scale_delta: f32, focus_x: f32, focus_y: f32) -> f32 {
        let applied = self.apply_zoom(scale_delta);

        // The focus drifts by its distance from the frame origin times the
        // scale change; translate back by the same amount.
        let frame_x = self.frame_x.load();
        let frame_y = self.frame_y.load();
        let drift_x = (focus_x - frame_x) * (applied - 1.0);
        let drift_y = (focus_y - frame_y) * (applied - 1.0);
        self.frame_x.store(frame_x - drift_x);
        self.frame_y.store(frame_y - drift_y);

        self.coerce_translation();
        self.request_render();
        applied
    }

    fn apply_zoom(&self, scale_delta: f32) -> f32 {
        if !scale_delta.is_finite() || scale_delta <= 0.0 {
            return 1.0;
        }
        let old_zoom = self.zoom_scale.load();
        let new_zoom = (old_zoom * scale_delta).clamp(self.config.min_zoom, self.config.max_zoom);
        self.zoom_scale.store(new_zoom);
        new_zoom / old_zoom
    }

    /// Moves the frame by (`dx`, `dy`) screen pixels
    pub fn pan(&self, dx: f32, dy: f32) {
        self.frame_x.store(self.frame_x.load() + dx);
        self.frame_y.store(self.frame_y.load() + dy);
        self.coerce_translation();
        self.request_render();
    }

    /// Moves the frame origin to (`x`, `y`)
    pub fn move_to(&self, x: f32, y: f32) {
        self.frame_x.store(x);
        self.frame_y.store(y);
        self.coerce_translation();
        self.request_render();
    }

    /// Records a new framebuffer size and re-clamps the translation
    pub fn set_framebuffer_size(&self, width: f32, height: f32) {
        self.framebuffer_width.store(width.max(0.0));
        self.framebuffer_height.store(height.max(0.0));
        self.coerce_translation();
        self.request_render();
    }

    /// Records a new on-screen viewport size and re-clamps the translation
    pub fn set_viewport_size(&self, width: f32, height: f32) {
        self.viewport_width.store(width.max(0.0));
        self.viewport_height.store(height.max(0.0));
        self.coerce_translation();
        self.request_render();
    }

    /// Clamps the translation when both sizes are known.
    ///
    /// On each axis a frame narrower than the viewport is centred, a wider
    /// one may not leave a gap at either edge.
    fn coerce_translation(&self) {
        let (fb_w, fb_h) = self.framebuffer_size();
        let (vp_w, vp_h) = self.viewport_size();
        if fb_w <= 0.0 || fb_h <= 0.0 || vp_w <= 0.0 || vp_h <= 0.0 {
            return;
        }
        let scale = self.scale();
        self.frame_x
            .store(coerce_axis(self.frame_x.load(), vp_w, fb_w * scale));
        self.frame_y
            .store(coerce_axis(self.frame_y.load(), vp_h, fb_h * scale));
    }

    /// Scale that fits the framebuffer into the viewport (1.0 while unknown)
    #[must_use]
    pub fn base_scale(&self) -> f32 {
        let (fb_w, fb_h) = self.framebuffer_size();
        let (vp_w, vp_h) = self.viewport_size();
        if fb_w <= 0.0 || fb_h <= 0.0 || vp_w <= 0.0 || vp_h <= 0.0 {
            return 1.0;
        }
        (vp_w / fb_w).min(vp_h / fb_h)
    }

    /// User zoom factor
    #[must_use]
    pub fn zoom_scale(&self) -> f32 {
        self.zoom_scale.load()
    }

    /// Effective scale applied to the framebuffer
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.base_scale() * self.zoom_scale()
    }

    /// Horizontal translation
    #[must_use]
    pub fn frame_x(&self) -> f32 {
        self.frame_x.load()
    }

    /// Vertical translation
    #[must_use]
    pub fn frame_y(&self) -> f32 {
        self.frame_y.load()
    }

    /// Framebuffer size as (width, height)
    #[must_use]
    pub fn framebuffer_size(&self) -> (f32, f32) {
        (self.framebuffer_width.load(), self.framebuffer_height.load())
    }

    /// Viewport size as (width, height)
    #[must_use]
    pub fn viewport_size(&self) -> (f32, f32) {
        (self.viewport_width.load(), self.viewport_height.load())
    }

    /// Reads everything the renderer needs
    #[must_use]
    pub fn snapshot(&self) -> ViewportSnapshot {
        let (framebuffer_width, framebuffer_height) = self.framebuffer_size();
        ViewportSnapshot {
            scale: self.scale(),
            frame_x: self.frame_x(),
            frame_y: self.frame_y(),
            framebuffer_width,
            framebuffer_height,
        }
    }

    /// Maps a screen point to framebuffer coordinates.
    ///
    /// Returns `None` if the point is outside the framebuffer or its size is
    /// not known yet.
    #[must_use]
    pub fn screen_to_framebuffer(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let snapshot = self.snapshot();
        if snapshot.scale <= 0.0 {
            return None;
        }
        let fb_x = (x - snapshot.frame_x) / snapshot.scale;
        let fb_y = (y - snapshot.frame_y) / snapshot.scale;
        let inside = (0.0..snapshot.framebuffer_width).contains(&fb_x)
            && (0.0..snapshot.framebuffer_height).contains(&fb_y);
        inside.then_some((fb_x, fb_y))
    }
}

fn coerce_axis(position: f32, viewport: f32, scaled_frame: f32) -> f32 {
    if scaled_frame <= viewport {
        (viewport - scaled_frame) / 2.0
    } else {
        position.clamp(viewport - scaled_frame, 0.0)
    }
}
