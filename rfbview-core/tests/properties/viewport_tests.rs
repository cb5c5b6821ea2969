//! Property tests for the frame viewport transform

use proptest::prelude::*;
use rfbview_core::testing::RecordingSurface;
use rfbview_core::{FrameViewport, ViewportConfig};
use std::sync::Arc;

fn close_enough(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-3 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Zooming keeps the framebuffer point under the focus on screen
    #[test]
    fn zoom_keeps_focus_fixed(
        start_x in -500.0f32..500.0,
        start_y in -500.0f32..500.0,
        delta in 0.05f32..20.0,
        focus_x in 0.0f32..2000.0,
        focus_y in 0.0f32..2000.0,
    ) {
        let viewport = FrameViewport::new(ViewportConfig::default());
        viewport.move_to(start_x, start_y);

        let scale = viewport.scale();
        let fb_x = (focus_x - viewport.frame_x()) / scale;
        let fb_y = (focus_y - viewport.frame_y()) / scale;

        viewport.update_zoom(delta, focus_x, focus_y);

        let new_scale = viewport.scale();
        prop_assert!(close_enough(viewport.frame_x() + fb_x * new_scale, focus_x));
        prop_assert!(close_enough(viewport.frame_y() + fb_y * new_scale, focus_y));
    }

    /// The returned factor is the ratio of the zoom after and before
    #[test]
    fn applied_factor_matches_zoom_change(
        first in 0.05f32..20.0,
        second in 0.05f32..20.0,
    ) {
        let config = ViewportConfig::default();
        let viewport = FrameViewport::new(config);
        viewport.update_zoom(first, 0.0, 0.0);

        let before = viewport.zoom_scale();
        let applied = viewport.update_zoom(second, 0.0, 0.0);
        let after = viewport.zoom_scale();

        prop_assert!(close_enough(before * applied, after));
        prop_assert!(after >= config.min_zoom && after <= config.max_zoom);
    }

    /// With both sizes known the frame never leaves a gap at the edges
    #[test]
    fn translation_stays_within_bounds(
        fb_w in 100.0f32..4000.0,
        fb_h in 100.0f32..4000.0,
        zoom in 0.1f32..10.0,
        dx in -5000.0f32..5000.0,
        dy in -5000.0f32..5000.0,
    ) {
        let viewport = FrameViewport::new(ViewportConfig::default());
        viewport.set_viewport_size(1280.0, 720.0);
        viewport.set_framebuffer_size(fb_w, fb_h);
        viewport.update_zoom(zoom, 640.0, 360.0);
        viewport.pan(dx, dy);

        let scaled_w = fb_w * viewport.scale();
        let x = viewport.frame_x();
        if scaled_w <= 1280.0 {
            prop_assert!(close_enough(x, (1280.0 - scaled_w) / 2.0));
        } else {
            prop_assert!(x <= 0.0 && x >= 1280.0 - scaled_w - 1e-2);
        }

        let scaled_h = fb_h * viewport.scale();
        let y = viewport.frame_y();
        if scaled_h <= 720.0 {
            prop_assert!(close_enough(y, (720.0 - scaled_h) / 2.0));
        } else {
            prop_assert!(y <= 0.0 && y >= 720.0 - scaled_h - 1e-2);
        }
    }

    /// Every mutation asks the attached surface to redraw
    #[test]
    fn every_mutation_requests_render(
        dx in -100.0f32..100.0,
        dy in -100.0f32..100.0,
    ) {
        let viewport = FrameViewport::new(ViewportConfig::default());
        let surface = Arc::new(RecordingSurface::default());
        viewport.render_handle().attach(&surface);

        viewport.pan(dx, dy);
        viewport.move_to(dx, dy);
        viewport.update_zoom(1.5, dx, dy);
        viewport.set_framebuffer_size(800.0, 600.0);

        prop_assert_eq!(surface.render_count(), 4);
    }
}

#[test]
fn invalid_delta_is_ignored() {
    let viewport = FrameViewport::new(ViewportConfig::default());
    viewport.move_to(10.0, 20.0);

    for delta in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert_eq!(viewport.update_zoom(delta, 100.0, 100.0), 1.0);
    }
    assert_eq!(viewport.zoom_scale(), 1.0);
    assert_eq!((viewport.frame_x(), viewport.frame_y()), (10.0, 20.0));
}
