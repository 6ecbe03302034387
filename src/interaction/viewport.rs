//! Canvas viewport: pan offset and zoom factor.
//!
//! World coordinates are where nodes live; screen coordinates are relative
//! to the canvas origin (top-left of the painted area).
//! `screen = world * zoom + pan`.

use crate::config::CanvasSettings;
use egui::{Pos2, Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    /// Convert a screen-space length to world units.
    pub fn screen_len_to_world(&self, len: f32) -> f32 {
        len / self.zoom
    }

    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.world_to_screen(rect.min), self.world_to_screen(rect.max))
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Multiply the zoom by `factor`, keeping the world point under
    /// `anchor` (screen space) fixed. Returns whether the zoom changed.
    pub fn zoom_about(&mut self, anchor: Pos2, factor: f32, settings: &CanvasSettings) -> bool {
        let new_zoom = settings.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() <= f32::EPSILON {
            return false;
        }
        let world = self.screen_to_world(anchor);
        self.zoom = new_zoom;
        self.pan = anchor.to_vec2() - world.to_vec2() * new_zoom;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Frame `bounds` (world) inside a view of `view_size` pixels with a
    /// margin, clamped to the zoom range. An empty `bounds` resets the view.
    pub fn fit_to(&mut self, bounds: Option<Rect>, view_size: Vec2, settings: &CanvasSettings) {
        const MARGIN: f32 = 40.0;
        let Some(bounds) = bounds else {
            self.reset();
            return;
        };
        let avail = (view_size - Vec2::splat(MARGIN * 2.0)).max(Vec2::splat(1.0));
        let size = bounds.size().max(Vec2::splat(1.0));
        let zoom = settings.clamp_zoom((avail.x / size.x).min(avail.y / size.y));
        self.zoom = zoom;
        self.pan = (view_size * 0.5) - bounds.center().to_vec2() * zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_conversion() {
        let vp = Viewport {
            pan: Vec2::new(30.0, -10.0),
            zoom: 2.0,
        };
        let world = Pos2::new(12.0, 7.5);
        let screen = vp.world_to_screen(world);
        assert_eq!(screen, Pos2::new(54.0, 5.0));
        assert_eq!(vp.screen_to_world(screen), world);
    }

    #[test]
    fn test_zoom_about_keeps_anchor_fixed() {
        let settings = CanvasSettings::default();
        let mut vp = Viewport::default();
        let anchor = Pos2::new(200.0, 100.0);
        let before = vp.screen_to_world(anchor);
        assert!(vp.zoom_about(anchor, settings.zoom_in_step, &settings));
        let after = vp.screen_to_world(anchor);
        assert!((before - after).length() < 1e-3);
        assert!((vp.zoom - 1.15).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped() {
        let settings = CanvasSettings::default();
        let mut vp = Viewport::default();
        for _ in 0..50 {
            vp.zoom_about(Pos2::ZERO, settings.zoom_in_step, &settings);
        }
        assert_eq!(vp.zoom, 3.0);
        assert!(!vp.zoom_about(Pos2::ZERO, settings.zoom_in_step, &settings));
        for _ in 0..50 {
            vp.zoom_about(Pos2::ZERO, settings.zoom_out_step, &settings);
        }
        assert_eq!(vp.zoom, 0.3);
    }

    #[test]
    fn test_fit_to_centres_bounds() {
        let settings = CanvasSettings::default();
        let mut vp = Viewport::default();
        let bounds = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        vp.fit_to(Some(bounds), Vec2::new(480.0, 480.0), &settings);
        assert!((vp.zoom - 2.0).abs() < 1e-5);
        let centre = vp.world_to_screen(bounds.center());
        assert!((centre - Pos2::new(240.0, 240.0)).length() < 1e-3);

        vp.fit_to(None, Vec2::new(480.0, 480.0), &settings);
        assert_eq!(vp, Viewport::default());
    }
}
