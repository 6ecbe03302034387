//! Sections of the editor configuration file
//!
//! Every field carries a serde default so a partial `editor.toml` still
//! loads; missing sections fall back to their `Default` impl.
//!
//! # Main Types
//!
//! - [`CanvasSettings`] - Snap radius, zoom range and steps, hit tolerances
//! - [`NodeSettings`] - Where custom node kinds are discovered
//! - [`ThemeSettings`] - Optional theme file
//! - [`UiPreferences`] - Host window preferences

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canvas interaction tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// Pixel radius around a release point within which a port counts as hit
    #[serde(default = "default_snap_radius")]
    pub snap_radius: f32,

    /// Smallest allowed zoom factor
    #[serde(default = "default_zoom_min")]
    pub zoom_min: f32,

    /// Largest allowed zoom factor
    #[serde(default = "default_zoom_max")]
    pub zoom_max: f32,

    /// Zoom multiplier per wheel notch towards the user
    #[serde(default = "default_zoom_in_step")]
    pub zoom_in_step: f32,

    /// Zoom multiplier per wheel notch away from the user
    #[serde(default = "default_zoom_out_step")]
    pub zoom_out_step: f32,

    /// Pixel distance from a connection curve that still selects it
    #[serde(default = "default_hit_tolerance")]
    pub connection_hit_tolerance: f32,

    /// Radius of the endpoint markers shown on hovered/selected connections
    #[serde(default = "default_marker_radius")]
    pub endpoint_marker_radius: f32,

    /// Line segments used to flatten one connection curve
    #[serde(default = "default_curve_segments")]
    pub curve_segments: usize,

    /// Background grid spacing in world units (0 disables the grid)
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,
}

fn default_snap_radius() -> f32 {
    14.0
}

fn default_zoom_min() -> f32 {
    0.3
}

fn default_zoom_max() -> f32 {
    3.0
}

fn default_zoom_in_step() -> f32 {
    1.15
}

fn default_zoom_out_step() -> f32 {
    0.85
}

fn default_hit_tolerance() -> f32 {
    6.0
}

fn default_marker_radius() -> f32 {
    5.0
}

fn default_curve_segments() -> usize {
    24
}

fn default_grid_spacing() -> f32 {
    20.0
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            snap_radius: default_snap_radius(),
            zoom_min: default_zoom_min(),
            zoom_max: default_zoom_max(),
            zoom_in_step: default_zoom_in_step(),
            zoom_out_step: default_zoom_out_step(),
            connection_hit_tolerance: default_hit_tolerance(),
            endpoint_marker_radius: default_marker_radius(),
            curve_segments: default_curve_segments(),
            grid_spacing: default_grid_spacing(),
        }
    }
}

impl CanvasSettings {
    /// Clamp a zoom factor into the configured range.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        let (lo, hi) = self.zoom_bounds();
        if zoom.is_nan() {
            return lo;
        }
        zoom.clamp(lo, hi)
    }

    /// Ordered zoom range, with defaults standing in for unusable bounds.
    fn zoom_bounds(&self) -> (f32, f32) {
        let usable = |v: f32, fallback: f32| if v.is_finite() && v > 0.0 { v } else { fallback };
        let min = usable(self.zoom_min, default_zoom_min());
        let max = usable(self.zoom_max, default_zoom_max());
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }

    /// Replace hand-edited values that would break viewport math
    /// (NaN, infinite, zero or negative) with their defaults.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        let fix = |value: &mut f32, fallback: f32, name: &str| {
            if !value.is_finite() || *value <= 0.0 {
                tracing::warn!("Invalid canvas.{} = {}, using {}", name, value, fallback);
                *value = fallback;
            }
        };
        fix(&mut self.zoom_min, defaults.zoom_min, "zoom_min");
        fix(&mut self.zoom_max, defaults.zoom_max, "zoom_max");
        fix(&mut self.zoom_in_step, defaults.zoom_in_step, "zoom_in_step");
        fix(&mut self.zoom_out_step, defaults.zoom_out_step, "zoom_out_step");
        fix(&mut self.snap_radius, defaults.snap_radius, "snap_radius");
        if self.zoom_min > self.zoom_max {
            std::mem::swap(&mut self.zoom_min, &mut self.zoom_max);
        }
    }
}

/// Node discovery settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Directory scanned for `*.toml` custom kind definitions.
    /// Defaults to `<data_dir>/custom_nodes` when unset.
    #[serde(default)]
    pub custom_dir: Option<PathBuf>,
}

/// Theme settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettings {
    /// Theme file with `[colors]` and `[node_colors]` tables
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Host window preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
}

fn default_true() -> bool {
    true
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            font_scale: 1.0,
        }
    }
}
