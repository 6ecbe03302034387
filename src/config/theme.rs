//! Theme and style lookup
//!
//! Rendering and node creation ask a [`StyleResolver`] for colours by
//! symbolic key, always passing a fallback. The resolver is threaded through
//! explicitly; nothing reads a global.
//!
//! A theme file is TOML with two optional tables:
//!
//! ```toml
//! [colors]
//! canvas_background = "#16181d"
//! connection = "#60a5fa"
//!
//! [node_colors]
//! logic_start = "#1e3a8a"
//! logic_end = "#2563eb"
//! ```

use crate::error::{EditorError, Result};
use egui::Color32;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Colour used when neither the theme nor the caller knows better.
pub const FALLBACK_COLOR: &str = "#2d2d2d";

/// Symbolic colour lookup with caller-supplied fallbacks.
pub trait StyleResolver {
    /// Colour for `key`, or `fallback` when unset.
    fn color(&self, key: &str, fallback: &str) -> String;

    /// Gradient pair for a node category: keys `<prefix>_start` and `<prefix>_end`.
    fn gradient_pair(&self, prefix: &str, fallback: (&str, &str)) -> (String, String);
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    colors: HashMap<String, String>,
    #[serde(default)]
    node_colors: HashMap<String, String>,
}

/// Colour theme loaded from TOML, layered over a built-in palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    colors: HashMap<String, String>,
    node_colors: HashMap<String, String>,
}

const BUILTIN_NODE_COLORS: [(&str, &str, &str); 5] = [
    ("action", "#45a049", "#4CAF50"),
    ("logic", "#1e3a8a", "#2563eb"),
    ("condition", "#9a3412", "#ea580c"),
    ("sensor", "#4c1d95", "#7c3aed"),
    ("custom", "#374151", "#4b5563"),
];

impl Default for Theme {
    fn default() -> Self {
        let mut node_colors = HashMap::new();
        for (prefix, start, end) in BUILTIN_NODE_COLORS {
            node_colors.insert(format!("{prefix}_start"), start.to_string());
            node_colors.insert(format!("{prefix}_end"), end.to_string());
        }
        Self {
            colors: HashMap::new(),
            node_colors,
        }
    }
}

impl Theme {
    /// Theme with no entries at all; every lookup yields its fallback.
    pub fn empty() -> Self {
        Self {
            colors: HashMap::new(),
            node_colors: HashMap::new(),
        }
    }

    /// Parse theme TOML over the built-in palette.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ThemeFile = toml::from_str(content)
            .map_err(|e| EditorError::Config(format!("Failed to parse theme: {}", e)))?;
        let mut theme = Self::default();
        theme.colors.extend(file.colors);
        theme.node_colors.extend(file.node_colors);
        Ok(theme)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("Failed to read theme {:?}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    /// Load a theme file, falling back to the built-in palette on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Using built-in theme: {}", e);
            Self::default()
        })
    }
}

impl StyleResolver for Theme {
    fn color(&self, key: &str, fallback: &str) -> String {
        self.colors
            .get(key)
            .or_else(|| self.node_colors.get(key))
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    fn gradient_pair(&self, prefix: &str, fallback: (&str, &str)) -> (String, String) {
        let get = |suffix: &str, fallback: &str| {
            self.node_colors
                .get(&format!("{prefix}_{suffix}"))
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };
        (get("start", fallback.0), get("end", fallback.1))
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.trim().strip_prefix('#')?;
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Resolve `key` and parse it, falling back to `fallback` on a bad value.
pub fn resolve_color(style: &dyn StyleResolver, key: &str, fallback: &str) -> Color32 {
    parse_hex_color(&style.color(key, fallback))
        .or_else(|| parse_hex_color(fallback))
        .unwrap_or(Color32::from_gray(45))
}
