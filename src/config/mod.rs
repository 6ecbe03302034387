//! Configuration module for Celebrimbor
//!
//! This module handles editor configuration and theme lookup:
//! - Canvas tuning (snap radius, zoom range, hit tolerances)
//! - Custom node-kind discovery directory
//! - Theme file location and the [`StyleResolver`] used by rendering and
//!   node creation
//!
//! # App Data Location
//!
//! Configuration is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.celebrimbor.editor/`
//! - **macOS**: `~/Library/Application Support/dev.celebrimbor.editor/`
//! - **Windows**: `%APPDATA%\dev.celebrimbor.editor\`
//!
//! # Files
//!
//! - `editor.toml` - Editor configuration
//! - `custom_nodes/` - Default directory for custom kind definitions
//!
//! # Example
//!
//! ```ignore
//! use celebrimbor::config::EditorConfig;
//!
//! let mut config = EditorConfig::load_or_default();
//! config.canvas.snap_radius = 18.0;
//! config.save()?;
//! ```

pub mod settings;
pub mod theme;

pub use settings::*;
pub use theme::{StyleResolver, Theme};

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.celebrimbor.editor";

/// Editor configuration filename
pub const CONFIG_FILE: &str = "editor.toml";

/// Default custom node directory name inside the app data directory
pub const CUSTOM_NODES_DIR: &str = "custom_nodes";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        EditorError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            EditorError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the editor configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Editor Config ====================

/// Persistent editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Config format version
    #[serde(default = "default_config_version")]
    pub version: u32,

    #[serde(default)]
    pub canvas: CanvasSettings,

    #[serde(default)]
    pub nodes: NodeSettings,

    #[serde(default)]
    pub theme: ThemeSettings,

    #[serde(default)]
    pub ui: UiPreferences,
}

fn default_config_version() -> u32 {
    1
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: 1,
            canvas: CanvasSettings::default(),
            nodes: NodeSettings::default(),
            theme: ThemeSettings::default(),
            ui: UiPreferences::default(),
        }
    }
}

impl EditorConfig {
    /// Load the configuration from the default location. A missing file
    /// yields defaults.
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            EditorError::Config("Could not determine config path".to_string())
        })?;
        Self::load_from(&path)
    }

    /// Load the configuration from an explicit path. A missing file yields
    /// defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("Failed to read config: {}", e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| EditorError::Config(format!("Failed to parse config: {}", e)))?;
        config.canvas.sanitize();
        Ok(config)
    }

    /// Load the configuration, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load editor config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(&dir.join(CONFIG_FILE))
    }

    /// Save the configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| EditorError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| EditorError::Config(format!("Failed to write config: {}", e)))
    }

    /// Directory scanned for custom kinds: the configured one, else
    /// `<data_dir>/custom_nodes`.
    pub fn custom_nodes_dir(&self) -> Option<PathBuf> {
        self.nodes
            .custom_dir
            .clone()
            .or_else(|| app_data_dir().map(|p| p.join(CUSTOM_NODES_DIR)))
    }

    /// Load the configured theme, or the built-in palette when none is set.
    pub fn load_theme(&self) -> Theme {
        match &self.theme.path {
            Some(path) => Theme::load_or_default(path),
            None => Theme::default(),
        }
    }
}
