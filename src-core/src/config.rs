//! Configuration management for wavesub.
//!
//! Handles loading and saving user configuration to platform-standard config
//! directories:
//! - Linux: `~/.config/wavesub/config.json`
//! - macOS: `~/Library/Application Support/wavesub/config.json`
//! - Windows: `%APPDATA%\wavesub\config.json`
//!
//! The persisted config holds the user's render and export defaults. A
//! render takes an immutable [`RenderConfig`](crate::render::RenderConfig)
//! snapshot of it at session/job start; edits made mid-render apply to the
//! next session.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::export::{ContainerFormat, QualityTier};
use crate::render::RenderConfig;

/// Export-related configuration defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExportConfig {
    /// Output container format.
    #[serde(default)]
    pub format: ContainerFormat,
    /// Quality tier.
    #[serde(default)]
    pub quality: QualityTier,
    /// Custom output directory. If None, uses the system Videos folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// Render settings snapshot with all values clamped to supported ranges.
    pub fn render_snapshot(&self) -> RenderConfig {
        self.render.clone().clamped()
    }
}

/// Get the path to the config file.
fn config_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "wavesub")?;
    Some(proj_dirs.config_dir().join("config.json"))
}

/// Load configuration from disk, falling back to defaults on any error.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        tracing::warn!("could not determine config directory, using defaults");
        return AppConfig::default();
    };

    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("failed to parse config at {}: {}", path.display(), e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

/// Save configuration to disk, creating the config directory if needed.
pub fn save_config(config: &AppConfig) -> crate::Result<()> {
    let path = config_path()
        .ok_or_else(|| crate::Error::export("could not determine config directory"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| crate::Error::io(parent, e))?;
    }

    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| crate::Error::export(format!("failed to serialize config: {}", e)))?;
    fs::write(&path, contents).map_err(|e| crate::Error::io(&path, e))?;

    Ok(())
}
