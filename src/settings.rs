//! Viewer settings persistence.
//!
//! Deployment-dependent knobs (token delimiter, plot decimation stride) are
//! kept across sessions as JSON in the platform config directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::record::Delimiter;
use crate::store::DEFAULT_STRIDE;

/// Settings that persist across sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewerSettings {
    /// Settings file version for migration support
    #[serde(default = "default_version")]
    pub version: u32,
    /// Token separator used by the deployed log producer
    #[serde(default)]
    pub delimiter: Delimiter,
    /// Decimation stride for plotted series
    #[serde(default = "default_stride")]
    pub series_stride: usize,
}

fn default_version() -> u32 {
    1
}

fn default_stride() -> usize {
    DEFAULT_STRIDE
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            version: 1,
            delimiter: Delimiter::default(),
            series_stride: DEFAULT_STRIDE,
        }
    }
}

impl ViewerSettings {
    /// Get the config directory path for navlog
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("navlog"))
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults on any failure.
    pub fn load() -> Self {
        let path = match Self::get_settings_path() {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(%e, "settings file unreadable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::get_settings_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(&path, content).map_err(|e| format!("Failed to write settings file: {}", e))
    }
}
