use crate::error::SnowError;
use crate::scheduler::TICK_DELAY;
use crate::settings::SnowSettings;
use crate::surface::SceneElement;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Snow effect settings
    pub settings: SnowSettings,
    /// Boxes drawn on the canvas that snow can collect on
    pub scene: Vec<SceneElement>,
    /// Delay between ticks in milliseconds
    pub tick_delay_ms: u64,
}

impl AppConfig {
    /// `<config_dir>/snowfall-tui/config.json`
    pub fn default_path() -> Result<PathBuf, SnowError> {
        dirs::config_dir()
            .map(|p| p.join("snowfall-tui").join("config.json"))
            .ok_or(SnowError::NoConfigDir)
    }

    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SnowError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| SnowError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| SnowError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("saved config to {}", path.display());
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, SnowError> {
        let content = fs::read_to_string(path).map_err(|source| SnowError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, SnowError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn tick_delay(&self) -> Duration {
        if self.tick_delay_ms == 0 {
            TICK_DELAY
        } else {
            Duration::from_millis(self.tick_delay_ms.min(1000))
        }
    }
}

/// A banner across the middle and two ledges along the bottom
pub fn default_scene() -> Vec<SceneElement> {
    vec![
        SceneElement::new("banner", "Let it snow", 0.25, 0.45, 0.5, 3),
        SceneElement::new("left-ledge", "", 0.0, 0.85, 0.3, 2).with_class("ledge"),
        SceneElement::new("right-ledge", "", 0.7, 0.85, 0.3, 2).with_class("ledge"),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: SnowSettings::default(),
            scene: default_scene(),
            tick_delay_ms: TICK_DELAY.as_millis() as u64,
        }
    }
}
