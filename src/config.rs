use crate::playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const APP_DIR: &str = "jamview";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Startup constants. Read once from `config.json`; never changed while running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Distance kept free on both sides of the road
    pub edge_margin: f32,
    pub background_tiles: usize,
    pub capacity: usize,
    pub time_unit_ms: u64,
    pub boot_delay_ms: u64,
    /// Background units per frame at full speed
    pub base_scroll_speed: f32,
    pub spokes_per_wheel: usize,
    pub dataset_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1450.0,
            viewport_height: 750.0,
            edge_margin: 40.0,
            background_tiles: 6,
            capacity: 30,
            time_unit_ms: 1500,
            boot_delay_ms: 100,
            base_scroll_speed: 2.0,
            spokes_per_wheel: 10,
            dataset_path: None,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load the user's config, falling back to defaults when it is missing or broken
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the constants and derive the playback geometry from them
    pub fn playback(&self) -> Result<PlaybackConfig, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if self.background_tiles < 2 {
            return Err(ConfigError::Invalid("background_tiles must be at least 2".into()));
        }
        if self.time_unit_ms == 0 {
            return Err(ConfigError::Invalid("time_unit_ms must be positive".into()));
        }
        if self.spokes_per_wheel == 0 {
            return Err(ConfigError::Invalid("spokes_per_wheel must be at least 1".into()));
        }
        if !(self.base_scroll_speed.is_finite() && self.base_scroll_speed >= 0.0) {
            return Err(ConfigError::Invalid("base_scroll_speed must be a non-negative number".into()));
        }
        if !(self.viewport_height > 0.0) {
            return Err(ConfigError::Invalid("viewport_height must be positive".into()));
        }

        let road_length = self.viewport_width - 2.0 * self.edge_margin;
        if !(self.edge_margin >= 0.0 && road_length > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "edge_margin {} leaves no road in a viewport {} wide",
                self.edge_margin, self.viewport_width
            )));
        }

        Ok(PlaybackConfig {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            left_edge: self.edge_margin,
            road_length,
            lane_y: self.viewport_height * 5.0 / 6.0,
            background_tiles: self.background_tiles,
            capacity: self.capacity,
            time_unit: Duration::from_millis(self.time_unit_ms),
            boot_delay: Duration::from_millis(self.boot_delay_ms),
            base_scroll_speed: self.base_scroll_speed,
            spokes_per_wheel: self.spokes_per_wheel,
        })
    }
}

/// Persistent UI preferences
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiSettings {
    pub last_dataset: Option<PathBuf>,
    pub last_segment: String,
    pub show_controls: bool,
}

impl UiSettings {
    fn settings_path() -> Option<PathBuf> {
        AppConfig::config_dir().map(|p| p.join("settings.json"))
    }

    pub fn load() -> Self {
        if let Some(path) = Self::settings_path() {
            if let Ok(contents) = fs::read_to_string(&path) {
                if let Ok(settings) = serde_json::from_str(&contents) {
                    return settings;
                }
            }
        }

        Self {
            show_controls: true,
            ..Default::default()
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!("failed to save settings to {}: {}", path.display(), e);
                }
            }
            Err(e) => warn!("failed to serialize settings: {}", e),
        }
    }
}
