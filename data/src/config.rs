pub mod color;

pub use color::sensor_color;

use enum_map::{Enum, EnumMap, enum_map};
use iced_core::Color;
use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "tracescope";
const CONFIG_FILE: &str = "config.json";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No configuration directory on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum ColorRole {
    Background,
    Grid,
    ZeroLine,
    Probe,
    Event,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swatch(#[serde(with = "color::hex")] pub Color);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub colors: EnumMap<ColorRole, Swatch>,
    pub viewport: ViewportConfig,
    pub fetch: FetchConfig,
    pub text_size: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colors: enum_map! {
                ColorRole::Background => Swatch(Color::from_rgb8(0, 30, 30)),
                ColorRole::Grid => Swatch(Color::from_rgb8(0, 60, 60)),
                ColorRole::ZeroLine => Swatch(Color::from_rgb8(255, 255, 0)),
                ColorRole::Probe => Swatch(Color::WHITE),
                ColorRole::Event => Swatch(Color::from_rgb8(255, 0, 0)),
                ColorRole::Text => Swatch(Color::WHITE),
            },
            viewport: ViewportConfig::default(),
            fetch: FetchConfig::default(),
            text_size: 12.0,
        }
    }
}

impl Config {
    pub fn color(&self, role: ColorRole) -> Color {
        self.colors[role].0
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs_next::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Loads the user config, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load_or_default() -> Self {
        let path = match Self::default_path() {
            Ok(path) => path,
            Err(err) => {
                log::warn!("{err}, using default config");
                return Self::default();
            }
        };

        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Failed to load {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Scale a fresh viewport starts with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub grid_square: f64,
    pub time_per_square: f64,
    pub value_per_square: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            grid_square: 64.0,
            time_per_square: 0.5,
            value_per_square: 1.0,
        }
    }
}

/// How long a frame waits on a data source before drawing cached data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub samples_timeout_ms: u64,
    pub events_timeout_ms: u64,
    /// Retry period while some cache is stale.
    pub retry_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            samples_timeout_ms: 10,
            events_timeout_ms: 1,
            retry_ms: 30,
        }
    }
}

impl FetchConfig {
    pub fn samples_timeout(&self) -> Duration {
        Duration::from_millis(self.samples_timeout_ms)
    }

    pub fn events_timeout(&self) -> Duration {
        Duration::from_millis(self.events_timeout_ms)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms.max(1))
    }
}

pub fn data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|dir| dir.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "fetch": { "samples_timeout_ms": 25 } }"#).unwrap();

        assert_eq!(config.fetch.samples_timeout(), Duration::from_millis(25));
        assert_eq!(config.fetch.events_timeout(), Duration::from_millis(1));
        assert_eq!(config.viewport, ViewportConfig::default());
        assert_eq!(config.color(ColorRole::Grid), Color::from_rgb8(0, 60, 60));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::default();
        config.colors[ColorRole::Probe] = Swatch(Color::from_rgb8(10, 20, 30));
        config.viewport.time_per_square = 2.0;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn bad_color_is_an_error() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{ "colors": { "Background": "teal" } }"#);
        assert!(result.is_err());
    }
}
