use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::controller::controller_handle::ControllerSettings;
use crate::controller::event_processor::ProcessorSettings;
use crate::navigation::focus::FocusOptions;
use crate::navigation::repeat::RepeatSettings;
use crate::navigation::NavSettings;

const APP_DIR: &str = "padnav";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    pub frame_interval_ms: u64,
    pub axis_threshold: f32,
    pub diagnostics_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            axis_threshold: 0.2,
            diagnostics_interval_ms: 200,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RepeatConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            interval_ms: 120,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub compact: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FullscreenConfig {
    pub confirm_from_pad: bool,
}

impl Default for FullscreenConfig {
    fn default() -> Self {
        Self {
            confirm_from_pad: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct NavigatorConfig {
    pub controller: ControllerConfig,
    pub repeat: RepeatConfig,
    pub layout: LayoutConfig,
    pub fullscreen: FullscreenConfig,
}

impl NavigatorConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    // Write the defaults if nothing is there yet
    pub fn ensure_default_config(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            debug!("Config found at {}", path.display());
            return Ok(());
        }
        info!("Writing default config to {}", path.display());
        Self::default().save(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "controller.frame_interval_ms must be positive".to_string(),
            ));
        }
        let threshold = self.controller.axis_threshold;
        if !(threshold > 0.0 && threshold <= 2.0) {
            return Err(ConfigError::Invalid(format!(
                "controller.axis_threshold {} outside (0, 2]",
                threshold
            )));
        }
        if self.repeat.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "repeat.interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            frame_interval_ms: self.controller.frame_interval_ms,
            ..ControllerSettings::default()
        }
    }

    pub fn nav_settings(&self) -> NavSettings {
        NavSettings {
            processor: ProcessorSettings {
                axis_threshold: self.controller.axis_threshold,
            },
            repeat: RepeatSettings {
                initial_delay: Duration::from_millis(self.repeat.initial_delay_ms),
                interval: Duration::from_millis(self.repeat.interval_ms),
            },
            diagnostics_interval: Duration::from_millis(self.controller.diagnostics_interval_ms),
            focus: FocusOptions {
                confirm_fullscreen_from_pad: self.fullscreen.confirm_from_pad,
            },
        }
    }
}
