use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::calibrator::AXIS_TRAVEL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    pub x_channel: u8,          // ADC channel of the X axis
    pub y_channel: u8,          // ADC channel of the Y axis
    pub travel_threshold: u16,  // Minimum max - min per axis
    pub center_duration_ms: u64,
    pub extent_duration_ms: u64,
    pub max_extent_attempts: u32,
    pub output_min: i32,
    pub output_max: i32,
    pub points_path: PathBuf,   // Where calibration extremes are stored
    pub button_pin: Option<u8>, // Hold at startup to force recalibration
    pub websocket_addr: Option<String>,
    pub period_ms: u64,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        JoystickConfig {
            x_channel: 6,
            y_channel: 7,
            travel_threshold: AXIS_TRAVEL,
            center_duration_ms: 2000,
            extent_duration_ms: 5000,
            max_extent_attempts: 3,
            output_min: 1000,
            output_max: 2000,
            points_path: PathBuf::from("calibration.json"),
            button_pin: Some(25),
            websocket_addr: Some(String::from("0.0.0.0:10013")),
            period_ms: 40,
        }
    }
}

impl JoystickConfig {
    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn center_duration(&self) -> Duration {
        Duration::from_millis(self.center_duration_ms)
    }

    pub fn extent_duration(&self) -> Duration {
        Duration::from_millis(self.extent_duration_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}
