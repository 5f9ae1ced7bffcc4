//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest listener buffer accepted from configuration (events).
pub const MAX_BUFFER_CAPACITY: usize = 1 << 20;

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sensor and tick settings.
    pub tracking: TrackingConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Which sensor driver backs the frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Synthetic hand orbiting inside the tracking volume.
    #[default]
    Simulated,
    /// Scripted driver that only delivers what it is given.
    Stub,
}

/// Which interaction strategy consumes frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Camera-relative object translation.
    #[default]
    ObjectMove,
    /// Raw sensor-space translation, ignoring the camera.
    SensorSpaceMove,
    /// Consume frames without touching the scene.
    Idle,
}

/// Sensor tracking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Capacity of the listener's event ring buffer.
    pub buffer_capacity: usize,

    /// Interval between scheduler ticks (ms).
    pub tick_interval_ms: u64,

    /// Scale applied to each camera axis contribution.
    pub move_scale: f64,

    /// Sensor driver.
    pub driver: DriverKind,

    /// Frame rate of the simulated driver (Hz).
    pub simulated_rate_hz: u32,

    /// Interaction strategy.
    pub strategy: StrategyKind,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "leapmove=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 500,
            tick_interval_ms: 100,
            move_scale: 10.0,
            driver: DriverKind::default(),
            simulated_rate_hz: 60,
            strategy: StrategyKind::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl TrackingConfig {
    /// Check values that would make the tracking loop meaningless.
    pub fn validate(&self) -> crate::error::LeapmoveResult<()> {
        if self.buffer_capacity == 0 {
            return Err(crate::error::LeapmoveError::config(
                "buffer_capacity must be at least 1",
            ));
        }
        if self.buffer_capacity > MAX_BUFFER_CAPACITY {
            return Err(crate::error::LeapmoveError::config(format!(
                "buffer_capacity must be at most {MAX_BUFFER_CAPACITY}"
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(crate::error::LeapmoveError::config(
                "tick_interval_ms must be at least 1",
            ));
        }
        if self.simulated_rate_hz == 0 {
            return Err(crate::error::LeapmoveError::config(
                "simulated_rate_hz must be at least 1",
            ));
        }
        if !self.move_scale.is_finite() {
            return Err(crate::error::LeapmoveError::config(
                "move_scale must be finite",
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("leapmove").join("config.json")
}
