//! Configuration for SpanMeasure
//!
//! Two sections:
//! - `session`: display unit and the raycast quality a point needs
//! - `tracking`: tick rate, crosshair position and raycast budget
//!
//! Stored as JSON or TOML, picked by file extension. Missing keys take their
//! defaults, so a file only needs the values it changes.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use spanmeasure_core::LengthUnit;
use spanmeasure_session::{LoopOptions, SessionOptions};
use spanmeasure_tracking::ScreenPoint;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest supported tick rate
pub const MAX_TICK_RATE_HZ: f64 = 240.0;

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Measurement session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Unit distances are shown in
    pub unit: LengthUnit,
    /// Minimum raycast quality for a point to be placed, 0.0..=1.0
    pub min_hit_quality: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let options = SessionOptions::default();
        Self {
            unit: options.unit,
            min_hit_quality: options.min_hit_quality,
        }
    }
}

/// Tracking loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Ticks per second
    pub tick_rate_hz: f64,
    /// Raycast budget; one tick when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raycast_timeout_ms: Option<u64>,
    /// Normalized screen point raycasts are fired from
    pub crosshair: ScreenPoint,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20.0,
            raycast_timeout_ms: None,
            crosshair: ScreenPoint::center(),
        }
    }
}

impl TrackingSettings {
    /// Time between ticks
    pub fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_rate_hz).unwrap_or(Duration::ZERO)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Session settings
    pub session: SessionSettings,
    /// Tracking settings
    pub tracking: TrackingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("(none)").to_string(),
            )),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Load from `path` if it exists, otherwise defaults
    ///
    /// A file that exists but is invalid is still an error.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let quality = self.session.min_hit_quality;
        if !(0.0..=1.0).contains(&quality) {
            return Err(ConfigError::out_of_range("session.min_hit_quality", quality));
        }

        let rate = self.tracking.tick_rate_hz;
        if !rate.is_finite() || rate <= 0.0 || rate > MAX_TICK_RATE_HZ {
            return Err(ConfigError::out_of_range("tracking.tick_rate_hz", rate));
        }

        if !self.tracking.crosshair.is_normalized() {
            return Err(ConfigError::out_of_range(
                "tracking.crosshair",
                self.tracking.crosshair,
            ));
        }

        if let Some(ms) = self.tracking.raycast_timeout_ms {
            let timeout = Duration::from_millis(ms);
            if timeout.is_zero() || timeout > self.tracking.tick_period() {
                return Err(ConfigError::out_of_range("tracking.raycast_timeout_ms", ms));
            }
        }

        Ok(())
    }

    /// Options for a new measurement session
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            unit: self.session.unit,
            min_hit_quality: self.session.min_hit_quality,
        }
    }

    /// Options for the measurement loop
    pub fn loop_options(&self) -> LoopOptions {
        let mut options = LoopOptions::from_tick_rate(self.tracking.tick_rate_hz);
        options.crosshair = self.tracking.crosshair;
        if let Some(ms) = self.tracking.raycast_timeout_ms {
            options.raycast_timeout = Duration::from_millis(ms);
        }
        options
    }
}

/// Platform config file location, e.g. `~/.config/spanmeasure/config.toml`
pub fn default_config_path() -> SettingsResult<PathBuf> {
    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no config or home directory".to_string())
        })?;
    path.push("spanmeasure");
    path.push(CONFIG_FILE_NAME);
    Ok(path)
}
