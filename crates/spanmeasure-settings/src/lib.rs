//! SpanMeasure Settings Crate
//!
//! Loads, validates and saves the measurement configuration, and turns it
//! into the option structs the session crate consumes.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, Config, SessionSettings, TrackingSettings, CONFIG_FILE_NAME,
    MAX_TICK_RATE_HZ,
};
pub use error::{ConfigError, SettingsError, SettingsResult};
