//! # SpanMeasure
//!
//! Point-to-point distance measurement in tracked 3-D space:
//! - Place points by raycasting from a screen crosshair into the scene
//! - Live preview of the segment being aimed at
//! - Per-segment and total distances in millimeters or inches
//!
//! ## Architecture
//!
//! SpanMeasure is organized as a workspace with multiple crates:
//!
//! 1. **spanmeasure-core** - Geometry, units, errors, event bus
//! 2. **spanmeasure-tracking** - Tracking provider interface and a simulated provider
//! 3. **spanmeasure-session** - Session state machine, preview, measurement loop
//! 4. **spanmeasure-settings** - Configuration files
//! 5. **spanmeasure** - This crate: re-exports, logging and the demo binary

pub mod demo;

pub use spanmeasure_core::{
    format_distance, parse_distance, Error, EventBus, EventCategory,
    EventFilter, LengthUnit, LimitedReason, MeasureError, MeasureEvent, PointEvent, Result,
    SessionError, SessionEvent, SessionId, SessionState, TrackingEvent, TrackingState,
    WorldPoint,
};

pub use spanmeasure_tracking::{
    Pose, RaycastHit, ScreenPoint, SimulatedTracking, TrackingProvider, UnsupportedTracking,
};

pub use spanmeasure_session::{
    AddPoint, LoopOptions, MeasurementHandle, MeasurementLoop, MeasurementOutcome,
    MeasurementReport, MeasurementResult, MeasurementSession, PresentationFrame,
    PresentationSink, Preview, PreviewComputer, SessionOptions, SessionSnapshot,
};

pub use spanmeasure_settings::{default_config_path, Config, ConfigError, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Pick the format from `SPANMEASURE_LOG_FORMAT` (`json` or anything else)
    pub fn from_env() -> Self {
        match std::env::var("SPANMEASURE_LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output, pretty or JSON
/// - RUST_LOG environment variable support, INFO by default
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .json()
                    .with_current_span(false),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}
