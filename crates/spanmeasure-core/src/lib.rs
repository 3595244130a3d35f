//! # SpanMeasure Core
//!
//! Core types shared by every SpanMeasure crate:
//! world-space geometry, display units, session and tracking states,
//! error types and the session event bus.

pub mod error;
pub mod event_bus;
pub mod geometry;
pub mod state;
pub mod units;

pub use error::{Error, MeasureError, Result, SessionError};

pub use event_bus::{
    EventBus, EventCategory, EventFilter, MeasureEvent, PointEvent, SessionEvent, TrackingEvent,
};

pub use geometry::WorldPoint;
pub use state::{LimitedReason, SessionId, SessionState, TrackingState};
pub use units::{format_distance, parse_distance, LengthUnit};
