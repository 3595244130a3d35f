//! Event type definitions for the session event bus.
//!
//! Events are cloneable and serializable so they can be logged or replayed.

use serde::{Deserialize, Serialize};

use crate::geometry::WorldPoint;
use crate::state::{SessionId, TrackingState};
use crate::units::LengthUnit;

/// Root event enum for all measurement events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeasureEvent {
    /// Session lifecycle
    Session(SessionEvent),
    /// Point list changes
    Point(PointEvent),
    /// Tracking provider status
    Tracking(TrackingEvent),
}

impl MeasureEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            MeasureEvent::Session(_) => EventCategory::Session,
            MeasureEvent::Point(_) => EventCategory::Point,
            MeasureEvent::Tracking(_) => EventCategory::Tracking,
        }
    }

    /// The session this event belongs to
    pub fn session(&self) -> SessionId {
        match self {
            MeasureEvent::Session(e) => e.session(),
            MeasureEvent::Point(e) => e.session(),
            MeasureEvent::Tracking(e) => e.session(),
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            MeasureEvent::Session(e) => e.description(),
            MeasureEvent::Point(e) => e.description(),
            MeasureEvent::Tracking(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Session lifecycle events.
    Session,
    /// Point list events.
    Point,
    /// Tracking status events.
    Tracking,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Session => write!(f, "Session"),
            EventCategory::Point => write!(f, "Point"),
            EventCategory::Tracking => write!(f, "Tracking"),
        }
    }
}

/// Session lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Measurement loop started.
    Started {
        /// Session identifier.
        session: SessionId,
        /// Display unit for the whole session.
        unit: LengthUnit,
    },
    /// User finished the measurement.
    Finished {
        /// Session identifier.
        session: SessionId,
        /// Sum of all segment lengths in meters.
        total_meters: f64,
        /// Number of segments measured.
        segment_count: usize,
    },
    /// User cancelled the measurement.
    Cancelled {
        /// Session identifier.
        session: SessionId,
    },
    /// Measurement loop stopped and released the tracking provider.
    Stopped {
        /// Session identifier.
        session: SessionId,
    },
}

impl SessionEvent {
    fn session(&self) -> SessionId {
        match self {
            SessionEvent::Started { session, .. }
            | SessionEvent::Finished { session, .. }
            | SessionEvent::Cancelled { session }
            | SessionEvent::Stopped { session } => *session,
        }
    }

    fn description(&self) -> String {
        match self {
            SessionEvent::Started { session, unit } => {
                format!("{} started ({})", session, unit)
            }
            SessionEvent::Finished {
                session,
                total_meters,
                segment_count,
            } => format!(
                "{} finished: {:.4} m over {} segment(s)",
                session, total_meters, segment_count
            ),
            SessionEvent::Cancelled { session } => format!("{} cancelled", session),
            SessionEvent::Stopped { session } => format!("{} stopped", session),
        }
    }
}

/// Point list events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointEvent {
    /// A point was committed.
    Added {
        /// Session identifier.
        session: SessionId,
        /// Index of the new point.
        index: usize,
        /// World position of the new point.
        position: WorldPoint,
    },
    /// The last point was removed.
    Undone {
        /// Session identifier.
        session: SessionId,
        /// Index the removed point had.
        index: usize,
        /// World position of the removed point.
        position: WorldPoint,
    },
}

impl PointEvent {
    fn session(&self) -> SessionId {
        match self {
            PointEvent::Added { session, .. } | PointEvent::Undone { session, .. } => *session,
        }
    }

    fn description(&self) -> String {
        match self {
            PointEvent::Added {
                session,
                index,
                position,
            } => format!("{} point {} added at {}", session, index, position),
            PointEvent::Undone {
                session,
                index,
                position,
            } => format!("{} point {} undone at {}", session, index, position),
        }
    }
}

/// Tracking provider status events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackingEvent {
    /// The provider reported a different tracking state.
    StateChanged {
        /// Session identifier.
        session: SessionId,
        /// Previous state.
        from: TrackingState,
        /// New state.
        to: TrackingState,
    },
    /// Tracking collapsed and the session discarded its points.
    Reset {
        /// Session identifier.
        session: SessionId,
        /// Number of points discarded.
        cleared_points: usize,
    },
}

impl TrackingEvent {
    fn session(&self) -> SessionId {
        match self {
            TrackingEvent::StateChanged { session, .. } | TrackingEvent::Reset { session, .. } => {
                *session
            }
        }
    }

    fn description(&self) -> String {
        match self {
            TrackingEvent::StateChanged { session, from, to } => {
                format!("{} tracking {} -> {}", session, from, to)
            }
            TrackingEvent::Reset {
                session,
                cleared_points,
            } => format!(
                "{} tracking reset, {} point(s) cleared",
                session, cleared_points
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LimitedReason;

    #[test]
    fn test_categories() {
        let session = SessionId::new();
        let e = MeasureEvent::Session(SessionEvent::Cancelled { session });
        assert_eq!(e.category(), EventCategory::Session);
        assert_eq!(e.session(), session);

        let e = MeasureEvent::Point(PointEvent::Added {
            session,
            index: 0,
            position: WorldPoint::origin(),
        });
        assert_eq!(e.category(), EventCategory::Point);

        let e = MeasureEvent::Tracking(TrackingEvent::Reset {
            session,
            cleared_points: 3,
        });
        assert_eq!(e.category(), EventCategory::Tracking);
        assert!(e.description().ends_with("tracking reset, 3 point(s) cleared"));
    }

    #[test]
    fn test_serde_round_trip() {
        let event = MeasureEvent::Tracking(TrackingEvent::StateChanged {
            session: SessionId::new(),
            from: TrackingState::Normal,
            to: TrackingState::Limited(LimitedReason::Relocalizing),
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: MeasureEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
