//! Session and tracking state machines
//!
//! `SessionState` tracks the lifecycle of a measurement session.
//! `TrackingState` is what a tracking provider reports about its own pose
//! estimation quality.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one measurement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", &self.0.to_string()[..8])
    }
}

/// Measurement session lifecycle
///
/// `Idle` and `Placing` are live states. `Finished` and `Cancelled` are
/// terminal: once reached, no further command changes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No points placed yet
    Idle,
    /// At least one point placed; points can be added, undone or finished
    Placing,
    /// Measurement completed and its result returned
    Finished,
    /// User declined; no result
    Cancelled,
}

impl SessionState {
    /// Check if this state ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Finished | SessionState::Cancelled)
    }

    /// Check if a transition from this state to `target` is valid.
    ///
    /// - Idle goes to Placing (first point) or Cancelled
    /// - Placing goes back to Idle (undo of the last point, tracking reset),
    ///   to Finished, or to Cancelled
    /// - Terminal states never transition
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        if *self == target {
            return !self.is_terminal();
        }
        match (self, target) {
            (Finished | Cancelled, _) => false,
            (Idle, Placing | Cancelled) => true,
            (Idle, Finished) => false,
            (Placing, Idle | Finished | Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Placing => write!(f, "Placing"),
            SessionState::Finished => write!(f, "Finished"),
            SessionState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Why tracking is currently degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitedReason {
    /// Tracking is starting up and has not gathered enough data yet
    Initializing,
    /// Device is moving too fast for reliable tracking
    ExcessiveMotion,
    /// Not enough visual texture in view
    InsufficientFeatures,
    /// Tracking was lost and the provider is re-establishing its world frame.
    /// Points placed before this are no longer valid.
    Relocalizing,
}

impl fmt::Display for LimitedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitedReason::Initializing => write!(f, "initializing"),
            LimitedReason::ExcessiveMotion => write!(f, "excessive motion"),
            LimitedReason::InsufficientFeatures => write!(f, "insufficient features"),
            LimitedReason::Relocalizing => write!(f, "relocalizing"),
        }
    }
}

/// Pose estimation quality reported by a tracking provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    /// No pose available at all
    Unavailable,
    /// Pose available but degraded
    Limited(LimitedReason),
    /// Tracking normally
    Normal,
}

impl TrackingState {
    /// Whether this state requires discarding all placed points
    pub fn is_collapse(&self) -> bool {
        matches!(self, TrackingState::Limited(LimitedReason::Relocalizing))
    }

    /// Whether raycasts are expected to produce usable hits
    pub fn is_usable(&self) -> bool {
        !matches!(
            self,
            TrackingState::Unavailable | TrackingState::Limited(LimitedReason::Relocalizing)
        )
    }
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingState::Unavailable => write!(f, "Unavailable"),
            TrackingState::Limited(reason) => write!(f, "Limited ({})", reason),
            TrackingState::Normal => write!(f, "Normal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::Placing.is_terminal());
        assert!(SessionState::Finished.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
    }

    #[test]
    fn test_transitions() {
        use SessionState::*;
        assert!(Idle.can_transition_to(Placing));
        assert!(Idle.can_transition_to(Cancelled));
        assert!(!Idle.can_transition_to(Finished));
        assert!(Placing.can_transition_to(Idle));
        assert!(Placing.can_transition_to(Finished));
        assert!(Placing.can_transition_to(Placing));
        assert!(!Finished.can_transition_to(Idle));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_tracking_collapse() {
        assert!(TrackingState::Limited(LimitedReason::Relocalizing).is_collapse());
        assert!(!TrackingState::Limited(LimitedReason::ExcessiveMotion).is_collapse());
        assert!(!TrackingState::Normal.is_collapse());
        assert!(TrackingState::Limited(LimitedReason::ExcessiveMotion).is_usable());
        assert!(!TrackingState::Unavailable.is_usable());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        let s = id.to_string();
        assert!(s.starts_with("Session("));
        assert_eq!(s.len(), "Session(".len() + 8 + 1);
        assert_ne!(id, SessionId::new());
    }
}
