//! Measurement session state machine
//!
//! The session owns the ordered list of placed points. Segments and totals are
//! always derived from that list on demand, so they cannot go stale.
//!
//! ```text
//!   Idle --add--> Placing --finish (>= 2 points)--> Finished
//!    ^              |  ^
//!    +--undo last---+  +--add / undo
//!    +--reset tracking (any live state)
//!   Idle | Placing --cancel--> Cancelled
//! ```
//!
//! Commands that do not apply to the current state are rejected with a
//! [`SessionError`] and leave the session untouched.

use crate::outcome::MeasurementResult;
use serde::{Deserialize, Serialize};
use spanmeasure_core::{
    format_distance, LengthUnit, SessionError, SessionId, SessionState, WorldPoint,
};
use spanmeasure_tracking::RaycastHit;

/// Points needed before a session can finish
pub const MIN_FINISH_POINTS: usize = 2;

/// Per-session settings, fixed for the session's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Display unit for labels and the final report
    pub unit: LengthUnit,
    /// Minimum raycast quality accepted for placing points and previewing
    pub min_hit_quality: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            unit: LengthUnit::Millimeters,
            min_hit_quality: 0.5,
        }
    }
}

/// Two consecutive points, derived from the point list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Position in the segment list (segment i joins points i and i + 1)
    pub index: usize,
    /// Earlier point
    pub start: WorldPoint,
    /// Later point
    pub end: WorldPoint,
}

impl Segment {
    /// Length in meters
    pub fn distance(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Where the floating label goes
    pub fn midpoint(&self) -> WorldPoint {
        self.start.midpoint(&self.end)
    }

    /// Length formatted for display
    pub fn label(&self, unit: LengthUnit) -> String {
        format_distance(self.distance(), unit)
    }
}

/// Result of an accepted add-point command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPoint {
    /// A point was appended at `index`
    Committed {
        /// Index of the new point
        index: usize,
    },
    /// No usable raycast sample this tick; nothing changed
    NotReady,
}

impl AddPoint {
    /// Whether a point was appended
    pub fn is_committed(&self) -> bool {
        matches!(self, AddPoint::Committed { .. })
    }
}

/// A point-to-point measurement
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    id: SessionId,
    options: SessionOptions,
    state: SessionState,
    points: Vec<WorldPoint>,
}

impl MeasurementSession {
    /// Create an idle session
    pub fn new(options: SessionOptions) -> Self {
        Self::with_id(SessionId::new(), options)
    }

    /// Create an idle session with a known id
    pub fn with_id(id: SessionId, options: SessionOptions) -> Self {
        Self {
            id,
            options,
            state: SessionState::Idle,
            points: Vec::new(),
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Options the session was created with
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Display unit
    pub fn unit(&self) -> LengthUnit {
        self.options.unit
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Placed points, in placement order
    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    /// Number of placed points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of segments, always `max(0, point_count - 1)`
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Most recently placed point
    pub fn last_point(&self) -> Option<WorldPoint> {
        self.points.last().copied()
    }

    /// Segments between consecutive points
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points
            .windows(2)
            .enumerate()
            .map(|(index, pair)| Segment {
                index,
                start: pair[0],
                end: pair[1],
            })
    }

    /// Per-segment lengths in meters
    pub fn segment_distances(&self) -> Vec<f64> {
        self.segments().map(|s| s.distance()).collect()
    }

    /// Sum of all segment lengths in meters, unrounded
    pub fn total_distance(&self) -> f64 {
        self.segments().map(|s| s.distance()).sum()
    }

    /// Return the sample if it is good enough to use this session
    pub fn usable_sample<'a>(&self, sample: Option<&'a RaycastHit>) -> Option<&'a RaycastHit> {
        sample.filter(|hit| hit.is_acceptable(self.options.min_hit_quality))
    }

    /// Commit the sampled position as the next point
    ///
    /// A missing or low-quality sample is reported as [`AddPoint::NotReady`].
    /// Points are never de-duplicated: a sample on top of the last point
    /// still adds a (near) zero-length segment.
    pub fn add_point(&mut self, sample: Option<&RaycastHit>) -> Result<AddPoint, SessionError> {
        self.require_transition("add a point", SessionState::Placing)?;

        let Some(hit) = self.usable_sample(sample) else {
            tracing::trace!("{} add point: no usable sample", self.id);
            return Ok(AddPoint::NotReady);
        };

        let index = self.points.len();
        self.points.push(hit.position);
        self.state = SessionState::Placing;
        tracing::debug!("{} point {} placed at {}", self.id, index, hit.position);

        Ok(AddPoint::Committed { index })
    }

    /// Remove the most recently placed point
    ///
    /// Returns the removed point. Removing the only point returns to `Idle`.
    pub fn undo(&mut self) -> Result<WorldPoint, SessionError> {
        let target = if self.points.len() > 1 {
            SessionState::Placing
        } else {
            SessionState::Idle
        };
        self.require_transition("undo", target)?;

        let removed = self.points.pop().ok_or(SessionError::NothingToUndo)?;
        self.state = target;
        tracing::debug!("{} undid point {} at {}", self.id, self.points.len(), removed);

        Ok(removed)
    }

    /// Complete the measurement
    ///
    /// Needs at least [`MIN_FINISH_POINTS`] points. Distances in the result
    /// are raw meters; format them with [`MeasurementResult::report`].
    pub fn finish(&mut self) -> Result<MeasurementResult, SessionError> {
        if self.points.len() < MIN_FINISH_POINTS && !self.state.is_terminal() {
            return Err(SessionError::NotEnoughPoints {
                required: MIN_FINISH_POINTS,
                actual: self.points.len(),
            });
        }

        self.require_transition("finish", SessionState::Finished)?;

        let segment_meters = self.segment_distances();
        let total_meters = segment_meters.iter().sum();
        self.state = SessionState::Finished;

        tracing::info!(
            "{} finished: {} over {} segment(s)",
            self.id,
            format_distance(total_meters, self.options.unit),
            segment_meters.len()
        );

        Ok(MeasurementResult {
            session: self.id,
            unit: self.options.unit,
            total_meters,
            segment_meters,
            points: self.points.clone(),
            finished_at: chrono::Utc::now(),
        })
    }

    /// Abandon the measurement and discard all points
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.require_transition("cancel", SessionState::Cancelled)?;

        self.points.clear();
        self.state = SessionState::Cancelled;
        tracing::info!("{} cancelled", self.id);
        Ok(())
    }

    /// Discard all points after the tracking provider lost its world frame
    ///
    /// Returns the number of points cleared. The session stays usable.
    pub fn reset_tracking(&mut self) -> Result<usize, SessionError> {
        self.require_transition("reset tracking", SessionState::Idle)?;

        let cleared = self.points.len();
        self.points.clear();
        self.state = SessionState::Idle;
        tracing::warn!("{} tracking reset, {} point(s) cleared", self.id, cleared);
        Ok(cleared)
    }

    fn require_transition(
        &self,
        operation: &'static str,
        target: SessionState,
    ) -> Result<(), SessionError> {
        if !self.state.can_transition_to(target) {
            tracing::debug!("{} rejected {}: session is {}", self.id, operation, self.state);
            return Err(SessionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}
