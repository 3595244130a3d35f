//! Live preview of the segment being aimed at
//!
//! Derived every tick from the session's last point and the current raycast
//! sample. Never touches the session.

use crate::session::MeasurementSession;
use spanmeasure_core::{SessionState, WorldPoint};
use spanmeasure_tracking::RaycastHit;

/// Candidate segment from the last placed point to the crosshair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    /// Last placed point
    pub anchor: WorldPoint,
    /// Current raycast hit
    pub target: WorldPoint,
    /// Distance from anchor to target in meters
    pub distance: f64,
    /// Halfway point, for the label
    pub midpoint: WorldPoint,
}

impl Preview {
    /// Preview between two points
    pub fn between(anchor: WorldPoint, target: WorldPoint) -> Self {
        Self {
            anchor,
            target,
            distance: anchor.distance_to(&target),
            midpoint: anchor.midpoint(&target),
        }
    }
}

/// Whether presentation needs to hear about the preview this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewUpdate {
    /// Same as last published; nothing to redraw
    Unchanged,
    /// New candidate, or `None` to hide the preview
    Changed(Option<Preview>),
}

/// Per-tick preview derivation
///
/// Remembers only the last value it published.
#[derive(Debug, Clone, Default)]
pub struct PreviewComputer {
    last_published: Option<Option<Preview>>,
}

impl PreviewComputer {
    /// Create a computer that has published nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate for the current session and sample, if there is one
    ///
    /// Requires the session to be placing and the sample to pass the
    /// session's quality threshold.
    pub fn compute(session: &MeasurementSession, sample: Option<&RaycastHit>) -> Option<Preview> {
        if session.state() != SessionState::Placing {
            return None;
        }
        let anchor = session.last_point()?;
        let hit = session.usable_sample(sample)?;
        Some(Preview::between(anchor, hit.position))
    }

    /// Recompute and report whether the result differs from the last one
    pub fn update(
        &mut self,
        session: &MeasurementSession,
        sample: Option<&RaycastHit>,
    ) -> PreviewUpdate {
        let candidate = Self::compute(session, sample);
        if self.last_published == Some(candidate) {
            return PreviewUpdate::Unchanged;
        }
        self.last_published = Some(candidate);
        PreviewUpdate::Changed(candidate)
    }

    /// Last published candidate
    pub fn current(&self) -> Option<&Preview> {
        self.last_published.as_ref().and_then(|p| p.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;

    fn hit(x: f64, y: f64, z: f64) -> RaycastHit {
        RaycastHit::new(WorldPoint::new(x, y, z), 1.0, 1.0)
    }

    fn placing_session() -> MeasurementSession {
        let mut s = MeasurementSession::new(SessionOptions::default());
        s.add_point(Some(&hit(0.0, 0.0, 0.0))).unwrap();
        s
    }

    #[test]
    fn test_no_preview_when_idle() {
        let s = MeasurementSession::new(SessionOptions::default());
        assert!(PreviewComputer::compute(&s, Some(&hit(1.0, 0.0, 0.0))).is_none());
    }

    #[test]
    fn test_candidate_geometry() {
        let s = placing_session();
        let p = PreviewComputer::compute(&s, Some(&hit(0.0, 2.0, 0.0))).unwrap();
        assert_eq!(p.anchor, WorldPoint::origin());
        assert_eq!(p.target, WorldPoint::new(0.0, 2.0, 0.0));
        assert_eq!(p.distance, 2.0);
        assert_eq!(p.midpoint, WorldPoint::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_no_preview_without_usable_sample() {
        let s = placing_session();
        assert!(PreviewComputer::compute(&s, None).is_none());
        let weak = RaycastHit::new(WorldPoint::new(1.0, 0.0, 0.0), 0.1, 1.0);
        assert!(PreviewComputer::compute(&s, Some(&weak)).is_none());
    }

    #[test]
    fn test_update_suppresses_repeats() {
        let s = placing_session();
        let mut computer = PreviewComputer::new();
        let sample = hit(1.0, 0.0, 0.0);

        assert!(matches!(
            computer.update(&s, Some(&sample)),
            PreviewUpdate::Changed(Some(_))
        ));
        assert_eq!(computer.update(&s, Some(&sample)), PreviewUpdate::Unchanged);

        assert_eq!(computer.update(&s, None), PreviewUpdate::Changed(None));
        assert_eq!(computer.update(&s, None), PreviewUpdate::Unchanged);
        assert!(computer.current().is_none());
    }

    #[test]
    fn test_first_update_always_publishes() {
        let s = MeasurementSession::new(SessionOptions::default());
        let mut computer = PreviewComputer::new();
        assert_eq!(computer.update(&s, None), PreviewUpdate::Changed(None));
        assert_eq!(computer.update(&s, None), PreviewUpdate::Unchanged);
    }

    #[test]
    fn test_preview_never_mutates_session() {
        let s = placing_session();
        let mut computer = PreviewComputer::new();
        for i in 0..10 {
            computer.update(&s, Some(&hit(i as f64, 0.0, 0.0)));
        }
        assert_eq!(s.point_count(), 1);
        assert_eq!(s.state(), SessionState::Placing);
    }
}
