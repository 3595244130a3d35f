//! Data handed to the rendering layer
//!
//! A frame is a complete, self-contained description of what to draw. The
//! renderer redraws from it and does no distance arithmetic of its own.

use crate::preview::Preview;
use crate::session::MeasurementSession;
use serde::Serialize;
use spanmeasure_core::{format_distance, SessionId, SessionState, TrackingState, WorldPoint};

/// A committed segment with its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentLabel {
    /// Segment index
    pub index: usize,
    /// Segment start
    pub start: WorldPoint,
    /// Segment end
    pub end: WorldPoint,
    /// Label anchor
    pub midpoint: WorldPoint,
    /// Formatted length, e.g. `"152.4 mm"`
    pub label: String,
}

/// The preview segment with its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewLabel {
    /// Last placed point
    pub start: WorldPoint,
    /// Crosshair hit
    pub end: WorldPoint,
    /// Label anchor
    pub midpoint: WorldPoint,
    /// Formatted length
    pub label: String,
}

/// Everything the renderer needs for one update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationFrame {
    /// Session being drawn
    pub session: SessionId,
    /// Session state, for overlays such as "tap to place first point"
    pub state: SessionState,
    /// Provider tracking state, for "move your device slowly" style hints
    pub tracking: TrackingState,
    /// Committed point markers
    pub points: Vec<WorldPoint>,
    /// Committed segment lines and labels
    pub segments: Vec<SegmentLabel>,
    /// Preview line and label, absent when nothing usable is under the crosshair
    pub preview: Option<PreviewLabel>,
}

impl PresentationFrame {
    /// Build a frame from the session and the current preview
    pub fn build(
        session: &MeasurementSession,
        preview: Option<&Preview>,
        tracking: TrackingState,
    ) -> Self {
        let unit = session.unit();
        Self {
            session: session.id(),
            state: session.state(),
            tracking,
            points: session.points().to_vec(),
            segments: session
                .segments()
                .map(|segment| SegmentLabel {
                    index: segment.index,
                    start: segment.start,
                    end: segment.end,
                    midpoint: segment.midpoint(),
                    label: segment.label(unit),
                })
                .collect(),
            preview: preview.map(|p| PreviewLabel {
                start: p.anchor,
                end: p.target,
                midpoint: p.midpoint,
                label: format_distance(p.distance, unit),
            }),
        }
    }
}

/// Receiver of presentation frames
///
/// Implemented by the rendering adapter. Closures taking `&PresentationFrame`
/// work too.
pub trait PresentationSink: Send {
    /// Draw `frame`, replacing whatever was drawn before
    fn present(&mut self, frame: &PresentationFrame);
}

impl<F> PresentationSink for F
where
    F: FnMut(&PresentationFrame) + Send,
{
    fn present(&mut self, frame: &PresentationFrame) {
        self(frame)
    }
}
