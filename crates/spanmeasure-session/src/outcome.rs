//! What a measurement hands back to its caller
//!
//! Inside the session everything stays in meters ([`MeasurementResult`]).
//! The caller receives display strings ([`MeasurementReport`]) wrapped in a
//! [`MeasurementOutcome`] that keeps "no result" distinct from a zero-length
//! measurement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spanmeasure_core::{format_distance, LengthUnit, SessionId, WorldPoint};
use std::fmt;

/// Raw result of a finished session, in meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    /// Session that produced the result
    pub session: SessionId,
    /// Display unit chosen for the session
    pub unit: LengthUnit,
    /// Sum of the raw segment lengths
    pub total_meters: f64,
    /// Segment lengths in placement order
    pub segment_meters: Vec<f64>,
    /// Points that were measured
    pub points: Vec<WorldPoint>,
    /// When the user finished
    pub finished_at: DateTime<Utc>,
}

impl MeasurementResult {
    /// Format every distance in the session's unit
    pub fn report(&self) -> MeasurementReport {
        MeasurementReport {
            total_distance: format_distance(self.total_meters, self.unit),
            unit: self.unit,
            segments: self
                .segment_meters
                .iter()
                .map(|m| format_distance(*m, self.unit))
                .collect(),
        }
    }
}

/// Finished measurement, formatted for the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementReport {
    /// Total length, e.g. `"78.74 in"`
    pub total_distance: String,
    /// Unit every string is expressed in
    pub unit: LengthUnit,
    /// Per-segment lengths, in placement order
    pub segments: Vec<String>,
}

impl fmt::Display for MeasurementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.total_distance)?;
        if self.segments.len() > 1 {
            write!(f, " ({})", self.segments.join(" + "))?;
        }
        Ok(())
    }
}

/// How a measurement request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementOutcome {
    /// The user finished a measurement
    Measured(MeasurementReport),
    /// The user backed out, or the view was dismissed first
    Cancelled,
    /// The device cannot track space; no session was started
    Unsupported,
}

impl MeasurementOutcome {
    /// Whether a measurement was produced
    pub fn is_measured(&self) -> bool {
        matches!(self, MeasurementOutcome::Measured(_))
    }

    /// The report, if a measurement was produced
    pub fn report(&self) -> Option<&MeasurementReport> {
        match self {
            MeasurementOutcome::Measured(report) => Some(report),
            _ => None,
        }
    }

    /// Total length string for the calling form, if any
    pub fn into_length_string(self) -> Option<String> {
        match self {
            MeasurementOutcome::Measured(report) => Some(report.total_distance),
            _ => None,
        }
    }
}
