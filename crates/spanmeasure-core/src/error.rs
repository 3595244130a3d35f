//! Error handling for SpanMeasure
//!
//! Two layers of errors:
//! - `SessionError`: a command was rejected because it does not apply to the
//!   session's current state. These are harmless no-ops, returned as result
//!   codes and never surfaced to the end user.
//! - `MeasureError`: failures of the measurement runtime itself (missing
//!   tracking capability, stopped loop, bad configuration).
//!
//! All error types use `thiserror`.

use crate::state::SessionState;
use thiserror::Error;

/// A session command rejected for the current state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The command is not valid in the current session state
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in.
        state: SessionState,
    },

    /// Finishing needs at least one segment
    #[error("Need at least {required} points to finish, have {actual}")]
    NotEnoughPoints {
        /// Minimum number of points required.
        required: usize,
        /// Number of points currently placed.
        actual: usize,
    },

    /// Undo on an empty point list
    #[error("No points to undo")]
    NothingToUndo,
}

/// Measurement runtime error type
#[derive(Error, Debug, Clone)]
pub enum MeasureError {
    /// The platform cannot provide spatial tracking at all
    #[error("Spatial tracking is not supported on this device")]
    CapabilityAbsent,

    /// The measurement loop is no longer running
    #[error("Measurement loop stopped")]
    LoopStopped,

    /// A configuration value is unusable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

/// Main error type for SpanMeasure
#[derive(Error, Debug)]
pub enum Error {
    /// Session command rejected
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Measurement runtime error
    #[error(transparent)]
    Measure(#[from] MeasureError),
}

impl Error {
    /// Check if this is a rejected session command
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Session(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::InvalidState {
            operation: "undo",
            state: SessionState::Idle,
        };
        assert_eq!(err.to_string(), "Cannot undo while session is Idle");

        let err = SessionError::NotEnoughPoints {
            required: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Need at least 2 points to finish, have 1");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = SessionError::NothingToUndo.into();
        assert!(err.is_rejection());

        let err: Error = MeasureError::CapabilityAbsent.into();
        assert!(!err.is_rejection());
        assert_eq!(
            err.to_string(),
            "Spatial tracking is not supported on this device"
        );
    }
}
