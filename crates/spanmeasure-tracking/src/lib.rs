//! # SpanMeasure Tracking
//!
//! The boundary to the platform's spatial tracking. A measurement session only
//! ever talks to a [`TrackingProvider`]; it never asks which platform is
//! behind it.
//!
//! Implementations:
//! - [`UnsupportedTracking`] for devices without spatial tracking
//! - [`SimulatedTracking`] a controllable provider for demos and tests
//!
//! Platform bindings implement the same trait outside this workspace.

pub mod provider;
pub mod simulated;
pub mod types;

pub use provider::{TrackingProvider, UnsupportedTracking};
pub use simulated::SimulatedTracking;
pub use types::{Pose, RaycastHit, ScreenPoint};

pub use spanmeasure_core::{LimitedReason, TrackingState};
