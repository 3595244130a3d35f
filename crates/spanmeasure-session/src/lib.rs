//! # SpanMeasure Session
//!
//! The point-to-point measurement core:
//! - [`MeasurementSession`]: the point list and its state machine
//! - [`PreviewComputer`]: per-tick candidate segment while aiming
//! - [`PresentationFrame`]: everything a renderer needs, already formatted
//! - [`MeasurementLoop`]: the timer-driven task that ties a tracking
//!   provider, a session and a presentation sink together

pub mod outcome;
pub mod presentation;
pub mod preview;
pub mod runtime;
pub mod session;

pub use outcome::{MeasurementOutcome, MeasurementReport, MeasurementResult};
pub use presentation::{PresentationFrame, PresentationSink, PreviewLabel, SegmentLabel};
pub use preview::{Preview, PreviewComputer, PreviewUpdate};
pub use runtime::{LoopOptions, MeasurementHandle, MeasurementLoop, SessionSnapshot};
pub use session::{AddPoint, MeasurementSession, Segment, SessionOptions, MIN_FINISH_POINTS};
