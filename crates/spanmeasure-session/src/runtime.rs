//! Measurement loop
//!
//! One tokio task owns the session. It ticks at a fixed rate, raycasting at
//! the crosshair to keep the live preview current, and it is also the only
//! consumer of the command queue. A tick and a command therefore never run at
//! the same time, and at most one raycast is outstanding.
//!
//! A raycast that has not returned by the end of its tick budget is abandoned
//! and that tick is skipped.

use crate::outcome::{MeasurementOutcome, MeasurementReport};
use crate::presentation::{PresentationFrame, PresentationSink};
use crate::preview::{PreviewComputer, PreviewUpdate};
use crate::session::{AddPoint, MeasurementSession, SessionOptions};
use spanmeasure_core::{
    Error, EventBus, MeasureError, MeasureEvent, PointEvent, Result, SessionError, SessionEvent,
    SessionId, SessionState, TrackingEvent, TrackingState, WorldPoint,
};
use spanmeasure_tracking::{RaycastHit, ScreenPoint, TrackingProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Timing and targeting for the measurement loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    /// Time between tracking ticks
    pub tick_period: Duration,
    /// Screen point the raycast is fired from
    pub crosshair: ScreenPoint,
    /// Longest a raycast may take before its tick is skipped.
    /// Clamped to `tick_period`.
    pub raycast_timeout: Duration,
    /// Commands that may wait in the queue
    pub command_capacity: usize,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self::from_tick_rate(20.0)
    }
}

impl LoopOptions {
    /// Options ticking `hz` times per second, raycast budget of one tick
    pub fn from_tick_rate(hz: f64) -> Self {
        let tick_period = Duration::try_from_secs_f64(1.0 / hz).unwrap_or(Duration::ZERO);
        Self {
            tick_period,
            crosshair: ScreenPoint::center(),
            raycast_timeout: tick_period,
            command_capacity: 32,
        }
    }

    fn validated(mut self) -> std::result::Result<Self, MeasureError> {
        if self.tick_period.is_zero() {
            return Err(MeasureError::InvalidConfig {
                reason: "tick period must be > 0".to_string(),
            });
        }
        if self.raycast_timeout.is_zero() {
            return Err(MeasureError::InvalidConfig {
                reason: "raycast timeout must be > 0".to_string(),
            });
        }
        if !self.crosshair.is_normalized() {
            return Err(MeasureError::InvalidConfig {
                reason: format!("crosshair {} is off screen", self.crosshair),
            });
        }
        if self.command_capacity == 0 {
            return Err(MeasureError::InvalidConfig {
                reason: "command capacity must be > 0".to_string(),
            });
        }
        if self.raycast_timeout > self.tick_period {
            tracing::debug!(
                "Raycast timeout {:?} clamped to tick period {:?}",
                self.raycast_timeout,
                self.tick_period
            );
            self.raycast_timeout = self.tick_period;
        }
        Ok(self)
    }
}

/// Read-only view of the session at one moment
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Session identifier
    pub session: SessionId,
    /// Session state
    pub state: SessionState,
    /// Last observed tracking state
    pub tracking: TrackingState,
    /// Placed points
    pub points: Vec<WorldPoint>,
    /// Segment lengths in meters
    pub segment_meters: Vec<f64>,
    /// Sum of segment lengths in meters
    pub total_meters: f64,
}

impl SessionSnapshot {
    fn capture(session: &MeasurementSession, tracking: TrackingState) -> Self {
        Self {
            session: session.id(),
            state: session.state(),
            tracking,
            points: session.points().to_vec(),
            segment_meters: session.segment_distances(),
            total_meters: session.total_distance(),
        }
    }

    /// Number of placed points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.segment_meters.len()
    }
}

type Reply<T> = oneshot::Sender<std::result::Result<T, SessionError>>;

enum Command {
    AddPoint(Reply<AddPoint>),
    Undo(Reply<WorldPoint>),
    Finish(Reply<MeasurementReport>),
    Cancel(Reply<()>),
    ResetTracking(Reply<usize>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Builder for a measurement loop
pub struct MeasurementLoop {
    provider: Arc<dyn TrackingProvider>,
    session_options: SessionOptions,
    options: LoopOptions,
    sink: Box<dyn PresentationSink>,
    events: Arc<EventBus>,
}

impl MeasurementLoop {
    /// Measure with `provider`, default options, no renderer and a private event bus
    pub fn new(provider: Arc<dyn TrackingProvider>) -> Self {
        Self {
            provider,
            session_options: SessionOptions::default(),
            options: LoopOptions::default(),
            sink: Box::new(|_: &PresentationFrame| {}),
            events: Arc::new(EventBus::new()),
        }
    }

    /// Set the session's unit and quality threshold
    pub fn session_options(mut self, options: SessionOptions) -> Self {
        self.session_options = options;
        self
    }

    /// Set tick rate, crosshair and raycast budget
    pub fn loop_options(mut self, options: LoopOptions) -> Self {
        self.options = options;
        self
    }

    /// Send presentation frames to `sink`
    pub fn sink(mut self, sink: impl PresentationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Publish session events on `events`
    pub fn event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    /// Start the loop on the current tokio runtime
    ///
    /// Fails with [`MeasureError::CapabilityAbsent`] when the provider cannot
    /// track at all; no session is created in that case.
    pub fn spawn(self) -> std::result::Result<MeasurementHandle, MeasureError> {
        if !self.provider.is_supported() {
            tracing::warn!(
                "Tracking provider '{}' does not support spatial tracking",
                self.provider.name()
            );
            return Err(MeasureError::CapabilityAbsent);
        }

        let quality = self.session_options.min_hit_quality;
        if !(0.0..=1.0).contains(&quality) {
            return Err(MeasureError::InvalidConfig {
                reason: format!("minimum hit quality {} outside 0..=1", quality),
            });
        }
        let options = self.options.validated()?;

        let session = MeasurementSession::new(self.session_options);
        let id = session.id();
        let (command_tx, command_rx) = mpsc::channel(options.command_capacity);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let worker = LoopWorker {
            tracking: self.provider.tracking_state(),
            resets: self.provider.tracking_resets(),
            provider: self.provider,
            options,
            session,
            preview: PreviewComputer::new(),
            sink: self.sink,
            events: self.events,
            last_sample: None,
            outcome: Some(outcome_tx),
        };
        let task = tokio::spawn(worker.run(command_rx));

        Ok(MeasurementHandle {
            session: id,
            commands: command_tx,
            pending_outcome: Some(outcome_rx),
            outcome: None,
            task: Some(task),
        })
    }
}

/// Caller side of a running measurement
///
/// Dropping the handle closes the command queue, which stops the loop.
pub struct MeasurementHandle {
    session: SessionId,
    commands: mpsc::Sender<Command>,
    pending_outcome: Option<oneshot::Receiver<MeasurementOutcome>>,
    outcome: Option<MeasurementOutcome>,
    task: Option<JoinHandle<()>>,
}

impl MeasurementHandle {
    /// Session identifier
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Whether the loop is still accepting commands
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Place a point at the crosshair
    pub async fn add_point(&self) -> Result<AddPoint> {
        self.request(Command::AddPoint).await
    }

    /// Remove the last point
    pub async fn undo(&self) -> Result<WorldPoint> {
        self.request(Command::Undo).await
    }

    /// Finish and get the formatted report
    pub async fn finish(&self) -> Result<MeasurementReport> {
        self.request(Command::Finish).await
    }

    /// Cancel the measurement
    pub async fn cancel(&self) -> Result<()> {
        self.request(Command::Cancel).await
    }

    /// Discard all points because the provider lost its world frame
    ///
    /// For platform bindings that learn about relocalization out of band; the
    /// loop already does this itself when the provider's tracking state
    /// collapses.
    pub async fn reset_tracking(&self) -> Result<usize> {
        self.request(Command::ResetTracking).await
    }

    /// Current session contents
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .await
            .map_err(|_| MeasureError::LoopStopped)?;
        Ok(rx.await.map_err(|_| MeasureError::LoopStopped)?)
    }

    /// Wait until the user finishes or cancels
    ///
    /// If the loop stops before either happens the outcome is `Cancelled`.
    pub async fn outcome(&mut self) -> MeasurementOutcome {
        if let Some(rx) = self.pending_outcome.take() {
            self.outcome = Some(rx.await.unwrap_or(MeasurementOutcome::Cancelled));
        }
        self.outcome.clone().unwrap_or(MeasurementOutcome::Cancelled)
    }

    /// Stop the loop and release the tracking provider
    ///
    /// Returns how the measurement ended.
    pub async fn shutdown(mut self) -> MeasurementOutcome {
        // Loop may already be gone; nothing to stop then.
        let _ = self.commands.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("{} measurement loop ended abnormally: {}", self.session, e);
            }
        }
        self.outcome().await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| MeasureError::LoopStopped)?;
        let reply = rx.await.map_err(|_| MeasureError::LoopStopped)?;
        reply.map_err(Error::from)
    }
}

impl std::fmt::Debug for MeasurementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementHandle")
            .field("session", &self.session)
            .field("running", &self.is_running())
            .field("outcome", &self.outcome)
            .finish()
    }
}

struct LoopWorker {
    provider: Arc<dyn TrackingProvider>,
    options: LoopOptions,
    session: MeasurementSession,
    preview: PreviewComputer,
    sink: Box<dyn PresentationSink>,
    events: Arc<EventBus>,
    tracking: TrackingState,
    resets: u64,
    last_sample: Option<RaycastHit>,
    outcome: Option<oneshot::Sender<MeasurementOutcome>>,
}

impl LoopWorker {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let id = self.session.id();
        let mut ticker = tokio::time::interval(self.options.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "{} measuring in {} with '{}' tracking every {:?}",
            id,
            self.session.unit(),
            self.provider.name(),
            self.options.tick_period
        );
        self.emit(MeasureEvent::Session(SessionEvent::Started {
            session: id,
            unit: self.session.unit(),
        }));
        self.present();

        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command).await,
                },
                _ = ticker.tick(), if !self.session.state().is_terminal() => self.tick().await,
            }
        }

        // Timer goes first; the provider is released when the worker drops.
        drop(ticker);
        tracing::info!("{} measurement loop stopped", id);
        self.emit(MeasureEvent::Session(SessionEvent::Stopped { session: id }));
    }

    async fn handle(&mut self, command: Command) {
        // commands act on the frame the provider is in now, not the one
        // seen at the last tick
        if self.observe_tracking() {
            self.refresh();
        }

        match command {
            Command::AddPoint(reply) => {
                let result = self.add_point().await;
                let _ = reply.send(result);
            }
            Command::Undo(reply) => {
                let result = self.undo();
                let _ = reply.send(result);
            }
            Command::Finish(reply) => {
                let result = self.finish();
                let _ = reply.send(result);
            }
            Command::Cancel(reply) => {
                let result = self.cancel();
                let _ = reply.send(result);
            }
            Command::ResetTracking(reply) => {
                let result = self.reset_tracking();
                if result.is_ok() {
                    self.refresh();
                }
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(SessionSnapshot::capture(&self.session, self.tracking));
            }
            Command::Shutdown => {}
        }
    }

    async fn tick(&mut self) {
        let mut dirty = self.observe_tracking();

        if self.session.state() == SessionState::Placing {
            match self.sample().await {
                Some(sample) => self.last_sample = sample,
                None => {
                    if dirty {
                        self.present();
                    }
                    return;
                }
            }
        } else {
            self.last_sample = None;
        }

        if let PreviewUpdate::Changed(_) =
            self.preview.update(&self.session, self.last_sample.as_ref())
        {
            dirty = true;
        }
        if dirty {
            self.present();
        }
    }

    /// Raycast at the crosshair within the tick budget.
    /// Outer `None`: the provider overran and the tick is skipped.
    async fn sample(&mut self) -> Option<Option<RaycastHit>> {
        if !self.tracking.is_usable() {
            return Some(None);
        }

        let provider = &self.provider;
        let crosshair = self.options.crosshair;
        let query = async {
            provider.current_pose().await?;
            provider.raycast(crosshair).await
        };

        match tokio::time::timeout(self.options.raycast_timeout, query).await {
            Ok(hit) => Some(hit),
            Err(_) => {
                tracing::trace!(
                    "{} raycast exceeded {:?}, tick skipped",
                    self.session.id(),
                    self.options.raycast_timeout
                );
                None
            }
        }
    }

    /// Pick up tracking changes since the last look; returns true when
    /// anything changed
    ///
    /// A collapse is detected from the provider's reset count, so one that
    /// started and ended between two looks still clears the points.
    fn observe_tracking(&mut self) -> bool {
        let id = self.session.id();
        let mut changed = false;

        let current = self.provider.tracking_state();
        if current != self.tracking {
            let previous = std::mem::replace(&mut self.tracking, current);
            tracing::info!("{} tracking {} -> {}", id, previous, current);
            self.emit(MeasureEvent::Tracking(TrackingEvent::StateChanged {
                session: id,
                from: previous,
                to: current,
            }));
            changed = true;
        }

        let resets = self.provider.tracking_resets();
        if resets != self.resets {
            tracing::debug!("{} tracking reset count {} -> {}", id, self.resets, resets);
            self.resets = resets;
            if let Err(e) = self.reset_tracking() {
                tracing::debug!("{} tracking reset skipped: {}", id, e);
            }
            self.refresh_preview();
            changed = true;
        }
        changed
    }

    async fn add_point(&mut self) -> std::result::Result<AddPoint, SessionError> {
        if self.session.state().is_terminal() {
            return self.session.add_point(None);
        }

        let Some(sample) = self.sample().await else {
            tracing::debug!("{} add point: raycast overran", self.session.id());
            return Ok(AddPoint::NotReady);
        };
        self.last_sample = sample;

        let outcome = self.session.add_point(sample.as_ref())?;
        match outcome {
            AddPoint::Committed { index } => {
                if let Some(position) = self.session.last_point() {
                    self.emit(MeasureEvent::Point(PointEvent::Added {
                        session: self.session.id(),
                        index,
                        position,
                    }));
                }
                self.refresh();
            }
            AddPoint::NotReady => {
                tracing::debug!("{} add point: not ready", self.session.id());
            }
        }
        Ok(outcome)
    }

    fn undo(&mut self) -> std::result::Result<WorldPoint, SessionError> {
        let position = self.session.undo()?;
        self.emit(MeasureEvent::Point(PointEvent::Undone {
            session: self.session.id(),
            index: self.session.point_count(),
            position,
        }));
        self.refresh();
        Ok(position)
    }

    fn finish(&mut self) -> std::result::Result<MeasurementReport, SessionError> {
        let result = self.session.finish()?;
        let report = result.report();

        self.emit(MeasureEvent::Session(SessionEvent::Finished {
            session: result.session,
            total_meters: result.total_meters,
            segment_count: result.segment_meters.len(),
        }));
        self.resolve(MeasurementOutcome::Measured(report.clone()));
        self.refresh();
        Ok(report)
    }

    fn cancel(&mut self) -> std::result::Result<(), SessionError> {
        self.session.cancel()?;
        self.emit(MeasureEvent::Session(SessionEvent::Cancelled {
            session: self.session.id(),
        }));
        self.resolve(MeasurementOutcome::Cancelled);
        self.refresh();
        Ok(())
    }

    fn reset_tracking(&mut self) -> std::result::Result<usize, SessionError> {
        let cleared = self.session.reset_tracking()?;
        self.last_sample = None;
        self.emit(MeasureEvent::Tracking(TrackingEvent::Reset {
            session: self.session.id(),
            cleared_points: cleared,
        }));
        Ok(cleared)
    }

    fn resolve(&mut self, outcome: MeasurementOutcome) {
        if let Some(tx) = self.outcome.take() {
            let _ = tx.send(outcome);
        }
    }

    fn refresh_preview(&mut self) {
        self.preview.update(&self.session, self.last_sample.as_ref());
    }

    /// Re-derive the preview after a mutation and redraw
    fn refresh(&mut self) {
        self.refresh_preview();
        self.present();
    }

    fn present(&mut self) {
        let frame = PresentationFrame::build(&self.session, self.preview.current(), self.tracking);
        self.sink.present(&frame);
    }

    fn emit(&self, event: MeasureEvent) {
        self.events.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_tick_at_20hz() {
        let options = LoopOptions::default();
        assert_eq!(options.tick_period, Duration::from_millis(50));
        assert_eq!(options.raycast_timeout, options.tick_period);
        assert_eq!(options.crosshair, ScreenPoint::center());
    }

    #[test]
    fn test_invalid_tick_rate() {
        let options = LoopOptions::from_tick_rate(0.0);
        assert!(matches!(
            options.validated(),
            Err(MeasureError::InvalidConfig { .. })
        ));
        assert!(LoopOptions::from_tick_rate(f64::NAN).validated().is_err());
    }

    #[test]
    fn test_raycast_timeout_clamped() {
        let options = LoopOptions {
            raycast_timeout: Duration::from_secs(5),
            ..LoopOptions::from_tick_rate(10.0)
        }
        .validated()
        .unwrap();
        assert_eq!(options.raycast_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_off_screen_crosshair_rejected() {
        let options = LoopOptions {
            crosshair: ScreenPoint::new(1.5, 0.5),
            ..Default::default()
        };
        assert!(options.validated().is_err());
    }
}
