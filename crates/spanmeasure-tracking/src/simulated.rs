//! Simulated tracking provider
//!
//! A provider whose scene is a single aim target controlled from outside.
//! Clones share state, so a test or demo keeps one clone to steer the
//! crosshair while the measurement loop owns another.

use crate::provider::TrackingProvider;
use crate::types::{Pose, RaycastHit, ScreenPoint};
use async_trait::async_trait;
use parking_lot::RwLock;
use spanmeasure_core::{LimitedReason, TrackingState, WorldPoint};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct SimulatedState {
    tracking: TrackingState,
    resets: u64,
    pose: Pose,
    aim: Option<WorldPoint>,
    quality: f32,
    latency: Duration,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            tracking: TrackingState::Normal,
            resets: 0,
            pose: Pose::default(),
            aim: None,
            quality: 1.0,
            latency: Duration::ZERO,
        }
    }
}

/// Controllable tracking provider
#[derive(Debug, Clone, Default)]
pub struct SimulatedTracking {
    state: Arc<RwLock<SimulatedState>>,
    raycasts: Arc<AtomicUsize>,
}

impl SimulatedTracking {
    /// Create a provider that is tracking normally with nothing under the crosshair
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `target` under the crosshair with the current hit quality
    pub fn aim_at(&self, target: WorldPoint) {
        self.state.write().aim = Some(target);
    }

    /// Put `target` under the crosshair with a specific hit quality
    pub fn aim_at_with_quality(&self, target: WorldPoint, quality: f32) {
        let mut state = self.state.write();
        state.aim = Some(target);
        state.quality = quality;
    }

    /// Aim at empty space; raycasts return no hit
    pub fn clear_aim(&self) {
        self.state.write().aim = None;
    }

    /// Set the quality reported for hits
    pub fn set_quality(&self, quality: f32) {
        self.state.write().quality = quality;
    }

    /// Move the camera
    pub fn set_pose(&self, pose: Pose) {
        self.state.write().pose = pose;
    }

    /// Delay every raycast by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.state.write().latency = latency;
    }

    /// Report a different tracking state
    pub fn set_tracking_state(&self, tracking: TrackingState) {
        let mut state = self.state.write();
        if state.tracking == tracking {
            return;
        }
        tracing::debug!("Simulated tracking {} -> {}", state.tracking, tracking);
        if tracking.is_collapse() {
            state.resets += 1;
        }
        state.tracking = tracking;
    }

    /// Lose tracking and start relocalizing
    pub fn collapse(&self) {
        self.set_tracking_state(TrackingState::Limited(LimitedReason::Relocalizing));
    }

    /// Return to normal tracking
    pub fn recover(&self) {
        self.set_tracking_state(TrackingState::Normal);
    }

    /// Number of raycasts served so far
    pub fn raycast_count(&self) -> usize {
        self.raycasts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackingProvider for SimulatedTracking {
    fn name(&self) -> &str {
        "simulated"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn tracking_state(&self) -> TrackingState {
        self.state.read().tracking
    }

    fn tracking_resets(&self) -> u64 {
        self.state.read().resets
    }

    async fn current_pose(&self) -> Option<Pose> {
        let state = self.state.read();
        match state.tracking {
            TrackingState::Unavailable => None,
            _ => Some(state.pose),
        }
    }

    async fn raycast(&self, screen_point: ScreenPoint) -> Option<RaycastHit> {
        self.raycasts.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.read().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if !screen_point.is_normalized() {
            return None;
        }

        let state = self.state.read().clone();
        if !state.tracking.is_usable() {
            return None;
        }

        state.aim.map(|target| {
            RaycastHit::new(
                target,
                state.quality,
                state.pose.position.distance_to(&target),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_aim_no_hit() {
        let sim = SimulatedTracking::new();
        assert!(sim.raycast(ScreenPoint::center()).await.is_none());
        assert_eq!(sim.raycast_count(), 1);
    }

    #[tokio::test]
    async fn test_aim_produces_hit() {
        let sim = SimulatedTracking::new();
        sim.set_pose(Pose::at(WorldPoint::new(0.0, 0.0, 2.0)));
        sim.aim_at_with_quality(WorldPoint::new(0.0, 0.0, 0.0), 0.8);

        let hit = sim.raycast(ScreenPoint::center()).await.unwrap();
        assert_eq!(hit.position, WorldPoint::origin());
        assert_eq!(hit.quality, 0.8);
        assert!((hit.distance - 2.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let sim = SimulatedTracking::new();
        let handle = sim.clone();
        handle.aim_at(WorldPoint::new(1.0, 0.0, 0.0));
        assert!(sim.raycast(ScreenPoint::center()).await.is_some());
        assert_eq!(handle.raycast_count(), 1);
    }

    #[tokio::test]
    async fn test_collapse_hides_hits() {
        let sim = SimulatedTracking::new();
        sim.aim_at(WorldPoint::origin());
        sim.collapse();
        assert!(sim.tracking_state().is_collapse());
        assert!(sim.raycast(ScreenPoint::center()).await.is_none());

        sim.recover();
        assert!(sim.raycast(ScreenPoint::center()).await.is_some());
    }

    #[test]
    fn test_collapse_counted_once_per_episode() {
        let sim = SimulatedTracking::new();
        assert_eq!(sim.tracking_resets(), 0);

        sim.collapse();
        sim.collapse();
        assert_eq!(sim.tracking_resets(), 1);

        // already over by the time anyone polls the state
        sim.recover();
        assert_eq!(sim.tracking_state(), TrackingState::Normal);
        assert_eq!(sim.tracking_resets(), 1);

        sim.set_tracking_state(TrackingState::Limited(LimitedReason::ExcessiveMotion));
        assert_eq!(sim.tracking_resets(), 1);
        sim.collapse();
        assert_eq!(sim.tracking_resets(), 2);
    }

    #[tokio::test]
    async fn test_off_screen_raycast() {
        let sim = SimulatedTracking::new();
        sim.aim_at(WorldPoint::origin());
        assert!(sim.raycast(ScreenPoint::new(2.0, 0.5)).await.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_has_no_pose() {
        let sim = SimulatedTracking::new();
        assert!(sim.current_pose().await.is_some());
        sim.set_tracking_state(TrackingState::Unavailable);
        assert!(sim.current_pose().await.is_none());
    }
}
