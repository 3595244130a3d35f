//! Tracking provider interface

use crate::types::{Pose, RaycastHit, ScreenPoint};
use async_trait::async_trait;
use spanmeasure_core::TrackingState;

/// Spatial tracking capability
///
/// Implement this trait to feed a measurement session from a tracking
/// backend. The session queries the provider, it never mutates it; all
/// queries come from a single measurement task and never overlap.
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Human readable backend name, for logs
    fn name(&self) -> &str;

    /// Whether this device can do spatial tracking at all
    ///
    /// Checked once before a session is created.
    fn is_supported(&self) -> bool;

    /// Current pose estimation quality
    fn tracking_state(&self) -> TrackingState;

    /// Number of times tracking has lost its world frame since the provider
    /// was created
    ///
    /// Must increase every time the provider enters
    /// `Limited(Relocalizing)`, even if it has recovered again before anyone
    /// looked at [`TrackingProvider::tracking_state`]. Points placed before
    /// a change in this count are in a stale coordinate frame.
    fn tracking_resets(&self) -> u64;

    /// Current camera pose, if tracking has one
    async fn current_pose(&self) -> Option<Pose>;

    /// Cast a ray from `screen_point` into the scene
    ///
    /// Returns `None` when nothing was hit. May take a while; callers bound
    /// the wait themselves.
    async fn raycast(&self, screen_point: ScreenPoint) -> Option<RaycastHit>;
}

/// Provider for devices without spatial tracking
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedTracking;

impl UnsupportedTracking {
    /// Create the unsupported provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TrackingProvider for UnsupportedTracking {
    fn name(&self) -> &str {
        "unsupported"
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn tracking_state(&self) -> TrackingState {
        TrackingState::Unavailable
    }

    fn tracking_resets(&self) -> u64 {
        0
    }

    async fn current_pose(&self) -> Option<Pose> {
        None
    }

    async fn raycast(&self, _screen_point: ScreenPoint) -> Option<RaycastHit> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_provider() {
        let provider = UnsupportedTracking::new();
        assert!(!provider.is_supported());
        assert_eq!(provider.tracking_state(), TrackingState::Unavailable);
        assert_eq!(provider.tracking_resets(), 0);
        assert!(provider.current_pose().await.is_none());
        assert!(provider.raycast(ScreenPoint::center()).await.is_none());
    }

    #[test]
    fn test_provider_is_object_safe() {
        let provider: Box<dyn TrackingProvider> = Box::new(UnsupportedTracking);
        assert_eq!(provider.name(), "unsupported");
    }
}
