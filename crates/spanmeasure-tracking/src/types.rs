//! Values exchanged with a tracking provider

use serde::{Deserialize, Serialize};
use spanmeasure_core::WorldPoint;
use std::fmt;

/// A point on the screen in normalized coordinates
///
/// (0, 0) is the top-left corner, (1, 1) the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal position, 0.0..=1.0
    pub x: f32,
    /// Vertical position, 0.0..=1.0
    pub y: f32,
}

impl ScreenPoint {
    /// Create a screen point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Screen center, where the crosshair sits
    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }

    /// Whether the point lies on screen
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl Default for ScreenPoint {
    fn default() -> Self {
        Self::center()
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Device pose in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Camera position in meters
    pub position: WorldPoint,
    /// Orientation quaternion as (x, y, z, w)
    pub orientation: [f64; 4],
}

impl Pose {
    /// Pose at `position` with no rotation
    pub fn at(position: WorldPoint) -> Self {
        Self {
            position,
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(WorldPoint::origin())
    }
}

/// Result of casting a ray from a screen point into the tracked scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    /// Intersection with the nearest real-world surface
    pub position: WorldPoint,
    /// Provider confidence in the hit, 0.0 (none) to 1.0 (certain)
    pub quality: f32,
    /// Distance from the camera to the hit, in meters
    pub distance: f64,
}

impl RaycastHit {
    /// Create a hit
    pub fn new(position: WorldPoint, quality: f32, distance: f64) -> Self {
        Self {
            position,
            quality,
            distance,
        }
    }

    /// Whether this hit is good enough to place a point or draw a preview
    pub fn is_acceptable(&self, min_quality: f32) -> bool {
        self.quality.is_finite() && self.quality >= min_quality && self.position.is_finite()
    }
}
