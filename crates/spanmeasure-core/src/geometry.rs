//! World-space geometry
//!
//! Positions are expressed in meters in the coordinate frame established by the
//! tracking provider when the session started.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in world space (meters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate in meters
    pub x: f64,
    /// Y coordinate in meters
    pub y: f64,
    /// Z coordinate in meters
    pub z: f64,
}

impl WorldPoint {
    /// Create a new point from its coordinates in meters
    ///
    /// Coordinates are taken as given; sensor glitches can produce NaN, so
    /// check [`WorldPoint::is_finite`] before trusting one.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The world origin
    pub fn origin() -> Self {
        Self::default()
    }

    /// Whether every coordinate is a finite number
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to another point, in meters
    pub fn distance_to(&self, other: &WorldPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Point halfway between this point and `other`
    pub fn midpoint(&self, other: &WorldPoint) -> WorldPoint {
        WorldPoint {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
            z: (self.z + other.z) * 0.5,
        }
    }
}

impl fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.4} Y:{:.4} Z:{:.4}", self.x, self.y, self.z)
    }
}
