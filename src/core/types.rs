//! Core type definitions used throughout the codebase

use crate::core::lenient::lenient_f32;
use geo::{BoundingRect, LineString};
use serde::{Deserialize, Serialize};

pub use glam::Vec3;

/// Rotation about the vertical axis, in degrees
pub type YawDegrees = f32;

/// A point on the ground plane, as generators write it: `{"x": .., "z": ..}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundPoint {
    #[serde(default, deserialize_with = "lenient_f32")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub z: f32,
}

impl GroundPoint {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Distance on the XZ plane, ignoring height
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Axis-aligned extent of a set of ground points: `(min, max)`
pub fn ground_bounds(points: &[GroundPoint]) -> Option<(GroundPoint, GroundPoint)> {
    let line: LineString<f32> = points.iter().map(|p| (p.x, p.z)).collect::<Vec<_>>().into();
    let rect = line.bounding_rect()?;
    Some((
        GroundPoint::new(rect.min().x, rect.min().y),
        GroundPoint::new(rect.max().x, rect.max().y),
    ))
}
