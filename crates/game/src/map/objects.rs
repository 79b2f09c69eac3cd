use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Static axis-aligned box the sweep oracle collides against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Obstacle {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }
}

/// Axis-aligned trigger volume and containment box of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl ArenaBounds {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y && d.z <= self.half_extents.z
    }

    /// Clamps x and z into the box shrunk by `inset`; height is untouched.
    pub fn clamp_planar(&self, point: Vec3, inset: f32) -> Vec3 {
        let clamp_axis = |value: f32, center: f32, half: f32| {
            let reach = (half - inset).max(0.0);
            value.clamp(center - reach, center + reach)
        };
        Vec3::new(
            clamp_axis(point.x, self.center.x, self.half_extents.x),
            point.y,
            clamp_axis(point.z, self.center.z, self.half_extents.z),
        )
    }
}
