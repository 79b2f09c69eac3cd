use glam::Vec3;

use crate::math::planar;
use crate::physics::SweepQuery;

pub const PROJECTILE_RADIUS: f32 = 0.25;
/// Projectiles farther than this from the origin are dropped.
pub const DISTANCE_CAP: f32 = 200.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub position: Vec3,
    pub direction: Vec3,
    pub damage: i32,
    /// Firing player's slot; `None` for encounter-fired projectiles.
    pub owner_slot: Option<u8>,
}

impl Projectile {
    pub fn player(position: Vec3, direction: Vec3, damage: i32, owner_slot: u8) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            damage,
            owner_slot: Some(owner_slot),
        }
    }

    pub fn boss(position: Vec3, direction: Vec3, damage: i32) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            damage,
            owner_slot: None,
        }
    }

    /// Sweeps one step forward. Returns false when the step hits an obstacle,
    /// in which case the projectile stays where it was and should be removed.
    pub fn advance(&mut self, speed: f32, dt: f32, obstacles: &dyn SweepQuery) -> bool {
        let distance = speed * dt;
        if distance <= 0.0 || self.direction == Vec3::ZERO {
            return true;
        }
        if obstacles
            .sweep_sphere(self.position, PROJECTILE_RADIUS, self.direction, distance)
            .is_some()
        {
            return false;
        }
        self.position += self.direction * distance;
        true
    }

    pub fn planar_distance_to(&self, point: Vec3) -> f32 {
        planar(self.position - point).length()
    }

    pub fn is_out_of_range(&self) -> bool {
        self.position.length() > DISTANCE_CAP
    }

    pub fn to_wire(&self) -> [f32; 2] {
        [self.position.x, self.position.z]
    }
}
