use glam::Vec3;

use crate::math::{planar, reflect};
use crate::physics::SweepQuery;

use super::{EncounterContext, Progress};

/// The object snaps onto its target once it is this close.
pub const OBJECT_SNAP_DISTANCE: f32 = 1.5;

const WALL_STANDOFF: f32 = 0.05;
const BOUNCE_DAMPING: f32 = 0.8;

/// Push the object onto a target zone while poison ticks away at the party.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPuzzle {
    pub target_zone: Vec3,
    pub poison_damage: i32,
    pub poison_interval: f32,
    pub poison_timer: f32,
}

impl ObjectPuzzle {
    pub fn new(target_zone: Vec3, poison_damage: i32, poison_interval: f32) -> Self {
        Self {
            target_zone,
            poison_damage,
            poison_interval,
            poison_timer: poison_interval,
        }
    }

    pub(super) fn update(&mut self, position: &mut Vec3, ctx: &mut EncounterContext<'_>) -> Progress {
        self.poison_timer -= ctx.dt;
        if self.poison_timer <= 0.0 {
            self.poison_timer = self.poison_interval;
            for player in ctx.players.iter_mut().filter(|p| p.is_alive()) {
                player.apply_damage(self.poison_damage);
            }
        }

        if planar(*position - self.target_zone).length() < OBJECT_SNAP_DISTANCE {
            *position = self.target_zone;
            return Progress::Completed;
        }
        Progress::Ongoing
    }
}

/// Pushes the object `force` units along `direction`. On wall contact the
/// remaining push bounces once off the wall, damped; if the bounce path is
/// blocked too the object stays at the first wall.
pub fn push_object(
    position: Vec3,
    direction: Vec3,
    force: f32,
    radius: f32,
    obstacles: &dyn SweepQuery,
) -> Vec3 {
    let direction = planar(direction).normalize_or_zero();
    let mut origin = position;
    origin.y = radius;
    if direction == Vec3::ZERO {
        return origin;
    }

    let mut resting = match obstacles.sweep_sphere(origin, radius, direction, force) {
        Some(hit) => {
            let to_wall = (hit.distance - WALL_STANDOFF).max(0.0);
            let at_wall = origin + direction * to_wall;

            let bounce = planar(reflect(direction, hit.normal)).normalize_or_zero();
            let remaining = (force - to_wall) * BOUNCE_DAMPING;
            let blocked = bounce == Vec3::ZERO
                || obstacles
                    .sweep_sphere(at_wall, radius, bounce, remaining)
                    .is_some();
            if blocked {
                at_wall
            } else {
                at_wall + bounce * remaining
            }
        }
        None => origin + direction * force,
    };

    resting.y = radius;
    resting
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::testing::{Harness, player_at};
    use crate::physics::testing::{HalfSpace, Walls};

    #[test]
    fn free_push_moves_full_force() {
        let p = push_object(Vec3::new(0.0, 0.0, 0.0), Vec3::Z, 2.0, 1.0, &Walls::default());
        assert!(p.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), 1e-5));
    }

    #[test]
    fn push_into_wall_bounces_off_normal() {
        // Wall at z = 2 facing -Z; the object reaches it after 1 unit.
        let walls = Walls(vec![HalfSpace::new(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z)]);
        let direction = Vec3::new(1.0, 0.0, 1.0).normalize();
        let p = push_object(Vec3::ZERO, direction, 3.0, 1.0, &walls);

        assert!(walls.0[0].penetration(p, 1.0) <= 1e-4);
        // Moved sideways past what the straight path allowed and came back off the wall.
        assert!(p.x > 1.5, "x = {}", p.x);
        assert!(p.z < 1.0, "z = {}", p.z);
    }

    #[test]
    fn blocked_bounce_stays_at_first_wall() {
        let walls = Walls(vec![
            HalfSpace::new(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z),
            HalfSpace::new(Vec3::new(0.0, 0.0, -1.5), Vec3::Z),
        ]);
        let p = push_object(Vec3::ZERO, Vec3::Z, 3.0, 1.0, &walls);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 1.0, 0.95), 1e-4), "{p}");
    }

    #[test]
    fn poison_ticks_on_interval() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::ZERO)]);
        let mut puzzle = ObjectPuzzle::new(Vec3::new(0.0, 0.0, 20.0), 1, 1.0);
        let mut position = Vec3::new(0.0, 1.0, 5.0);
        for _ in 0..4 {
            assert_eq!(puzzle.update(&mut position, &mut harness.ctx(0.5)), Progress::Ongoing);
        }
        assert_eq!(harness.players[0].health, harness.players[0].stats.max_health - 2);
    }

    #[test]
    fn snaps_when_close_to_target() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::ZERO)]);
        let target = Vec3::new(0.0, 0.0, 20.0);
        let mut puzzle = ObjectPuzzle::new(target, 1, 1.0);
        let mut position = Vec3::new(1.0, 1.0, 19.5);
        assert_eq!(puzzle.update(&mut position, &mut harness.ctx(0.1)), Progress::Completed);
        assert_eq!(position, target);
    }
}
