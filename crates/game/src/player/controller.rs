use glam::Vec3;

use crate::math::{planar, project_on_plane, yaw_from_direction};
use crate::physics::SweepQuery;

use super::MatchPlayer;

/// Height of the swept sphere above the player's feet.
pub const SWEEP_HEIGHT: f32 = 1.0;
pub const SWEEP_RADIUS: f32 = 0.4;

const SKIN: f32 = 0.1;
const IDLE_PROBE: f32 = 0.1;
const CONTACT_OFFSET: f32 = 0.05;
const WALL_GAP: f32 = 0.01;
const MIN_MOVE_SQ: f32 = 1e-4;

/// Planar swept movement with a single slide pass.
pub struct PlayerController {
    move_speed: f32,
}

impl PlayerController {
    pub fn new(move_speed: f32) -> Self {
        Self { move_speed }
    }

    pub fn move_player(&self, player: &mut MatchPlayer, obstacles: &dyn SweepQuery, dt: f32) {
        player.position.y = 0.0;

        let movement = planar(player.move_input) * self.move_speed * dt;
        let moving = movement.length_squared() > MIN_MOVE_SQ;

        let (direction, distance) = if moving {
            (movement.normalize(), movement.length())
        } else {
            (player.forward(), IDLE_PROBE)
        };

        let origin = player.position + Vec3::Y * SWEEP_HEIGHT;
        match obstacles.sweep_sphere(origin, SWEEP_RADIUS, direction, distance + SKIN) {
            Some(hit) => {
                if hit.distance < CONTACT_OFFSET {
                    let push_out = planar(hit.normal * (CONTACT_OFFSET - hit.distance));
                    player.position += push_out;
                }

                if moving {
                    let advance = (hit.distance - WALL_GAP).max(0.0).min(distance);
                    player.position += direction * advance;

                    let slide = planar(project_on_plane(movement, hit.normal));
                    if slide.length_squared() > MIN_MOVE_SQ {
                        let slide_origin = player.position + Vec3::Y * SWEEP_HEIGHT;
                        let blocked = obstacles
                            .sweep_sphere(
                                slide_origin,
                                SWEEP_RADIUS,
                                slide.normalize(),
                                slide.length() + SKIN,
                            )
                            .is_some();
                        if !blocked {
                            player.position += slide;
                        }
                    }
                }
            }
            None if moving => player.position += movement,
            None => {}
        }

        player.position.y = 0.0;

        let look = planar(player.aim - player.position);
        if look.length_squared() > 1e-6 {
            player.yaw = yaw_from_direction(look);
        }
    }
}

/// Moves `position` by `push`, stopping just short of any obstacle on the way.
pub fn try_push(position: Vec3, push: Vec3, obstacles: &dyn SweepQuery) -> Vec3 {
    let distance = push.length();
    if distance <= f32::EPSILON {
        return position;
    }
    let direction = push / distance;
    let origin = position + Vec3::Y * SWEEP_HEIGHT;
    match obstacles.sweep_sphere(origin, SWEEP_RADIUS, direction, distance + SKIN) {
        Some(hit) => position + direction * (hit.distance - WALL_GAP).max(0.0).min(distance),
        None => position + push,
    }
}

/// Pushes overlapping living players apart, half the overlap each.
pub fn separate_players(players: &mut [MatchPlayer], radius: f32, obstacles: &dyn SweepQuery) {
    let min_distance = radius * 2.0;

    for i in 0..players.len() {
        for j in (i + 1)..players.len() {
            if players[i].dead || players[j].dead {
                continue;
            }

            let offset = planar(players[i].position - players[j].position);
            let distance = offset.length();
            if distance >= min_distance {
                continue;
            }

            let direction = if distance > f32::EPSILON {
                offset / distance
            } else {
                Vec3::X
            };
            let push = direction * (min_distance - distance) * 0.5;

            players[i].position = try_push(players[i].position, push, obstacles);
            players[j].position = try_push(players[j].position, -push, obstacles);
        }
    }
}
