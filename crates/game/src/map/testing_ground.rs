use glam::Vec3;

use super::level::{EncounterConfig, EncounterKindConfig, LevelConfig};
use super::objects::{ArenaBounds, Obstacle};

const CORRIDOR_HALF_WIDTH: f32 = 14.0;
const CORRIDOR_START: f32 = -6.0;
const CORRIDOR_END: f32 = 126.0;
const WALL_HEIGHT: f32 = 2.0;
const ARENA_HALF: Vec3 = Vec3::new(10.0, 5.0, 10.0);

/// Built-in level: a walled corridor running along +Z with four arenas in
/// a row, boss first and the beam puzzle last.
pub fn level() -> LevelConfig {
    let mut obstacles = Vec::new();
    add_corridor(&mut obstacles);

    let pillars = vec![
        Vec3::new(-4.5, 0.0, 82.0),
        Vec3::new(-1.5, 0.0, 84.0),
        Vec3::new(1.5, 0.0, 84.0),
        Vec3::new(4.5, 0.0, 82.0),
    ];
    for pillar in &pillars {
        obstacles.push(Obstacle::new(
            *pillar + Vec3::Y,
            Vec3::new(0.5, 1.5, 0.5),
        ));
    }

    obstacles.push(Obstacle::new(
        Vec3::new(5.0, 1.0, 50.0),
        Vec3::new(1.0, WALL_HEIGHT, 1.0),
    ));

    let encounters = vec![
        EncounterConfig {
            bounds: ArenaBounds::new(Vec3::new(0.0, 0.0, 22.0), ARENA_HALF),
            spawn_point: Vec3::new(0.0, 0.0, 24.0),
            kind: EncounterKindConfig::Boss {
                health: 0,
                projectile_count: 0,
                move_speed: 0.0,
                shoot_interval: 0.0,
            },
        },
        EncounterConfig {
            bounds: ArenaBounds::new(Vec3::new(0.0, 0.0, 50.0), ARENA_HALF),
            spawn_point: Vec3::new(0.0, 0.0, 47.0),
            kind: EncounterKindConfig::ObjectPuzzle {
                target_zone: Vec3::new(0.0, 0.0, 56.0),
                poison_damage: 1,
            },
        },
        EncounterConfig {
            bounds: ArenaBounds::new(Vec3::new(0.0, 0.0, 78.0), ARENA_HALF),
            spawn_point: Vec3::new(0.0, 0.0, 78.0),
            kind: EncounterKindConfig::SequencePuzzle { pillars },
        },
        EncounterConfig {
            bounds: ArenaBounds::new(Vec3::new(0.0, 0.0, 106.0), ARENA_HALF),
            spawn_point: Vec3::new(0.0, 0.0, 106.0),
            kind: EncounterKindConfig::TrackingPuzzle {
                plates: vec![
                    Vec3::new(-6.0, 0.0, 100.0),
                    Vec3::new(6.0, 0.0, 100.0),
                    Vec3::new(-6.0, 0.0, 112.0),
                    Vec3::new(6.0, 0.0, 112.0),
                ],
                beam_damage: 0,
            },
        },
    ];

    LevelConfig {
        spawn_origin: Vec3::ZERO,
        spawn_spacing: 3.0,
        obstacles,
        encounters,
    }
}

fn add_corridor(obstacles: &mut Vec<Obstacle>) {
    let mid_z = (CORRIDOR_START + CORRIDOR_END) / 2.0;
    let half_len = (CORRIDOR_END - CORRIDOR_START) / 2.0;

    for side in [-1.0, 1.0] {
        obstacles.push(Obstacle::new(
            Vec3::new(side * (CORRIDOR_HALF_WIDTH + 0.5), 1.0, mid_z),
            Vec3::new(0.5, WALL_HEIGHT, half_len + 1.0),
        ));
    }

    for z in [CORRIDOR_START - 0.5, CORRIDOR_END + 0.5] {
        obstacles.push(Obstacle::new(
            Vec3::new(0.0, 1.0, z),
            Vec3::new(CORRIDOR_HALF_WIDTH + 1.0, WALL_HEIGHT, 0.5),
        ));
    }
}
