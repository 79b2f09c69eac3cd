use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::objects::{ArenaBounds, Obstacle};
use super::testing_ground;

/// Per-kind setup of one encounter. Zero-valued overrides fall back to the
/// balance defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncounterKindConfig {
    Boss {
        #[serde(default)]
        health: i32,
        #[serde(default)]
        projectile_count: u32,
        #[serde(default)]
        move_speed: f32,
        #[serde(default)]
        shoot_interval: f32,
    },
    ObjectPuzzle {
        target_zone: Vec3,
        #[serde(default = "default_poison_damage")]
        poison_damage: i32,
    },
    SequencePuzzle {
        pillars: Vec<Vec3>,
    },
    TrackingPuzzle {
        plates: Vec<Vec3>,
        #[serde(default)]
        beam_damage: i32,
    },
}

fn default_poison_damage() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    pub bounds: ArenaBounds,
    pub spawn_point: Vec3,
    pub kind: EncounterKindConfig,
}

/// Static level layout: obstacles, spawn line, and the ordered encounter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub spawn_origin: Vec3,
    pub spawn_spacing: f32,
    pub obstacles: Vec<Obstacle>,
    pub encounters: Vec<EncounterConfig>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        testing_ground::level()
    }
}

impl LevelConfig {
    /// Slot `s` spawns at origin + ((s - 1.5) * spacing, 0, 0).
    pub fn spawn_position(&self, slot: u8) -> Vec3 {
        self.spawn_origin + Vec3::new((f32::from(slot) - 1.5) * self.spawn_spacing, 0.0, 0.0)
    }
}
