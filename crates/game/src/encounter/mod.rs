//! Encounter state machines. An [`Encounter`] carries the fields every kind
//! shares; the kind-specific state lives in [`EncounterKind`].

mod boss;
mod object_puzzle;
mod sequence;
mod tracking;

use glam::Vec3;
use rand::rngs::StdRng;

use crate::map::{ArenaBounds, EncounterConfig, EncounterKindConfig};
use crate::net::{EncounterDetail, EncounterState};
use crate::physics::SweepQuery;
use crate::player::{BalanceConfig, MatchPlayer};
use crate::simulation::Projectile;

pub use boss::{BOSS_CONTACT_RANGE, BOSS_HIT_RADIUS, Boss};
pub use object_puzzle::{OBJECT_SNAP_DISTANCE, ObjectPuzzle, push_object};
pub use sequence::{
    FAIL_PHASE_DURATION, PILLAR_COUNT, SequencePhase, SequencePuzzle, StrikeOutcome,
};
pub use tracking::{Beam, PLATE_RADIUS, Plate, TrackingPuzzle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Ongoing,
    Completed,
}

/// Everything an encounter may touch while it updates.
pub struct EncounterContext<'a> {
    pub players: &'a mut [MatchPlayer],
    pub boss_projectiles: &'a mut Vec<Projectile>,
    pub balance: &'a BalanceConfig,
    pub obstacles: &'a dyn SweepQuery,
    pub rng: &'a mut StdRng,
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub enum EncounterKind {
    Boss(Boss),
    ObjectPuzzle(ObjectPuzzle),
    SequencePuzzle(SequencePuzzle),
    TrackingPuzzle(TrackingPuzzle),
}

impl EncounterKind {
    pub fn name(&self) -> &'static str {
        match self {
            EncounterKind::Boss(_) => "boss",
            EncounterKind::ObjectPuzzle(_) => "object puzzle",
            EncounterKind::SequencePuzzle(_) => "sequence puzzle",
            EncounterKind::TrackingPuzzle(_) => "tracking puzzle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Encounter {
    pub id: usize,
    pub bounds: ArenaBounds,
    pub position: Vec3,
    pub yaw: f32,
    pub active: bool,
    pub completed: bool,
    pub kind: EncounterKind,
}

impl Encounter {
    pub fn from_config(
        id: usize,
        config: &EncounterConfig,
        balance: &BalanceConfig,
        player_slots: &[u8],
    ) -> Self {
        let kind = match &config.kind {
            EncounterKindConfig::Boss {
                health,
                projectile_count,
                move_speed,
                shoot_interval,
            } => EncounterKind::Boss(Boss::new(
                override_or(*health, balance.boss_health),
                override_or(*move_speed, balance.boss_move_speed),
                override_or(*shoot_interval, balance.boss_shoot_interval),
                override_or(*projectile_count, balance.boss_projectile_count),
            )),
            EncounterKindConfig::ObjectPuzzle {
                target_zone,
                poison_damage,
            } => EncounterKind::ObjectPuzzle(ObjectPuzzle::new(
                *target_zone,
                *poison_damage,
                balance.poison_interval,
            )),
            EncounterKindConfig::SequencePuzzle { pillars } => EncounterKind::SequencePuzzle(
                SequencePuzzle::new(pillars.clone(), balance.sequence_show_interval),
            ),
            EncounterKindConfig::TrackingPuzzle {
                plates,
                beam_damage,
            } => EncounterKind::TrackingPuzzle(TrackingPuzzle::new(
                plates,
                player_slots,
                override_or(*beam_damage, balance.beam_damage),
            )),
        };

        Self {
            id,
            bounds: config.bounds,
            position: config.spawn_point,
            yaw: 0.0,
            active: false,
            completed: false,
            kind,
        }
    }

    /// Runs one tick of the kind-specific behaviour. The caller completes the
    /// encounter when this reports [`Progress::Completed`].
    pub fn update(&mut self, ctx: &mut EncounterContext<'_>) -> Progress {
        if self.completed {
            return Progress::Completed;
        }
        match &mut self.kind {
            EncounterKind::Boss(boss) => boss.update(&mut self.position, &mut self.yaw, ctx),
            EncounterKind::ObjectPuzzle(puzzle) => puzzle.update(&mut self.position, ctx),
            EncounterKind::SequencePuzzle(puzzle) => {
                puzzle.update(ctx);
                Progress::Ongoing
            }
            EncounterKind::TrackingPuzzle(puzzle) => puzzle.update(self.position, ctx),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Terminal transition. A boss is additionally marked defeated and the
    /// pushable object comes to rest on its target.
    pub fn complete(&mut self) {
        self.active = false;
        self.completed = true;
        match &mut self.kind {
            EncounterKind::Boss(boss) => boss.defeated = true,
            EncounterKind::ObjectPuzzle(puzzle) => self.position = puzzle.target_zone,
            _ => {}
        }
    }

    pub fn is_defeated(&self) -> bool {
        matches!(&self.kind, EncounterKind::Boss(boss) if boss.defeated)
    }

    pub fn boss_mut(&mut self) -> Option<&mut Boss> {
        match &mut self.kind {
            EncounterKind::Boss(boss) => Some(boss),
            _ => None,
        }
    }

    pub fn to_wire(&self) -> EncounterState {
        let detail = match &self.kind {
            EncounterKind::Boss(boss) => EncounterDetail::Boss {
                health: boss.health,
                max_health: boss.max_health,
            },
            EncounterKind::ObjectPuzzle(_) => EncounterDetail::ObjectPuzzle,
            EncounterKind::SequencePuzzle(puzzle) => EncounterDetail::SequencePuzzle {
                phase: puzzle.phase.wire_code(),
                streak: puzzle.streak as i32,
                timer: puzzle.timer,
                reveal_index: puzzle.reveal_index(),
            },
            EncounterKind::TrackingPuzzle(puzzle) => EncounterDetail::TrackingPuzzle {
                beam_angles: puzzle.beam_angles(),
                plates: puzzle.plates.iter().map(Plate::to_wire).collect(),
            },
        };

        EncounterState {
            id: self.id as i32,
            completed: self.completed,
            x: self.position.x,
            z: self.position.z,
            rotation_y: self.yaw,
            detail,
        }
    }
}

/// Level overrides of zero (or less) mean "use the balance default".
fn override_or<T: PartialOrd + Default>(value: T, fallback: T) -> T {
    if value > T::default() { value } else { fallback }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::LevelConfig;

    #[test]
    fn zero_overrides_fall_back_to_balance() {
        let balance = BalanceConfig::default();
        let config = EncounterConfig {
            bounds: ArenaBounds::new(Vec3::ZERO, Vec3::splat(10.0)),
            spawn_point: Vec3::new(0.0, 0.0, 4.0),
            kind: EncounterKindConfig::Boss {
                health: 0,
                projectile_count: 6,
                move_speed: 0.0,
                shoot_interval: 0.0,
            },
        };
        let encounter = Encounter::from_config(0, &config, &balance, &[0, 1]);
        let EncounterKind::Boss(boss) = &encounter.kind else {
            panic!("expected a boss");
        };
        assert_eq!(boss.max_health, balance.boss_health);
        assert_eq!(boss.projectile_count, 6);
        assert_eq!(boss.move_speed, balance.boss_move_speed);
        assert_eq!(encounter.position, config.spawn_point);
    }

    #[test]
    fn default_level_builds_all_four_kinds_in_order() {
        let level = LevelConfig::default();
        let balance = BalanceConfig::default();
        let tags: Vec<i32> = level
            .encounters
            .iter()
            .enumerate()
            .map(|(id, cfg)| Encounter::from_config(id, cfg, &balance, &[0, 1]).to_wire().detail.kind_tag())
            .collect();
        assert_eq!(tags, vec![0, 1, 2, 3]);
    }

    #[test]
    fn completing_a_boss_marks_it_defeated() {
        let level = LevelConfig::default();
        let mut encounter = Encounter::from_config(0, &level.encounters[0], &BalanceConfig::default(), &[0]);
        encounter.activate();
        assert!(!encounter.is_defeated());
        encounter.complete();
        assert!(!encounter.active);
        assert!(encounter.completed);
        assert!(encounter.is_defeated());
        assert!(encounter.to_wire().completed);
    }
}
