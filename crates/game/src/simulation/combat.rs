//! Player action resolution against players, projectiles and the active
//! encounter.

use glam::Vec3;

use crate::encounter::{Encounter, EncounterKind, StrikeOutcome, push_object};
use crate::math::{angle_between, planar};
use crate::player::PlayerAction;

use super::match_state::MatchState;
use super::projectile::Projectile;

/// Extra melee reach against the boss's body.
const BOSS_MELEE_MARGIN: f32 = 3.0;
const OBJECT_MELEE_MARGIN: f32 = 0.5;
const PILLAR_MELEE_MARGIN: f32 = 1.0;
const PROJECTILE_SPAWN_HEIGHT: f32 = 0.5;
const PROJECTILE_SPAWN_AHEAD: f32 = 0.5;

impl MatchState {
    pub(super) fn resolve_pending_actions(&mut self) {
        for index in 0..self.players.len() {
            let Some(action) = self.players[index].pending_action.take() else {
                continue;
            };
            if !self.players[index].is_alive() {
                continue;
            }
            match action {
                PlayerAction::Melee => self.melee(index),
                PlayerAction::Ranged => self.ranged(index),
                PlayerAction::Heal { target_slot } => self.heal(index, target_slot),
            }
        }
    }

    /// The cooldown restarts on every swing, hit or miss. A swing that lands
    /// on a pillar is consumed by the puzzle; any other swing also destroys
    /// boss projectiles within melee radius.
    pub(super) fn melee(&mut self, index: usize) {
        let balance = self.balance.clone();
        let player = &mut self.players[index];
        if player.cooldowns.melee > 0.0 {
            return;
        }
        player.cooldowns.melee = balance.melee_cooldown;

        let position = player.position;
        let forward = player.forward();
        let damage = player.stats.melee_damage;
        let half_cone = balance.melee_angle / 2.0;
        let obstacles = &*self.obstacles;

        let strike = match self.active.map(|i| &mut self.encounters[i]) {
            Some(encounter) if !encounter.completed => {
                let Encounter {
                    kind,
                    position: center,
                    ..
                } = encounter;
                let offset = planar(*center - position);
                let in_cone = angle_between(forward, offset) < half_cone;

                match kind {
                    EncounterKind::Boss(boss) => {
                        if offset.length() < balance.melee_radius + BOSS_MELEE_MARGIN && in_cone {
                            boss.take_damage(damage);
                            log::debug!("boss took {} melee damage, {} left", damage, boss.health);
                        }
                        None
                    }
                    EncounterKind::ObjectPuzzle(_) => {
                        let reach =
                            balance.melee_radius + balance.object_radius + OBJECT_MELEE_MARGIN;
                        if offset.length() < reach && in_cone {
                            *center = push_object(
                                *center,
                                offset,
                                balance.object_push_force,
                                balance.object_radius,
                                obstacles,
                            );
                        }
                        None
                    }
                    EncounterKind::SequencePuzzle(puzzle) => puzzle.strike(
                        position,
                        forward,
                        balance.melee_radius + PILLAR_MELEE_MARGIN,
                        balance.sequence_round_delay,
                    ),
                    EncounterKind::TrackingPuzzle(_) => None,
                }
            }
            _ => None,
        };

        match strike {
            Some(StrikeOutcome::Wrong) => {
                for player in &mut self.players {
                    player.apply_damage(balance.sequence_fail_damage);
                }
                return;
            }
            Some(StrikeOutcome::Solved) => {
                self.complete_active();
                return;
            }
            Some(StrikeOutcome::Advanced | StrikeOutcome::RoundCleared) => return,
            None => {}
        }

        self.boss_projectiles
            .retain(|projectile| projectile.planar_distance_to(position) >= balance.melee_radius);
    }

    pub(super) fn ranged(&mut self, index: usize) {
        let player = &mut self.players[index];
        if player.cooldowns.ranged > 0.0 {
            return;
        }
        player.cooldowns.ranged = player.stats.ranged_cooldown;

        let forward = player.forward();
        let mut origin = player.position;
        origin.y = PROJECTILE_SPAWN_HEIGHT;
        origin += forward * PROJECTILE_SPAWN_AHEAD;

        self.projectiles.push(Projectile::player(
            origin,
            forward,
            player.stats.ranged_damage,
            player.slot,
        ));
    }

    /// Heals (and revives) the player in `target_slot`. The cooldown only
    /// starts when a target in range was found.
    pub(super) fn heal(&mut self, healer: usize, target_slot: i32) {
        if self.players[healer].cooldowns.heal > 0.0 {
            return;
        }
        let Some(target) = self
            .players
            .iter()
            .position(|p| i32::from(p.slot) == target_slot)
        else {
            return;
        };

        let distance = planar(self.players[target].position - self.players[healer].position).length();
        if distance > self.balance.heal_range {
            return;
        }

        let amount = self.players[healer].stats.heal_amount;
        self.players[healer].cooldowns.heal = self.balance.heal_cooldown;
        self.players[target].receive_heal(amount);
        log::debug!(
            "slot {} healed slot {} for {}",
            self.players[healer].slot,
            target_slot,
            amount
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::lobby::PlayerSession;
    use crate::map::LevelConfig;
    use crate::math::yaw_from_direction;
    use crate::net::PeerId;
    use crate::physics::testing::Walls;
    use crate::player::BalanceConfig;

    fn solo() -> MatchState {
        let level = LevelConfig {
            spawn_origin: Vec3::ZERO,
            spawn_spacing: 3.0,
            obstacles: Vec::new(),
            encounters: Vec::new(),
        };
        let roster = vec![PlayerSession::new("solo", 0, PeerId::Local, Instant::now())];
        MatchState::new(roster, &level, BalanceConfig::default(), Box::new(Walls::default()), 3)
    }

    #[test]
    fn ranged_spawns_ahead_at_chest_height() {
        let mut state = solo();
        state.players[0].position = Vec3::ZERO;
        state.players[0].yaw = 90.0;
        state.ranged(0);

        assert_eq!(state.projectiles.len(), 1);
        let shot = &state.projectiles[0];
        assert!(shot.position.abs_diff_eq(Vec3::new(0.5, 0.5, 0.0), 1e-5));
        assert!(shot.direction.abs_diff_eq(Vec3::X, 1e-5));
        assert_eq!(shot.owner_slot, Some(0));
        assert_eq!(state.players[0].cooldowns.ranged, 1.0);

        state.ranged(0);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn melee_deflects_nearby_boss_projectiles() {
        let mut state = solo();
        state.players[0].position = Vec3::ZERO;
        state.boss_projectiles = vec![
            Projectile::boss(Vec3::new(1.0, 1.0, 0.0), Vec3::X, 15),
            Projectile::boss(Vec3::new(6.0, 1.0, 0.0), Vec3::X, 15),
        ];
        state.melee(0);
        assert_eq!(state.boss_projectiles.len(), 1);
        assert_eq!(state.boss_projectiles[0].position.x, 6.0);
    }

    #[test]
    fn melee_on_cooldown_does_nothing() {
        let mut state = solo();
        state.players[0].cooldowns.melee = 0.3;
        state.boss_projectiles = vec![Projectile::boss(Vec3::ZERO, Vec3::X, 15)];
        state.melee(0);
        assert_eq!(state.boss_projectiles.len(), 1);
        assert_eq!(state.players[0].cooldowns.melee, 0.3);
    }

    #[test]
    fn self_heal_is_allowed() {
        let mut state = solo();
        state.players[0].apply_damage(50);
        state.players[0].yaw = yaw_from_direction(Vec3::Z);
        state.heal(0, 0);
        assert_eq!(state.players[0].health, 80);
    }

    #[test]
    fn heal_on_unknown_slot_keeps_cooldown_ready() {
        let mut state = solo();
        state.heal(0, 3);
        assert_eq!(state.players[0].cooldowns.heal, 0.0);
    }
}
