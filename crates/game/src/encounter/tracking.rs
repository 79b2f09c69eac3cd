use glam::Vec3;

use crate::math::{delta_angle, forward_from_yaw, move_towards_angle, planar, yaw_from_direction};
use crate::net::PlateState;
use crate::player::try_push;

use super::{EncounterContext, Progress};

/// A living player within this distance of a plate charges it.
pub const PLATE_RADIUS: f32 = 2.0;

const FULL_CHARGE: f32 = 100.0;
const HIT_INVULNERABILITY: f32 = 1.0;
const BEAM_PUSH_SPEED: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    pub position: Vec3,
    pub progress: f32,
    /// Occupied this tick, or fully charged.
    pub active: bool,
}

impl Plate {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            progress: 0.0,
            active: false,
        }
    }

    pub fn is_charged(&self) -> bool {
        self.progress >= FULL_CHARGE
    }

    pub fn to_wire(&self) -> PlateState {
        PlateState {
            progress: self.progress,
            active: self.active,
        }
    }
}

/// A beam hunting the player in `slot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beam {
    pub slot: u8,
    pub angle: f32,
}

/// One rotating beam per player plus a set of floor plates to charge.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingPuzzle {
    pub beams: Vec<Beam>,
    pub plates: Vec<Plate>,
    pub beam_damage: i32,
}

impl TrackingPuzzle {
    /// Beams start evenly spread around the circle.
    pub fn new(plates: &[Vec3], player_slots: &[u8], beam_damage: i32) -> Self {
        let spacing = 360.0 / player_slots.len().max(1) as f32;
        Self {
            beams: player_slots
                .iter()
                .enumerate()
                .map(|(i, &slot)| Beam {
                    slot,
                    angle: i as f32 * spacing,
                })
                .collect(),
            plates: plates.iter().copied().map(Plate::new).collect(),
            beam_damage,
        }
    }

    pub fn beam_angles(&self) -> Vec<f32> {
        self.beams.iter().map(|beam| beam.angle).collect()
    }

    pub(super) fn update(&mut self, center: Vec3, ctx: &mut EncounterContext<'_>) -> Progress {
        self.sweep_beams(center, ctx);
        self.charge_plates(ctx);

        if self.plates.iter().all(Plate::is_charged) {
            Progress::Completed
        } else {
            Progress::Ongoing
        }
    }

    fn sweep_beams(&mut self, center: Vec3, ctx: &mut EncounterContext<'_>) {
        let balance = ctx.balance;
        let max_turn = balance.beam_tracking_speed * ctx.dt;

        // Players who left take their beam with them.
        self.beams.retain(|beam| ctx.players.iter().any(|p| p.slot == beam.slot));

        for beam in &mut self.beams {
            let Some(player) = ctx.players.iter_mut().find(|p| p.slot == beam.slot) else {
                continue;
            };
            if !player.is_alive() {
                continue;
            }

            let offset = planar(player.position - center);
            let bearing = yaw_from_direction(offset);
            beam.angle = move_towards_angle(beam.angle, bearing, max_turn).rem_euclid(360.0);

            let inside_beam = delta_angle(beam.angle, bearing).abs() < balance.beam_width_angle / 2.0
                && offset.length() < balance.beam_length;
            if inside_beam && player.invulnerability <= 0.0 {
                player.apply_damage(self.beam_damage);
                player.invulnerability = HIT_INVULNERABILITY;
                let push = forward_from_yaw(beam.angle + 90.0) * BEAM_PUSH_SPEED * ctx.dt;
                player.position = try_push(player.position, push, ctx.obstacles);
            }
        }
    }

    fn charge_plates(&mut self, ctx: &EncounterContext<'_>) {
        let charge = ctx.balance.plate_charge_speed * ctx.dt;
        for plate in &mut self.plates {
            if plate.is_charged() {
                plate.progress = FULL_CHARGE;
                plate.active = true;
                continue;
            }

            plate.active = ctx
                .players
                .iter()
                .any(|p| p.is_alive() && planar(p.position - plate.position).length() < PLATE_RADIUS);
            if plate.active {
                plate.progress = (plate.progress + charge).min(FULL_CHARGE);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::testing::{Harness, player_at};

    #[test]
    fn beams_start_evenly_spaced() {
        let puzzle = TrackingPuzzle::new(&[], &[0, 1, 2, 3], 1);
        assert_eq!(puzzle.beam_angles(), vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn beam_turns_at_capped_speed() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::new(10.0, 0.0, 0.0))]);
        let mut puzzle = TrackingPuzzle::new(&[Vec3::new(50.0, 0.0, 50.0)], &[0], 1);
        puzzle.update(Vec3::ZERO, &mut harness.ctx(1.0));
        assert!((puzzle.beams[0].angle - 15.0).abs() < 1e-4);
        assert_eq!(harness.players[0].health, harness.players[0].stats.max_health);
    }

    #[test]
    fn beam_hit_damages_once_per_invulnerability_window() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::new(0.0, 0.0, 10.0))]);
        let mut puzzle = TrackingPuzzle::new(&[Vec3::new(50.0, 0.0, 50.0)], &[0], 7);
        let before = harness.players[0].position;

        puzzle.update(Vec3::ZERO, &mut harness.ctx(0.1));
        let player = &harness.players[0];
        assert_eq!(player.health, player.stats.max_health - 7);
        assert_eq!(player.invulnerability, 1.0);
        // Pushed sideways, perpendicular to a beam pointing along +Z.
        assert!((player.position.x - before.x - 0.5).abs() < 1e-4);

        puzzle.update(Vec3::ZERO, &mut harness.ctx(0.1));
        assert_eq!(harness.players[0].health, harness.players[0].stats.max_health - 7);
    }

    #[test]
    fn plates_charge_only_while_occupied_and_latch_when_full() {
        let plate = Vec3::new(6.0, 0.0, 0.0);
        let mut harness = Harness::new(vec![player_at(0, plate + Vec3::X)]);
        let mut puzzle = TrackingPuzzle::new(&[plate, Vec3::new(-6.0, 0.0, 0.0)], &[], 1);

        puzzle.update(Vec3::new(0.0, 0.0, 30.0), &mut harness.ctx(2.0));
        assert!((puzzle.plates[0].progress - 30.0).abs() < 1e-4);
        assert!(puzzle.plates[0].active);
        assert!(!puzzle.plates[1].active);
        assert_eq!(puzzle.plates[1].progress, 0.0);

        for _ in 0..10 {
            puzzle.update(Vec3::new(0.0, 0.0, 30.0), &mut harness.ctx(1.0));
        }
        assert_eq!(puzzle.plates[0].progress, 100.0);

        harness.players[0].position = Vec3::new(-6.0, 0.0, 0.0);
        puzzle.update(Vec3::new(0.0, 0.0, 30.0), &mut harness.ctx(0.5));
        assert!(puzzle.plates[0].active);
        assert_eq!(puzzle.plates[0].progress, 100.0);
    }

    #[test]
    fn completes_when_every_plate_is_charged() {
        let plates = [Vec3::new(3.0, 0.0, 0.0), Vec3::new(-3.0, 0.0, 0.0)];
        let mut harness = Harness::new(vec![
            player_at(0, plates[0]),
            player_at(1, plates[1]),
        ]);
        let mut puzzle = TrackingPuzzle::new(&plates, &[], 1);
        let center = Vec3::new(0.0, 0.0, 40.0);

        let mut progress = Progress::Ongoing;
        for _ in 0..7 {
            progress = puzzle.update(center, &mut harness.ctx(1.0));
        }
        assert_eq!(progress, Progress::Completed);
    }

    #[test]
    fn beams_stay_with_their_players_after_one_leaves() {
        let mut harness = Harness::new(vec![
            player_at(0, Vec3::new(10.0, 0.0, 0.0)),
            player_at(1, Vec3::new(0.0, 0.0, 10.0)),
            player_at(2, Vec3::new(-10.0, 0.0, 0.0)),
        ]);
        let mut puzzle = TrackingPuzzle::new(&[Vec3::new(50.0, 0.0, 50.0)], &[0, 1, 2], 1);
        assert_eq!(puzzle.beam_angles(), vec![0.0, 120.0, 240.0]);

        harness.players.remove(1);
        puzzle.update(Vec3::ZERO, &mut harness.ctx(1.0));

        let slots: Vec<u8> = puzzle.beams.iter().map(|b| b.slot).collect();
        assert_eq!(slots, vec![0, 2]);
        // Each beam keeps turning toward its own player: 0 -> 90 and 240 -> 270.
        assert!((puzzle.beams[0].angle - 15.0).abs() < 1e-4);
        assert!((puzzle.beams[1].angle - 255.0).abs() < 1e-4);
    }
}
