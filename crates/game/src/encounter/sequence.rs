use glam::Vec3;
use rand::Rng;

use crate::math::{angle_between, planar};

use super::EncounterContext;

/// Only the first four pillars carry a colour.
pub const PILLAR_COUNT: usize = 4;
pub const FAIL_PHASE_DURATION: f32 = 2.0;

const SETTLE_DELAY: f32 = 0.5;
const STRIKE_CONE: f32 = 60.0;
const ROUNDS_TO_SOLVE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePhase {
    /// Colours are revealed one per interval.
    Show,
    /// Players strike the pillars in order.
    Input,
    Fail,
    /// Short break after a correct round.
    Pause,
}

impl SequencePhase {
    pub fn wire_code(self) -> i32 {
        match self {
            SequencePhase::Show => 0,
            SequencePhase::Input => 1,
            SequencePhase::Fail => 2,
            SequencePhase::Pause => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    Advanced,
    RoundCleared,
    Solved,
    Wrong,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequencePuzzle {
    pub pillars: Vec<Vec3>,
    pub reveal_interval: f32,
    pub phase: SequencePhase,
    pub sequence: Vec<usize>,
    pub step: usize,
    pub streak: u32,
    pub timer: f32,
}

impl SequencePuzzle {
    pub fn new(pillars: Vec<Vec3>, reveal_interval: f32) -> Self {
        Self {
            pillars,
            reveal_interval,
            phase: SequencePhase::Show,
            sequence: Vec::new(),
            step: 0,
            streak: 0,
            timer: 0.0,
        }
    }

    pub(super) fn update(&mut self, ctx: &mut EncounterContext<'_>) {
        if self.sequence.is_empty() {
            let length = ctx.balance.sequence_base_length + (self.streak / 2) as usize;
            self.generate(length, &mut *ctx.rng);
        }

        match self.phase {
            SequencePhase::Show => {
                self.timer += ctx.dt;
                let reveal_time = self.sequence.len() as f32 * self.reveal_interval;
                if self.timer >= reveal_time + SETTLE_DELAY {
                    self.phase = SequencePhase::Input;
                    self.timer = 0.0;
                }
            }
            SequencePhase::Fail | SequencePhase::Pause => {
                self.timer -= ctx.dt;
                if self.timer <= 0.0 {
                    self.reset_round();
                }
            }
            SequencePhase::Input => {}
        }
    }

    fn generate(&mut self, length: usize, rng: &mut impl Rng) {
        self.sequence.clear();
        let colours = PILLAR_COUNT.min(self.pillars.len()).max(2);
        for _ in 0..length {
            let colour = loop {
                let candidate = rng.gen_range(0..colours);
                if self.sequence.last() != Some(&candidate) {
                    break candidate;
                }
            };
            self.sequence.push(colour);
        }
        self.phase = SequencePhase::Show;
        self.timer = 0.0;
        self.step = 0;
        log::debug!("new colour sequence {:?}", self.sequence);
    }

    fn reset_round(&mut self) {
        self.sequence.clear();
        self.phase = SequencePhase::Show;
        self.timer = 0.0;
        self.step = 0;
    }

    /// Resolves a melee swing against the pillars. Only the input phase
    /// accepts strikes, and only the first pillar within `reach` and the
    /// strike cone counts.
    pub fn strike(
        &mut self,
        position: Vec3,
        forward: Vec3,
        reach: f32,
        round_delay: f32,
    ) -> Option<StrikeOutcome> {
        if self.phase != SequencePhase::Input || self.step >= self.sequence.len() {
            return None;
        }

        let pillar = self.pillars.iter().take(PILLAR_COUNT).position(|&pillar| {
            let offset = planar(pillar - position);
            offset.length() < reach && angle_between(forward, offset) < STRIKE_CONE
        })?;

        if pillar != self.sequence[self.step] {
            self.streak = 0;
            self.phase = SequencePhase::Fail;
            self.timer = FAIL_PHASE_DURATION;
            return Some(StrikeOutcome::Wrong);
        }

        self.step += 1;
        if self.step < self.sequence.len() {
            return Some(StrikeOutcome::Advanced);
        }

        self.streak += 1;
        if self.streak >= ROUNDS_TO_SOLVE {
            return Some(StrikeOutcome::Solved);
        }
        self.phase = SequencePhase::Pause;
        self.timer = round_delay;
        Some(StrikeOutcome::RoundCleared)
    }

    /// Colour currently revealed during the show phase, or the last colour
    /// entered during the input phase; -1 otherwise.
    pub fn reveal_index(&self) -> i32 {
        let colour = match self.phase {
            SequencePhase::Show if self.reveal_interval > 0.0 => {
                let index = (self.timer / self.reveal_interval).floor() as usize;
                self.sequence.get(index).copied()
            }
            SequencePhase::Input if self.step > 0 => self.sequence.get(self.step - 1).copied(),
            _ => None,
        };
        colour.map_or(-1, |c| c as i32)
    }
}
