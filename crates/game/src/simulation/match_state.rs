use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::encounter::{BOSS_HIT_RADIUS, Encounter, EncounterContext, Progress};
use crate::event::GameEvent;
use crate::lobby::{EVICTION_SWEEP_TICKS, PlayerSession, SESSION_TIMEOUT};
use crate::map::LevelConfig;
use crate::net::{GameState, InputCommand, PeerId};
use crate::physics::{PhysicsWorld, SweepQuery};
use crate::player::{BalanceConfig, MatchPlayer, PlayerController, separate_players};

use super::projectile::Projectile;

/// Soft containment inset applied right after the encounter update.
pub const ARENA_SOFT_INSET: f32 = 1.0;
/// Boss projectiles closer than this to a living player hit it.
pub const PLAYER_HIT_RADIUS: f32 = 1.2;

pub const VICTORY_REASON: &str = "VICTORY";
pub const DEFEAT_REASON: &str = "All players died";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Victory,
    Defeat,
}

impl MatchOutcome {
    pub fn reason(self) -> &'static str {
        match self {
            MatchOutcome::Victory => VICTORY_REASON,
            MatchOutcome::Defeat => DEFEAT_REASON,
        }
    }
}

/// Authoritative match simulation. Only the host owns one; everything else
/// renders the [`GameState`] snapshots it produces.
pub struct MatchState {
    pub(super) players: Vec<MatchPlayer>,
    pub(super) encounters: Vec<Encounter>,
    pub(super) active: Option<usize>,
    pub(super) projectiles: Vec<Projectile>,
    pub(super) boss_projectiles: Vec<Projectile>,
    pub(super) balance: BalanceConfig,
    pub(super) obstacles: Box<dyn SweepQuery>,
    controller: PlayerController,
    rng: StdRng,
    ticks: u64,
    outcome: Option<MatchOutcome>,
    pub(super) events: Vec<GameEvent>,
}

impl MatchState {
    pub fn new(
        roster: Vec<PlayerSession>,
        level: &LevelConfig,
        balance: BalanceConfig,
        obstacles: Box<dyn SweepQuery>,
        seed: u64,
    ) -> Self {
        let players: Vec<MatchPlayer> = roster
            .into_iter()
            .map(|session| {
                let spawn = level.spawn_position(session.slot);
                MatchPlayer::from_session(session, spawn, &balance)
            })
            .collect();

        let slots: Vec<u8> = players.iter().map(|p| p.slot).collect();
        let encounters = level
            .encounters
            .iter()
            .enumerate()
            .map(|(id, config)| Encounter::from_config(id, config, &balance, &slots))
            .collect();

        log::info!("match started with {} players", players.len());

        Self {
            controller: PlayerController::new(balance.move_speed),
            events: vec![GameEvent::MatchStarted {
                players: players.len(),
            }],
            players,
            encounters,
            active: None,
            projectiles: Vec::new(),
            boss_projectiles: Vec::new(),
            balance,
            obstacles,
            rng: StdRng::seed_from_u64(seed),
            ticks: 0,
            outcome: None,
        }
    }

    /// Builds the obstacle oracle from the level's static boxes.
    pub fn with_level_geometry(
        roster: Vec<PlayerSession>,
        level: &LevelConfig,
        balance: BalanceConfig,
        seed: u64,
    ) -> Self {
        let physics = PhysicsWorld::from_obstacles(&level.obstacles);
        Self::new(roster, level, balance, Box::new(physics), seed)
    }

    pub fn players(&self) -> &[MatchPlayer] {
        &self.players
    }

    pub fn player(&self, peer: &PeerId) -> Option<&MatchPlayer> {
        self.players.iter().find(|p| p.peer == *peer)
    }

    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    pub fn active_encounter(&self) -> Option<&Encounter> {
        self.active.map(|index| &self.encounters[index])
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn boss_projectiles(&self) -> &[Projectile] {
        &self.boss_projectiles
    }

    pub fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Stores the latest input of the player owned by `peer`. Returns false
    /// for unknown senders.
    pub fn apply_input(&mut self, peer: &PeerId, input: &InputCommand, now: Instant) -> bool {
        match self.players.iter_mut().find(|p| p.peer == *peer) {
            Some(player) => {
                player.apply_input(input, now);
                true
            }
            None => false,
        }
    }

    pub fn touch(&mut self, peer: &PeerId, now: Instant) -> bool {
        match self.players.iter_mut().find(|p| p.peer == *peer) {
            Some(player) => {
                player.last_seen = now;
                true
            }
            None => false,
        }
    }

    pub fn remove_player(&mut self, peer: &PeerId) -> Option<MatchPlayer> {
        let index = self.players.iter().position(|p| p.peer == *peer)?;
        let player = self.players.remove(index);
        log::info!("{} left the match", player.name);
        self.events.push(GameEvent::PlayerLeft {
            name: player.name.clone(),
            slot: player.slot,
        });
        Some(player)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances the match by one fixed step.
    pub fn tick(&mut self, dt: f32, now: Instant) -> Option<MatchOutcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }

        self.ticks += 1;
        if self.ticks % EVICTION_SWEEP_TICKS == 0 {
            self.evict_silent(now);
        }

        self.resolve_pending_actions();
        if self.outcome.is_none() {
            self.update_encounter(dt);
        }

        for player in self.players.iter_mut().filter(|p| p.is_alive()) {
            player.tick_timers(dt);
            self.controller.move_player(player, &*self.obstacles, dt);
        }
        separate_players(&mut self.players, self.balance.player_radius, &*self.obstacles);
        self.contain_players(self.balance.player_radius);

        self.step_player_projectiles(dt);
        self.step_boss_projectiles(dt);

        if !self.players.is_empty() && self.players.iter().all(|p| p.dead) {
            self.finish(MatchOutcome::Defeat);
        }

        self.outcome
    }

    pub fn snapshot(&self) -> GameState {
        GameState {
            players: self.players.iter().map(MatchPlayer::to_wire).collect(),
            projectiles: self.projectiles.iter().map(Projectile::to_wire).collect(),
            encounter: self.active_encounter().map(Encounter::to_wire),
            boss_projectiles: self.boss_projectiles.iter().map(Projectile::to_wire).collect(),
        }
    }

    fn evict_silent(&mut self, now: Instant) {
        let (silent, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|p| p.is_silent(now, SESSION_TIMEOUT));
        self.players = kept;

        for player in silent {
            log::warn!("{} ({}) timed out in match", player.name, player.peer);
            self.events.push(GameEvent::PlayerEvicted {
                name: player.name,
                slot: player.slot,
            });
        }
    }

    fn update_encounter(&mut self, dt: f32) {
        let Some(index) = self.active else {
            self.scan_for_activation();
            return;
        };

        let Self {
            players,
            encounters,
            boss_projectiles,
            balance,
            obstacles,
            rng,
            ..
        } = self;
        let mut ctx = EncounterContext {
            players,
            boss_projectiles,
            balance,
            obstacles: &**obstacles,
            rng,
            dt,
        };

        match encounters[index].update(&mut ctx) {
            Progress::Completed => self.complete_active(),
            Progress::Ongoing => self.contain_players(ARENA_SOFT_INSET),
        }
    }

    /// Only the first encounter not yet completed can be triggered.
    fn scan_for_activation(&mut self) {
        let Some(index) = self.encounters.iter().position(|e| !e.completed) else {
            return;
        };
        let bounds = self.encounters[index].bounds;
        let Some(initiator) = self
            .players
            .iter()
            .map(|p| p.position)
            .find(|&position| bounds.contains(position))
        else {
            return;
        };

        for player in &mut self.players {
            if !bounds.contains(player.position) {
                player.position = initiator;
            }
        }

        let encounter = &mut self.encounters[index];
        encounter.activate();
        self.active = Some(index);

        log::info!("encounter {} ({}) activated", index, encounter.kind.name());
        self.events.push(GameEvent::EncounterActivated {
            id: index,
            kind: encounter.kind.name(),
        });
    }

    pub(super) fn complete_active(&mut self) {
        let Some(index) = self.active.take() else {
            return;
        };
        let encounter = &mut self.encounters[index];
        encounter.complete();
        self.boss_projectiles.clear();

        log::info!("encounter {} ({}) completed", index, encounter.kind.name());
        self.events.push(GameEvent::EncounterCompleted {
            id: index,
            kind: encounter.kind.name(),
        });

        if index + 1 >= self.encounters.len() {
            self.finish(MatchOutcome::Victory);
        }
    }

    fn contain_players(&mut self, inset: f32) {
        let Some(encounter) = self.active.map(|index| &self.encounters[index]) else {
            return;
        };
        if encounter.completed {
            return;
        }
        for player in &mut self.players {
            player.position = encounter.bounds.clamp_planar(player.position, inset);
        }
    }

    fn step_player_projectiles(&mut self, dt: f32) {
        let speed = self.balance.projectile_speed;
        let obstacles = &*self.obstacles;

        let (arena, mut boss) = match self.active.map(|index| &mut self.encounters[index]) {
            Some(encounter) => {
                let center = encounter.position;
                (Some(encounter.bounds), encounter.boss_mut().map(|boss| (boss, center)))
            }
            None => (None, None),
        };

        self.projectiles.retain_mut(|projectile| {
            if !projectile.advance(speed, dt, obstacles) {
                return false;
            }
            if let Some((boss, center)) = boss.as_mut() {
                if projectile.planar_distance_to(*center) < BOSS_HIT_RADIUS {
                    boss.take_damage(projectile.damage);
                    return false;
                }
            }
            if arena.is_some_and(|bounds| !bounds.contains(projectile.position)) {
                return false;
            }
            !projectile.is_out_of_range()
        });
    }

    fn step_boss_projectiles(&mut self, dt: f32) {
        let speed = self.balance.boss_projectile_speed;
        let obstacles = &*self.obstacles;
        let arena = self.active.map(|index| self.encounters[index].bounds);
        let players = &mut self.players;

        self.boss_projectiles.retain_mut(|projectile| {
            if !projectile.advance(speed, dt, obstacles) {
                return false;
            }
            if let Some(victim) = players.iter_mut().find(|p| {
                p.is_alive() && projectile.planar_distance_to(p.position) < PLAYER_HIT_RADIUS
            }) {
                victim.apply_damage(projectile.damage);
                return false;
            }
            if arena.is_some_and(|bounds| !bounds.contains(projectile.position)) {
                return false;
            }
            !projectile.is_out_of_range()
        });
    }

    fn finish(&mut self, outcome: MatchOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        log::info!("match over: {}", outcome.reason());
        self.events.push(GameEvent::MatchEnded {
            reason: outcome.reason().to_string(),
        });
    }
}
