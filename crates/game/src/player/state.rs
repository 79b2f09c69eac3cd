use std::time::{Duration, Instant};

use glam::Vec3;

use crate::lobby::{LoadoutTrack, PlayerSession};
use crate::math::{forward_from_yaw, planar};
use crate::net::{InputCommand, PeerId, PlayerState};

use super::BalanceConfig;

/// Combat numbers derived once from the lobby loadout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStats {
    pub max_health: i32,
    pub melee_damage: i32,
    pub ranged_damage: i32,
    pub ranged_cooldown: f32,
    pub heal_amount: i32,
}

impl PlayerStats {
    pub fn from_session(session: &PlayerSession, balance: &BalanceConfig) -> Self {
        let level = |track| i32::from(session.loadout.level(track));
        Self {
            max_health: balance.base_health + level(LoadoutTrack::Armor) * balance.health_per_level,
            melee_damage: balance.melee_base_damage
                + level(LoadoutTrack::Melee) * balance.melee_damage_per_level,
            ranged_damage: balance.ranged_damage,
            ranged_cooldown: balance.ranged_base_cooldown
                - level(LoadoutTrack::Ranged) as f32 * balance.ranged_cooldown_per_level,
            heal_amount: balance.heal_base_amount
                + level(LoadoutTrack::Support) * balance.heal_per_level,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cooldowns {
    pub melee: f32,
    pub ranged: f32,
    pub heal: f32,
}

impl Cooldowns {
    pub fn tick(&mut self, dt: f32) {
        for timer in [&mut self.melee, &mut self.ranged, &mut self.heal] {
            *timer = (*timer - dt).max(0.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Melee,
    Ranged,
    Heal { target_slot: i32 },
}

impl PlayerAction {
    pub fn from_wire(code: u8, target_slot: i32) -> Option<Self> {
        match code {
            InputCommand::ACTION_MELEE => Some(PlayerAction::Melee),
            InputCommand::ACTION_RANGED => Some(PlayerAction::Ranged),
            InputCommand::ACTION_HEAL => Some(PlayerAction::Heal { target_slot }),
            _ => None,
        }
    }
}

/// Authoritative per-player match state.
#[derive(Debug, Clone)]
pub struct MatchPlayer {
    pub slot: u8,
    pub name: String,
    pub peer: PeerId,
    pub last_seen: Instant,

    pub stats: PlayerStats,
    pub health: i32,
    pub dead: bool,

    pub position: Vec3,
    pub yaw: f32,
    pub cooldowns: Cooldowns,
    pub invulnerability: f32,

    pub move_input: Vec3,
    pub aim: Vec3,
    pub pending_action: Option<PlayerAction>,
}

impl MatchPlayer {
    pub fn from_session(session: PlayerSession, spawn: Vec3, balance: &BalanceConfig) -> Self {
        let stats = PlayerStats::from_session(&session, balance);
        Self {
            slot: session.slot,
            name: session.name,
            peer: session.peer,
            last_seen: session.last_seen,
            stats,
            health: stats.max_health,
            dead: false,
            position: spawn,
            yaw: 0.0,
            cooldowns: Cooldowns::default(),
            invulnerability: 0.0,
            move_input: Vec3::ZERO,
            aim: spawn,
            pending_action: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Same rule as the lobby: remote and quiet for at least `timeout`.
    pub fn is_silent(&self, now: Instant, timeout: Duration) -> bool {
        !self.peer.is_local() && now.saturating_duration_since(self.last_seen) >= timeout
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    /// Stores the latest intent. The movement vector is flattened and
    /// clamped to unit length; a zero action code never cancels an action
    /// still waiting for the next tick.
    pub fn apply_input(&mut self, input: &InputCommand, now: Instant) {
        self.last_seen = now;
        self.move_input = planar(Vec3::new(input.move_x, 0.0, input.move_z)).clamp_length_max(1.0);
        self.aim = Vec3::new(input.look_x, 0.0, input.look_z);
        if let Some(action) = PlayerAction::from_wire(input.action, input.target_slot) {
            self.pending_action = Some(action);
        }
    }

    pub fn apply_damage(&mut self, amount: i32) {
        if self.dead {
            return;
        }
        self.health = (self.health - amount).clamp(0, self.stats.max_health);
        self.dead = self.health == 0;
    }

    /// Revives a dead target and adds `amount`, capped at max health.
    pub fn receive_heal(&mut self, amount: i32) {
        self.health = (self.health + amount).clamp(0, self.stats.max_health);
        self.dead = self.health == 0;
    }

    pub fn tick_timers(&mut self, dt: f32) {
        self.cooldowns.tick(dt);
        self.invulnerability = (self.invulnerability - dt).max(0.0);
    }

    pub fn to_wire(&self) -> PlayerState {
        PlayerState {
            slot: i32::from(self.slot),
            x: self.position.x,
            z: self.position.z,
            rotation_y: self.yaw,
            health: self.health,
            max_health: self.stats.max_health,
            dead: self.dead,
            melee_cooldown: self.cooldowns.melee,
            ranged_cooldown: self.cooldowns.ranged,
            heal_cooldown: self.cooldowns.heal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::Loadout;

    fn session_with(tracks: &[LoadoutTrack]) -> PlayerSession {
        let mut session = PlayerSession::new("p", 1, PeerId::Local, Instant::now());
        let mut loadout = Loadout::default();
        for &track in tracks {
            loadout.upgrade(track);
        }
        session.loadout = loadout;
        session
    }

    #[test]
    fn stats_follow_loadout() {
        let balance = BalanceConfig::default();
        let session = session_with(&[
            LoadoutTrack::Melee,
            LoadoutTrack::Ranged,
            LoadoutTrack::Armor,
            LoadoutTrack::Support,
        ]);
        let stats = PlayerStats::from_session(&session, &balance);
        assert_eq!(stats.max_health, 125);
        assert_eq!(stats.melee_damage, 30);
        assert!((stats.ranged_cooldown - 0.8).abs() < 1e-6);
        assert_eq!(stats.heal_amount, 45);
        assert_eq!(stats.ranged_damage, 15);
    }

    #[test]
    fn damage_clamps_and_marks_dead() {
        let balance = BalanceConfig::default();
        let mut player = MatchPlayer::from_session(session_with(&[]), Vec3::ZERO, &balance);
        player.apply_damage(60);
        assert_eq!(player.health, 40);
        player.apply_damage(500);
        assert_eq!(player.health, 0);
        assert!(player.dead);

        player.receive_heal(30);
        assert!(!player.dead);
        assert_eq!(player.health, 30);
        player.receive_heal(1000);
        assert_eq!(player.health, player.stats.max_health);
    }

    #[test]
    fn oversized_move_vector_is_clamped() {
        let balance = BalanceConfig::default();
        let mut player = MatchPlayer::from_session(session_with(&[]), Vec3::ZERO, &balance);
        player.apply_input(
            &InputCommand {
                move_x: 30.0,
                move_z: 40.0,
                ..Default::default()
            },
            Instant::now(),
        );
        assert!((player.move_input.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn idle_input_keeps_pending_action() {
        let balance = BalanceConfig::default();
        let mut player = MatchPlayer::from_session(session_with(&[]), Vec3::ZERO, &balance);
        let now = Instant::now();
        player.apply_input(
            &InputCommand {
                action: InputCommand::ACTION_RANGED,
                ..Default::default()
            },
            now,
        );
        player.apply_input(&InputCommand::default(), now);
        assert_eq!(player.pending_action, Some(PlayerAction::Ranged));
    }
}
