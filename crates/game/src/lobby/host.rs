use std::net::SocketAddr;
use std::time::Instant;

use crate::net::{Packet, PeerId};

use super::session::{
    JoinOutcome, LoadoutTrack, MAX_PLAYERS, PlayerSession, SESSION_TIMEOUT, SessionRegistry,
};

pub const ROSTER_BROADCAST_INTERVAL: f32 = 0.1;
pub const EVICTION_SWEEP_TICKS: u64 = 60;

const ACTION_TOGGLE_READY: u8 = 0;
const ACTION_UPGRADE: u8 = 1;
const ACTION_CHANGE_SLOT: u8 = 2;
const ACTION_KEEP_ALIVE: u8 = 255;

/// Lobby intent carried by an `Input` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    ToggleReady,
    Upgrade(LoadoutTrack),
    ChangeSlot(u8),
    KeepAlive,
}

impl LobbyAction {
    pub fn from_wire(action: u8, value: i32) -> Option<Self> {
        match action {
            ACTION_TOGGLE_READY => Some(LobbyAction::ToggleReady),
            ACTION_UPGRADE => LoadoutTrack::from_index(value).map(LobbyAction::Upgrade),
            ACTION_CHANGE_SLOT => u8::try_from(value)
                .ok()
                .filter(|&slot| usize::from(slot) < MAX_PLAYERS)
                .map(LobbyAction::ChangeSlot),
            ACTION_KEEP_ALIVE => Some(LobbyAction::KeepAlive),
            _ => None,
        }
    }

    pub fn to_packet(self) -> Packet {
        let (action, value) = match self {
            LobbyAction::ToggleReady => (ACTION_TOGGLE_READY, 0),
            LobbyAction::Upgrade(track) => (ACTION_UPGRADE, track as i32),
            LobbyAction::ChangeSlot(slot) => (ACTION_CHANGE_SLOT, i32::from(slot)),
            LobbyAction::KeepAlive => (ACTION_KEEP_ALIVE, 0),
        };
        Packet::Input { action, value }
    }
}

#[derive(Debug, Default)]
pub struct LobbyTick {
    pub roster: Option<Packet>,
    pub evicted: Vec<PlayerSession>,
    pub start: bool,
}

/// Authority side of the lobby. The host's own session is created up front
/// under the local identity.
#[derive(Debug)]
pub struct LobbyHost {
    registry: SessionRegistry,
    broadcast_timer: f32,
    ticks: u64,
}

impl LobbyHost {
    pub fn new(host_name: &str, now: Instant) -> Self {
        let mut registry = SessionRegistry::new();
        registry.join(PeerId::Local, host_name, now);
        Self {
            registry,
            broadcast_timer: 0.0,
            ticks: 0,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn handle_join(&mut self, peer: PeerId, name: &str, now: Instant) -> JoinOutcome {
        let outcome = self.registry.join(peer, name, now);
        match outcome {
            JoinOutcome::Joined { slot } => log::info!("{} joined as {} in slot {}", peer, name, slot),
            JoinOutcome::Full => log::debug!("lobby full, dropping join from {}", peer),
            JoinOutcome::Refreshed => {}
        }
        outcome
    }

    /// Applies one intent. Returns false when the sender is unknown or the
    /// request was refused.
    pub fn handle_action(&mut self, peer: &PeerId, action: LobbyAction, now: Instant) -> bool {
        let Some(session) = self.registry.get_mut(peer) else {
            return false;
        };
        session.touch(now);

        match action {
            LobbyAction::ToggleReady => {
                session.ready = !session.ready;
                true
            }
            LobbyAction::Upgrade(track) => {
                session.loadout.upgrade(track);
                true
            }
            LobbyAction::ChangeSlot(slot) => self.registry.change_slot(peer, slot),
            LobbyAction::KeepAlive => true,
        }
    }

    pub fn touch(&mut self, peer: &PeerId, now: Instant) -> bool {
        self.registry.touch(peer, now)
    }

    pub fn leave(&mut self, peer: &PeerId) -> Option<PlayerSession> {
        self.registry.remove(peer)
    }

    pub fn tick(&mut self, dt: f32, now: Instant) -> LobbyTick {
        let mut out = LobbyTick::default();

        self.ticks += 1;
        if self.ticks % EVICTION_SWEEP_TICKS == 0 {
            out.evicted = self.registry.evict_silent(now, SESSION_TIMEOUT);
            for session in &out.evicted {
                log::warn!("{} ({}) timed out in lobby", session.name, session.peer);
            }
        }

        self.broadcast_timer += dt;
        if self.broadcast_timer >= ROSTER_BROADCAST_INTERVAL {
            self.broadcast_timer = 0.0;
            out.roster = Some(self.roster_packet());
            out.start = self.registry.all_ready();
        }

        out
    }

    pub fn roster_packet(&self) -> Packet {
        Packet::LobbyState {
            roster: self.registry.roster(),
        }
    }

    pub fn remote_addrs(&self) -> Vec<SocketAddr> {
        self.registry.remote_addrs()
    }

    /// Freezes the roster for the match.
    pub fn into_roster(self) -> Vec<PlayerSession> {
        self.registry.into_sessions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(port: u16) -> PeerId {
        PeerId::Remote(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    #[test]
    fn wire_actions() {
        assert_eq!(LobbyAction::from_wire(0, 0), Some(LobbyAction::ToggleReady));
        assert_eq!(
            LobbyAction::from_wire(1, 2),
            Some(LobbyAction::Upgrade(LoadoutTrack::Armor))
        );
        assert_eq!(LobbyAction::from_wire(1, 4), None);
        assert_eq!(LobbyAction::from_wire(2, 3), Some(LobbyAction::ChangeSlot(3)));
        assert_eq!(LobbyAction::from_wire(2, -1), None);
        assert_eq!(LobbyAction::from_wire(255, 0), Some(LobbyAction::KeepAlive));
        assert_eq!(LobbyAction::from_wire(7, 0), None);

        assert_eq!(
            LobbyAction::Upgrade(LoadoutTrack::Support).to_packet(),
            Packet::Input {
                action: 1,
                value: 3
            }
        );
    }

    #[test]
    fn two_players_ready_start_within_one_broadcast_cycle() {
        let now = Instant::now();
        let mut lobby = LobbyHost::new("Host", now);
        lobby.handle_join(remote(5000), "guest", now);

        assert!(lobby.handle_action(&PeerId::Local, LobbyAction::ToggleReady, now));
        assert!(lobby.handle_action(&remote(5000), LobbyAction::ToggleReady, now));

        let tick = lobby.tick(ROSTER_BROADCAST_INTERVAL, now);
        assert!(tick.start);
        match tick.roster {
            Some(Packet::LobbyState { roster }) => assert_eq!(roster.len(), 2),
            other => panic!("expected roster, got {other:?}"),
        }

        let roster = lobby.into_roster();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].slot, 0);
        assert_eq!(roster[1].slot, 1);
    }

    #[test]
    fn unready_session_blocks_start() {
        let now = Instant::now();
        let mut lobby = LobbyHost::new("Host", now);
        lobby.handle_join(remote(5000), "guest", now);
        lobby.handle_action(&PeerId::Local, LobbyAction::ToggleReady, now);

        let tick = lobby.tick(0.2, now);
        assert!(tick.roster.is_some());
        assert!(!tick.start);
    }

    #[test]
    fn roster_is_rebroadcast_on_cadence() {
        let now = Instant::now();
        let mut lobby = LobbyHost::new("Host", now);
        let mut broadcasts = 0;
        for _ in 0..60 {
            if lobby.tick(1.0 / 60.0, now).roster.is_some() {
                broadcasts += 1;
            }
        }
        assert!((8..=10).contains(&broadcasts), "got {broadcasts}");
    }

    #[test]
    fn ready_survives_loadout_change() {
        let now = Instant::now();
        let mut lobby = LobbyHost::new("Host", now);
        lobby.handle_action(&PeerId::Local, LobbyAction::ToggleReady, now);
        lobby.handle_action(&PeerId::Local, LobbyAction::Upgrade(LoadoutTrack::Melee), now);
        let host = lobby.registry().get(&PeerId::Local).unwrap();
        assert!(host.ready);
        assert_eq!(host.loadout.level(LoadoutTrack::Melee), 1);
    }

    #[test]
    fn unknown_sender_is_ignored() {
        let now = Instant::now();
        let mut lobby = LobbyHost::new("Host", now);
        assert!(!lobby.handle_action(&remote(1), LobbyAction::ToggleReady, now));
    }

    #[test]
    fn silent_guest_is_evicted_on_sweep() {
        let start = Instant::now();
        let mut lobby = LobbyHost::new("Host", start);
        lobby.handle_join(remote(5000), "guest", start);

        let later = start + SESSION_TIMEOUT;
        let mut evicted = Vec::new();
        for _ in 0..EVICTION_SWEEP_TICKS {
            evicted.extend(lobby.tick(1.0 / 60.0, later).evicted);
        }
        assert_eq!(evicted.len(), 1);
        assert_eq!(lobby.registry().len(), 1);
    }
}
