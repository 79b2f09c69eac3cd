use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::net::{PeerId, RosterEntry};

pub const MAX_PLAYERS: usize = 4;
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

pub const LOADOUT_TRACKS: usize = 4;
pub const MAX_TRACK_LEVEL: u8 = 3;
pub const MAX_LOADOUT_POINTS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadoutTrack {
    Melee = 0,
    Ranged = 1,
    Armor = 2,
    Support = 3,
}

impl LoadoutTrack {
    pub const ALL: [LoadoutTrack; LOADOUT_TRACKS] = [
        LoadoutTrack::Melee,
        LoadoutTrack::Ranged,
        LoadoutTrack::Armor,
        LoadoutTrack::Support,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Per-track upgrade levels chosen in the lobby.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    levels: [u8; LOADOUT_TRACKS],
}

impl Loadout {
    pub fn level(&self, track: LoadoutTrack) -> u8 {
        self.levels[track as usize]
    }

    pub fn points_spent(&self) -> u8 {
        self.levels.iter().sum()
    }

    /// A maxed track wraps to 0, and so does any track once the point pool
    /// is exhausted.
    pub fn upgrade(&mut self, track: LoadoutTrack) {
        let spent = self.points_spent();
        let level = &mut self.levels[track as usize];
        if *level >= MAX_TRACK_LEVEL || spent >= MAX_LOADOUT_POINTS {
            *level = 0;
        } else {
            *level += 1;
        }
    }

    pub fn to_wire(&self) -> [i32; LOADOUT_TRACKS] {
        self.levels.map(i32::from)
    }

    pub fn from_wire(levels: [i32; LOADOUT_TRACKS]) -> Self {
        Self {
            levels: levels.map(|l| l.clamp(0, i32::from(MAX_TRACK_LEVEL)) as u8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub name: String,
    pub slot: u8,
    pub ready: bool,
    pub loadout: Loadout,
    pub peer: PeerId,
    pub last_seen: Instant,
}

impl PlayerSession {
    pub fn new(name: impl Into<String>, slot: u8, peer: PeerId, now: Instant) -> Self {
        Self {
            name: name.into(),
            slot,
            ready: false,
            loadout: Loadout::default(),
            peer,
            last_seen: now,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    pub fn is_silent(&self, now: Instant, timeout: Duration) -> bool {
        !self.peer.is_local() && now.saturating_duration_since(self.last_seen) >= timeout
    }

    pub fn to_roster_entry(&self) -> RosterEntry {
        RosterEntry {
            name: self.name.clone(),
            slot: i32::from(self.slot),
            ready: self.ready,
            identity: self.peer.to_string(),
            loadout: self.loadout.to_wire(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { slot: u8 },
    Refreshed,
    Full,
}

/// Sessions keyed by transport identity, in join order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<PlayerSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerSession> {
        self.sessions.iter()
    }

    pub fn get(&self, peer: &PeerId) -> Option<&PlayerSession> {
        self.sessions.iter().find(|s| s.peer == *peer)
    }

    pub fn get_mut(&mut self, peer: &PeerId) -> Option<&mut PlayerSession> {
        self.sessions.iter_mut().find(|s| s.peer == *peer)
    }

    pub fn is_slot_taken(&self, slot: u8) -> bool {
        self.sessions.iter().any(|s| s.slot == slot)
    }

    pub fn lowest_free_slot(&self) -> Option<u8> {
        (0..MAX_PLAYERS as u8).find(|&slot| !self.is_slot_taken(slot))
    }

    pub fn join(&mut self, peer: PeerId, name: &str, now: Instant) -> JoinOutcome {
        if let Some(existing) = self.get_mut(&peer) {
            existing.touch(now);
            return JoinOutcome::Refreshed;
        }

        if self.sessions.len() >= MAX_PLAYERS {
            return JoinOutcome::Full;
        }

        let Some(slot) = self.lowest_free_slot() else {
            return JoinOutcome::Full;
        };

        self.sessions.push(PlayerSession::new(name, slot, peer, now));
        JoinOutcome::Joined { slot }
    }

    pub fn touch(&mut self, peer: &PeerId, now: Instant) -> bool {
        match self.get_mut(peer) {
            Some(session) => {
                session.touch(now);
                true
            }
            None => false,
        }
    }

    pub fn change_slot(&mut self, peer: &PeerId, slot: u8) -> bool {
        if usize::from(slot) >= MAX_PLAYERS || self.is_slot_taken(slot) {
            return false;
        }
        match self.get_mut(peer) {
            Some(session) => {
                session.slot = slot;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, peer: &PeerId) -> Option<PlayerSession> {
        let index = self.sessions.iter().position(|s| s.peer == *peer)?;
        Some(self.sessions.remove(index))
    }

    /// Removes every remote session silent for at least `timeout`.
    pub fn evict_silent(&mut self, now: Instant, timeout: Duration) -> Vec<PlayerSession> {
        let mut evicted = Vec::new();
        let mut i = 0;
        while i < self.sessions.len() {
            if self.sessions[i].is_silent(now, timeout) {
                evicted.push(self.sessions.remove(i));
            } else {
                i += 1;
            }
        }
        evicted
    }

    pub fn all_ready(&self) -> bool {
        !self.sessions.is_empty() && self.sessions.iter().all(|s| s.ready)
    }

    pub fn remote_addrs(&self) -> Vec<SocketAddr> {
        self.sessions.iter().filter_map(|s| s.peer.addr()).collect()
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.sessions.iter().map(PlayerSession::to_roster_entry).collect()
    }

    pub fn into_sessions(self) -> Vec<PlayerSession> {
        self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn remote(port: u16) -> PeerId {
        PeerId::Remote(SocketAddr::from(([10, 0, 0, 1], port)))
    }

    #[test]
    fn upgrade_wraps_maxed_track() {
        let mut loadout = Loadout::default();
        for _ in 0..3 {
            loadout.upgrade(LoadoutTrack::Melee);
        }
        assert_eq!(loadout.level(LoadoutTrack::Melee), 3);
        loadout.upgrade(LoadoutTrack::Melee);
        assert_eq!(loadout.level(LoadoutTrack::Melee), 0);
    }

    #[test]
    fn upgrade_past_point_pool_resets_requested_track() {
        let mut loadout = Loadout::default();
        loadout.upgrade(LoadoutTrack::Melee);
        loadout.upgrade(LoadoutTrack::Melee);
        loadout.upgrade(LoadoutTrack::Ranged);
        loadout.upgrade(LoadoutTrack::Armor);
        assert_eq!(loadout.points_spent(), 4);

        loadout.upgrade(LoadoutTrack::Ranged);
        assert_eq!(loadout.level(LoadoutTrack::Ranged), 0);
        assert_eq!(loadout.level(LoadoutTrack::Melee), 2);
        assert_eq!(loadout.points_spent(), 3);
    }

    #[test]
    fn join_assigns_lowest_free_slot_and_drops_fifth() {
        let now = Instant::now();
        let mut registry = SessionRegistry::new();
        assert_eq!(
            registry.join(PeerId::Local, "Host", now),
            JoinOutcome::Joined { slot: 0 }
        );
        for port in 1..4 {
            assert!(matches!(
                registry.join(remote(port), "p", now),
                JoinOutcome::Joined { .. }
            ));
        }
        assert_eq!(registry.join(remote(9), "late", now), JoinOutcome::Full);
        assert_eq!(registry.len(), 4);

        registry.remove(&remote(2));
        assert_eq!(
            registry.join(remote(9), "late", now),
            JoinOutcome::Joined { slot: 2 }
        );
    }

    #[test]
    fn rejoin_only_refreshes_timestamp() {
        let start = Instant::now();
        let later = start + Duration::from_secs(3);
        let mut registry = SessionRegistry::new();
        registry.join(remote(1), "bob", start);
        assert_eq!(registry.join(remote(1), "bob", later), JoinOutcome::Refreshed);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&remote(1)).unwrap().last_seen, later);
    }

    #[test]
    fn slot_change_requires_empty_slot() {
        let now = Instant::now();
        let mut registry = SessionRegistry::new();
        registry.join(PeerId::Local, "Host", now);
        registry.join(remote(1), "bob", now);

        assert!(!registry.change_slot(&remote(1), 0));
        assert!(!registry.change_slot(&remote(1), 4));
        assert!(registry.change_slot(&remote(1), 3));
        assert_eq!(registry.get(&remote(1)).unwrap().slot, 3);
        assert_eq!(registry.lowest_free_slot(), Some(1));
    }

    #[test]
    fn eviction_spares_local_and_runs_once() {
        let start = Instant::now();
        let mut registry = SessionRegistry::new();
        registry.join(PeerId::Local, "Host", start);
        registry.join(remote(1), "quiet", start);
        registry.join(remote(2), "chatty", start);
        registry.touch(&remote(2), start + Duration::from_secs(4));

        let at = start + Duration::from_secs(5);
        let evicted = registry.evict_silent(at, SESSION_TIMEOUT);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].name, "quiet");

        assert!(registry.evict_silent(at, SESSION_TIMEOUT).is_empty());
        assert!(
            registry
                .evict_silent(start + Duration::from_secs(60), SESSION_TIMEOUT)
                .iter()
                .all(|s| s.name == "chatty")
        );
        assert!(registry.get(&PeerId::Local).is_some());
    }

    #[test]
    fn all_ready_needs_at_least_one_session() {
        let now = Instant::now();
        let mut registry = SessionRegistry::new();
        assert!(!registry.all_ready());
        registry.join(PeerId::Local, "Host", now);
        assert!(!registry.all_ready());
        registry.get_mut(&PeerId::Local).unwrap().ready = true;
        assert!(registry.all_ready());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Join(u16),
        Leave(u16),
        Slot(u16, u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u16..8).prop_map(Op::Join),
            (0u16..8).prop_map(Op::Leave),
            ((0u16..8), (0u8..6)).prop_map(|(p, s)| Op::Slot(p, s)),
        ]
    }

    proptest! {
        #[test]
        fn loadout_never_exceeds_point_pool(tracks in prop::collection::vec(0usize..4, 0..64)) {
            let mut loadout = Loadout::default();
            for t in tracks {
                let track = LoadoutTrack::ALL[t];
                let before = loadout.level(track);
                loadout.upgrade(track);
                prop_assert!(loadout.points_spent() <= MAX_LOADOUT_POINTS);
                prop_assert!(loadout.level(track) <= MAX_TRACK_LEVEL);
                if before == MAX_TRACK_LEVEL {
                    prop_assert_eq!(loadout.level(track), 0);
                }
            }
        }

        #[test]
        fn slots_stay_unique(ops in prop::collection::vec(op(), 0..64)) {
            let now = Instant::now();
            let mut registry = SessionRegistry::new();
            for op in ops {
                match op {
                    Op::Join(p) => { registry.join(remote(p), "p", now); }
                    Op::Leave(p) => { registry.remove(&remote(p)); }
                    Op::Slot(p, s) => { registry.change_slot(&remote(p), s); }
                }
                let mut slots: Vec<u8> = registry.iter().map(|s| s.slot).collect();
                prop_assert!(slots.iter().all(|&s| usize::from(s) < MAX_PLAYERS));
                slots.sort_unstable();
                slots.dedup();
                prop_assert_eq!(slots.len(), registry.len());
            }
        }
    }
}
