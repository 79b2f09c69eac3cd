use crate::net::{Packet, RosterEntry};

use super::host::LobbyAction;

pub const KEEP_ALIVE_INTERVAL: f32 = 1.0;
pub const ROSTER_TIMEOUT: f32 = 5.0;

/// Non-authority view of the lobby: the last roster received plus the
/// keep-alive and silence timers.
#[derive(Debug, Default)]
pub struct LobbyView {
    roster: Vec<RosterEntry>,
    keep_alive_timer: f32,
    since_roster: f32,
}

impl LobbyView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn apply_roster(&mut self, roster: Vec<RosterEntry>) {
        self.roster = roster;
        self.since_roster = 0.0;
    }

    /// Returns a keep-alive packet when one is due.
    pub fn tick(&mut self, dt: f32) -> Option<Packet> {
        self.since_roster += dt;
        self.keep_alive_timer += dt;
        if self.keep_alive_timer >= KEEP_ALIVE_INTERVAL {
            self.keep_alive_timer = 0.0;
            return Some(LobbyAction::KeepAlive.to_packet());
        }
        None
    }

    pub fn is_timed_out(&self) -> bool {
        self.since_roster >= ROSTER_TIMEOUT
    }

    pub fn into_roster(self) -> Vec<RosterEntry> {
        self.roster
    }
}
