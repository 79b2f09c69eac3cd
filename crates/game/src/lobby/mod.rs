mod client;
mod host;
mod session;

pub use client::{KEEP_ALIVE_INTERVAL, LobbyView, ROSTER_TIMEOUT};
pub use host::{EVICTION_SWEEP_TICKS, LobbyAction, LobbyHost, LobbyTick, ROSTER_BROADCAST_INTERVAL};
pub use session::{
    JoinOutcome, LOADOUT_TRACKS, Loadout, LoadoutTrack, MAX_LOADOUT_POINTS, MAX_PLAYERS,
    MAX_TRACK_LEVEL, PlayerSession, SESSION_TIMEOUT, SessionRegistry,
};
