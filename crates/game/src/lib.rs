pub mod config;
pub mod encounter;
pub mod event;
pub mod lobby;
pub mod map;
pub mod math;
pub mod net;
pub mod physics;
pub mod player;
pub mod session;
pub mod simulation;
pub mod snapshot;

pub use config::{ConfigError, load_ron};
pub use encounter::{Encounter, EncounterKind};
pub use event::{EventQueue, GameEvent};
pub use lobby::{LobbyAction, LobbyHost, LobbyView, PlayerSession, SessionRegistry};
pub use map::{ArenaBounds, EncounterConfig, EncounterKindConfig, LevelConfig, Obstacle};
pub use net::{
    DEFAULT_PORT, DEFAULT_TICK_RATE, GameState, InputCommand, NetworkEndpoint, NetworkStats,
    Packet, PacketError, PacketLossSimulation, PeerId, RosterEntry,
};
pub use physics::{PhysicsWorld, SweepHit, SweepQuery};
pub use player::{BalanceConfig, MatchPlayer};
pub use session::{ClientPhase, ClientSession, DisconnectReason, HostPhase, HostSession, HostSettings};
pub use simulation::{FixedTimestep, MatchOutcome, MatchState};
pub use snapshot::SnapshotView;
