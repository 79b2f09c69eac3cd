mod codec;
mod endpoint;
mod peer;
mod protocol;
mod repeat;
mod stats;

pub use codec::{PacketError, WireReader, WireWriter};
pub use endpoint::{Datagram, NetworkEndpoint};
pub use peer::{HOST_IDENTITY, PeerId, PeerIdError};
pub use protocol::{
    DEFAULT_PORT, DEFAULT_TICK_RATE, EncounterDetail, EncounterState, GameState, InputCommand,
    MAX_DATAGRAM_SIZE, Packet, PlateState, PlayerState, RosterEntry,
};
pub use repeat::{RepeatedSend, Repeater};
pub use stats::{NetworkStats, PacketLossSimulation};
