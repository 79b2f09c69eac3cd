use std::fmt;

/// Host-side notable moments, drained by the binary for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined { name: String, slot: u8 },
    PlayerLeft { name: String, slot: u8 },
    PlayerEvicted { name: String, slot: u8 },
    SlotChanged { name: String, slot: u8 },
    MatchStarted { players: usize },
    EncounterActivated { id: usize, kind: &'static str },
    EncounterCompleted { id: usize, kind: &'static str },
    MatchEnded { reason: String },
}

impl GameEvent {
    /// Events that end or reshape the session.
    pub fn is_milestone(&self) -> bool {
        matches!(
            self,
            Self::MatchStarted { .. } | Self::EncounterCompleted { .. } | Self::MatchEnded { .. }
        )
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerJoined { name, slot } => write!(f, "{name} joined (slot {slot})"),
            Self::PlayerLeft { name, slot } => write!(f, "{name} left (slot {slot})"),
            Self::PlayerEvicted { name, slot } => write!(f, "{name} timed out (slot {slot})"),
            Self::SlotChanged { name, slot } => write!(f, "{name} moved to slot {slot}"),
            Self::MatchStarted { players } => write!(f, "match started with {players} players"),
            Self::EncounterActivated { id, kind } => write!(f, "encounter {id} ({kind}) activated"),
            Self::EncounterCompleted { id, kind } => write!(f, "encounter {id} ({kind}) completed"),
            Self::MatchEnded { reason } => write!(f, "match ended: {reason}"),
        }
    }
}
