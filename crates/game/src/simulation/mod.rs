mod combat;
mod match_state;
mod projectile;
mod tick;

pub use match_state::{
    ARENA_SOFT_INSET, DEFEAT_REASON, MatchOutcome, MatchState, PLAYER_HIT_RADIUS, VICTORY_REASON,
};
pub use projectile::{DISTANCE_CAP, PROJECTILE_RADIUS, Projectile};
pub use tick::{FixedTimestep, MAX_FRAME_DELTA};
