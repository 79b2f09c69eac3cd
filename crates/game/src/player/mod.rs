mod config;
mod controller;
mod state;

pub use config::BalanceConfig;
pub use controller::{PlayerController, SWEEP_HEIGHT, SWEEP_RADIUS, separate_players, try_push};
pub use state::{Cooldowns, MatchPlayer, PlayerAction, PlayerStats};
