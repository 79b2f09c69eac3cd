mod level;
mod objects;
mod testing_ground;

pub use level::{EncounterConfig, EncounterKindConfig, LevelConfig};
pub use objects::{ArenaBounds, Obstacle};
