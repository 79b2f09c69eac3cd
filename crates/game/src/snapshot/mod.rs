mod view;

pub use view::{CooldownFractions, CooldownLimits, SnapshotView};
