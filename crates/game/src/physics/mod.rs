mod sweep;
mod world;

pub use sweep::{SweepHit, SweepQuery};
pub use world::PhysicsWorld;

#[cfg(test)]
pub(crate) use sweep::testing;
