//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in as a parameter, never read from the system
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, storage or network dependencies

pub mod collision;
pub mod physics;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{HasBounds, Rect, is_colliding};
pub use spawner::Spawner;
pub use state::{
    Coffee, GameEvent, GamePhase, GameState, Obstacle, ObstacleKind, ObstacleLabel, Player,
    SessionStats, SpeedBoost,
};
pub use tick::{TickInput, start, tick};
