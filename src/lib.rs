//! Bug Chase - a developer-themed endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions, scoring)
//! - `session`: One player's runs, profile bookkeeping and score submission
//! - `driver`: Frame scheduling around a session
//! - `platform`: Browser/native platform abstraction (clock, input)
//! - `persistence`: Local profile storage
//! - `service`: Remote score service client
//! - `highscores`: Bounded local best-runs board
//! - `tuning`: Data-driven game balance

pub mod driver;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod service;
pub mod session;
pub mod sim;
pub mod tuning;

pub use driver::{FrameDriver, FrameOutcome, FrameScheduler, PendingFrame};
pub use highscores::{BestScores, ScoreRecord};
pub use session::Session;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Nominal display frame length; one simulation tick per frame
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Upper bound on frames for a headless run
    pub const MAX_HEADLESS_FRAMES: u64 = 60 * 60 * 10;
}
