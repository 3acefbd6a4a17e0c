//! Game state and core simulation types
//!
//! Everything a running session mutates lives in [`GameState`]; nothing
//! outside it is touched by [`tick`](super::tick::tick).

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{HasBounds, Rect};
use super::spawner::Spawner;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing simulated yet
    Idle,
    /// Active gameplay
    Running,
    /// Hit an obstacle; waits for restart
    GameOver,
}

/// The runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner; x never changes during a session
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (negative is up)
    pub vel_y: f32,
    pub is_jumping: bool,
    pub is_ducking: bool,
}

impl Player {
    /// Standing on the ground line
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(tuning.player_x, tuning.standing_y()),
            size: Vec2::new(tuning.player_width, tuning.player_height),
            vel_y: 0.0,
            is_jumping: false,
            is_ducking: false,
        }
    }
}

impl HasBounds for Player {
    fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }
}

/// What an obstacle reads as on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleLabel {
    Bug,
    Deadline,
}

impl ObstacleLabel {
    pub const ALL: [ObstacleLabel; 2] = [ObstacleLabel::Bug, ObstacleLabel::Deadline];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleLabel::Bug => "BUG",
            ObstacleLabel::Deadline => "DEADLINE",
        }
    }
}

/// Obstacle altitude class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Sits on the ground; jump over it
    Ground,
    /// Hovers at head height; duck under it
    Flying,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    pub kind: ObstacleKind,
    pub label: ObstacleLabel,
}

impl HasBounds for Obstacle {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

/// Coffee pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coffee {
    pub id: u32,
    pub rect: Rect,
    pub collected: bool,
    /// Spawned above the ground (reachable without ducking)
    pub floating: bool,
}

impl HasBounds for Coffee {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

/// Temporary speed multiplier granted by coffee
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBoost {
    pub active: bool,
    /// Clock time (ms) at which the boost ends
    pub expires_at_ms: f64,
    pub multiplier: f32,
}

impl SpeedBoost {
    pub fn inactive(multiplier: f32) -> Self {
        Self {
            active: false,
            expires_at_ms: 0.0,
            multiplier,
        }
    }

    /// Remaining boost time in milliseconds (0 when inactive)
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        if self.active {
            (self.expires_at_ms - now_ms).max(0.0)
        } else {
            0.0
        }
    }
}

/// Counters for the current session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub score: u64,
    /// Coffee collected this session
    pub coffee: u32,
    /// Coffee collected across all sessions
    pub lifetime_coffee: u64,
}

/// Notable things that happened during a tick, for the host layer
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ObstacleSpawned { id: u32, kind: ObstacleKind },
    CoffeeSpawned { id: u32 },
    /// Coffee spawn was due but an obstacle was too close to the edge
    CoffeeSuppressed,
    ObstacleDodged { id: u32 },
    CoffeeCollected { id: u32 },
    BoostStarted { expires_at_ms: f64 },
    BoostEnded,
    GameOver { score: u64, coffee: u32 },
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Seed the RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Ticks simulated since the last start
    pub time_ticks: u64,
    pub player: Player,
    /// Active obstacles in spawn order
    pub obstacles: Vec<Obstacle>,
    /// Active coffee pickups in spawn order
    pub coffees: Vec<Coffee>,
    pub spawner: Spawner,
    pub boost: SpeedBoost,
    /// Speed without boost; grows every tick
    pub base_speed: f32,
    /// Speed entities actually move at
    pub speed: f32,
    pub stats: SessionStats,
    /// Events produced since the host last drained them
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create an idle session
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Idle,
            time_ticks: 0,
            player: Player::new(&tuning),
            obstacles: Vec::new(),
            coffees: Vec::new(),
            spawner: Spawner::new(&tuning, 0.0),
            boost: SpeedBoost::inactive(tuning.boost_multiplier),
            base_speed: tuning.base_speed,
            speed: tuning.base_speed,
            stats: SessionStats::default(),
            events: Vec::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Put an obstacle on the field (spawner and tests)
    pub fn push_obstacle(&mut self, rect: Rect, kind: ObstacleKind, label: ObstacleLabel) -> u32 {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle {
            id,
            rect,
            kind,
            label,
        });
        id
    }

    /// Put a coffee on the field (spawner and tests)
    pub fn push_coffee(&mut self, rect: Rect, floating: bool) -> u32 {
        let id = self.next_entity_id();
        self.coffees.push(Coffee {
            id,
            rect,
            collected: false,
            floating,
        });
        id
    }
}
