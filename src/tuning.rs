//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. Defaults reproduce the
//! shipped game; a JSON override may set any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Gameplay constants. Distances are in canvas pixels, speeds in pixels per
/// tick, durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    /// Width of the playfield; entities spawn at this x
    pub canvas_width: f32,
    /// Y of the player's top edge when standing
    pub ground_y: f32,

    // === Player ===
    pub player_x: f32,
    pub player_width: f32,
    pub player_height: f32,
    /// Height while ducking
    pub duck_height: f32,
    /// Offset below `ground_y` of the ducking player's top edge
    pub duck_offset: f32,
    /// Added to vertical velocity every tick while airborne
    pub gravity: f32,
    /// Vertical velocity applied on jump (negative is up)
    pub jump_impulse: f32,

    // === Speed ===
    pub base_speed: f32,
    /// Added to base speed every tick
    pub speed_increment: f32,
    pub boost_multiplier: f32,
    pub boost_duration_ms: f64,

    // === Obstacle spawning ===
    pub obstacle_interval_ms: f64,
    pub obstacle_interval_step_ms: f64,
    pub obstacle_interval_floor_ms: f64,
    /// Chance that a spawned obstacle is the flying variant
    pub flying_chance: f64,
    pub ground_obstacle_width: f32,
    pub ground_obstacle_height: f32,
    /// Offset below `ground_y` of a ground obstacle's top edge
    pub ground_obstacle_offset: f32,
    pub flying_obstacle_width: f32,
    pub flying_obstacle_height: f32,
    /// Offset above `ground_y` of a flying obstacle's top edge
    pub flying_obstacle_lift: f32,

    // === Coffee spawning ===
    pub coffee_interval_ms: f64,
    pub coffee_interval_step_ms: f64,
    pub coffee_interval_floor_ms: f64,
    /// Chance that a spawned coffee floats above the ground
    pub floating_chance: f64,
    pub coffee_size: f32,
    pub coffee_offset: f32,
    pub floating_coffee_lift: f32,
    /// No coffee spawns while an obstacle is within this many pixels of the
    /// right edge
    pub coffee_obstacle_gap: f32,

    // === Scoring ===
    pub points_per_tick: u64,
    pub points_per_coffee: u64,
    pub points_per_dodge: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            ground_y: 320.0,

            player_x: 100.0,
            player_width: 40.0,
            player_height: 50.0,
            duck_height: 20.0,
            duck_offset: 30.0,
            gravity: 0.6,
            jump_impulse: -12.0,

            base_speed: 3.0,
            speed_increment: 0.001,
            boost_multiplier: 2.0,
            boost_duration_ms: 5000.0,

            obstacle_interval_ms: 2000.0,
            obstacle_interval_step_ms: 5.0,
            obstacle_interval_floor_ms: 800.0,
            flying_chance: 0.4,
            ground_obstacle_width: 40.0,
            ground_obstacle_height: 25.0,
            ground_obstacle_offset: 20.0,
            flying_obstacle_width: 50.0,
            flying_obstacle_height: 30.0,
            flying_obstacle_lift: 15.0,

            coffee_interval_ms: 2500.0,
            coffee_interval_step_ms: 2.0,
            coffee_interval_floor_ms: 1500.0,
            floating_chance: 0.25,
            coffee_size: 20.0,
            coffee_offset: 25.0,
            floating_coffee_lift: 25.0,
            coffee_obstacle_gap: 120.0,

            points_per_tick: 1,
            points_per_coffee: 25,
            points_per_dodge: 10,
        }
    }
}

impl Tuning {
    /// Parse a JSON override. Missing fields keep their defaults; malformed
    /// input yields the defaults and out-of-range values are repaired.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Self>(json) {
            Ok(mut tuning) => {
                tuning.validate();
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring malformed tuning override: {}", e);
                Self::default()
            }
        }
    }

    /// Load tuning from a JSON file, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded tuning from {}", path.display());
                Self::from_json(&json)
            }
            Err(e) => {
                log::info!("Using default tuning ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reset any out-of-range field to its default, with a warning.
    /// Returns the names of the fields that were reset.
    pub fn validate(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let mut reset = Vec::new();

        let is_chance = |p: f64| (0.0..=1.0).contains(&p);
        if !is_chance(self.flying_chance) {
            self.flying_chance = defaults.flying_chance;
            reset.push("flying_chance");
        }
        if !is_chance(self.floating_chance) {
            self.floating_chance = defaults.floating_chance;
            reset.push("floating_chance");
        }
        if !(self.base_speed > 0.0) {
            self.base_speed = defaults.base_speed;
            reset.push("base_speed");
        }
        if !(self.speed_increment >= 0.0) {
            self.speed_increment = defaults.speed_increment;
            reset.push("speed_increment");
        }
        if !(self.boost_multiplier > 0.0) {
            self.boost_multiplier = defaults.boost_multiplier;
            reset.push("boost_multiplier");
        }

        // Each spawn ramp must start above zero, shrink by a non-negative
        // step and stop at a floor no higher than where it started
        if !(self.obstacle_interval_floor_ms > 0.0
            && self.obstacle_interval_step_ms >= 0.0
            && self.obstacle_interval_floor_ms <= self.obstacle_interval_ms)
        {
            self.obstacle_interval_ms = defaults.obstacle_interval_ms;
            self.obstacle_interval_step_ms = defaults.obstacle_interval_step_ms;
            self.obstacle_interval_floor_ms = defaults.obstacle_interval_floor_ms;
            reset.push("obstacle_interval");
        }
        if !(self.coffee_interval_floor_ms > 0.0
            && self.coffee_interval_step_ms >= 0.0
            && self.coffee_interval_floor_ms <= self.coffee_interval_ms)
        {
            self.coffee_interval_ms = defaults.coffee_interval_ms;
            self.coffee_interval_step_ms = defaults.coffee_interval_step_ms;
            self.coffee_interval_floor_ms = defaults.coffee_interval_floor_ms;
            reset.push("coffee_interval");
        }

        for field in &reset {
            log::warn!("Tuning value {} out of range; using default", field);
        }
        reset
    }

    /// Y of the standing player's top edge
    pub fn standing_y(&self) -> f32 {
        self.ground_y
    }

    /// Y of the ducking player's top edge
    pub fn ducking_y(&self) -> f32 {
        self.ground_y + self.duck_offset
    }
}
