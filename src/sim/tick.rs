//! Per-frame simulation step
//!
//! Stage order inside [`tick`] is fixed: boost expiry, physics, obstacle
//! movement, coffee movement, spawning, collisions, score and speed ramp.
//! Speed must be settled before anything moves, and collisions are tested
//! against positions already advanced for this tick.

use super::collision::is_colliding;
use super::spawner::{Spawner, spawn_entities};
use super::state::{GameEvent, GamePhase, GameState, ObstacleKind, Player, SpeedBoost};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Jump (Space)
    pub jump: bool,
    /// Start ducking (ArrowDown pressed)
    pub duck: bool,
    /// Stop ducking (ArrowDown released)
    pub release_duck: bool,
    /// Demo mode - the autopilot plays
    pub autopilot: bool,
}

/// Reset every per-session field and begin running. Lifetime coffee is kept.
pub fn start(state: &mut GameState, now_ms: f64) {
    let tuning = &state.tuning;
    state.player = Player::new(tuning);
    state.obstacles.clear();
    state.coffees.clear();
    state.spawner = Spawner::new(tuning, now_ms);
    state.boost = SpeedBoost::inactive(tuning.boost_multiplier);
    state.base_speed = tuning.base_speed;
    state.speed = tuning.base_speed;
    state.stats.score = 0;
    state.stats.coffee = 0;
    state.time_ticks = 0;
    state.events.clear();
    state.phase = GamePhase::Running;
    log::info!("Run started (seed {})", state.seed);
}

/// Advance the session by one tick at clock time `now_ms`
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: f64) {
    if state.phase != GamePhase::Running {
        return;
    }

    let input = if input.autopilot {
        autopilot_input(state)
    } else {
        input.clone()
    };
    apply_controls(state, &input);

    state.time_ticks += 1;

    update_boost(state, now_ms);
    state.player.integrate(&state.tuning);
    advance_obstacles(state);
    advance_coffees(state);
    spawn_entities(state, now_ms);

    if hit_obstacle(state) {
        game_over(state);
        return;
    }
    collect_coffees(state, now_ms);

    update_score(state);
}

fn apply_controls(state: &mut GameState, input: &TickInput) {
    let tuning = &state.tuning;
    let player = &mut state.player;
    if input.release_duck {
        player.stop_duck(tuning);
    }
    if input.jump {
        player.jump(tuning);
    }
    if input.duck {
        player.duck(tuning);
    }
}

/// Drop the boost once the clock passes its expiry
fn update_boost(state: &mut GameState, now_ms: f64) {
    if state.boost.active && now_ms >= state.boost.expires_at_ms {
        state.boost.active = false;
        state.speed = state.base_speed;
        state.events.push(GameEvent::BoostEnded);
        log::debug!("Speed boost ended");
    }
}

fn activate_boost(state: &mut GameState, now_ms: f64) {
    state.boost.active = true;
    state.boost.expires_at_ms = now_ms + state.tuning.boost_duration_ms;
    state.speed = state.base_speed * state.boost.multiplier;
    state.events.push(GameEvent::BoostStarted {
        expires_at_ms: state.boost.expires_at_ms,
    });
}

/// Scroll obstacles left; those fully off-screen count as dodged
fn advance_obstacles(state: &mut GameState) {
    let speed = state.speed;
    let mut dodged = Vec::new();
    state.obstacles.retain_mut(|obstacle| {
        obstacle.rect.pos.x -= speed;
        if obstacle.rect.right() < 0.0 {
            dodged.push(obstacle.id);
            false
        } else {
            true
        }
    });

    for id in dodged {
        state.stats.score += state.tuning.points_per_dodge;
        state.events.push(GameEvent::ObstacleDodged { id });
    }
}

/// Scroll coffee left and drop what left the screen
fn advance_coffees(state: &mut GameState) {
    let speed = state.speed;
    state.coffees.retain_mut(|coffee| {
        coffee.rect.pos.x -= speed;
        coffee.rect.right() >= 0.0
    });
}

/// First obstacle overlapping the player ends the run
fn hit_obstacle(state: &GameState) -> bool {
    state
        .obstacles
        .iter()
        .any(|obstacle| is_colliding(&state.player, obstacle))
}

fn collect_coffees(state: &mut GameState, now_ms: f64) {
    let mut collected = Vec::new();
    let player = &state.player;
    state.coffees.retain_mut(|coffee| {
        if !coffee.collected && is_colliding(player, &*coffee) {
            coffee.collected = true;
            collected.push(coffee.id);
            false
        } else {
            true
        }
    });

    for id in collected {
        state.stats.coffee += 1;
        state.stats.lifetime_coffee += 1;
        state.stats.score += state.tuning.points_per_coffee;
        state.events.push(GameEvent::CoffeeCollected { id });
        activate_boost(state, now_ms);
    }
}

/// Survival point and speed ramp
fn update_score(state: &mut GameState) {
    state.stats.score += state.tuning.points_per_tick;
    state.base_speed += state.tuning.speed_increment;
    state.speed = if state.boost.active {
        state.base_speed * state.boost.multiplier
    } else {
        state.base_speed
    };
}

fn game_over(state: &mut GameState) {
    state.phase = GamePhase::GameOver;
    state.boost = SpeedBoost::inactive(state.tuning.boost_multiplier);
    state.speed = state.base_speed;
    state.events.push(GameEvent::GameOver {
        score: state.stats.score,
        coffee: state.stats.coffee,
    });
    log::info!(
        "Game over after {} ticks: score {}, coffee {}",
        state.time_ticks,
        state.stats.score,
        state.stats.coffee
    );
}

/// Demo player: duck under flying obstacles, jump ground ones
fn autopilot_input(state: &GameState) -> TickInput {
    let player = &state.player;
    let speed = state.speed;

    // Closest obstacle that has not fully passed the player
    let threat = state
        .obstacles
        .iter()
        .filter(|o| o.rect.right() > player.pos.x)
        .min_by(|a, b| {
            a.rect
                .pos
                .x
                .partial_cmp(&b.rect.pos.x)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let mut input = TickInput::default();
    let Some(threat) = threat else {
        input.release_duck = player.is_ducking;
        return input;
    };

    let gap = threat.rect.left() - (player.pos.x + player.size.x);
    match threat.kind {
        ObstacleKind::Ground => {
            // Leave the ground a few ticks before contact
            if gap <= speed * 6.0 {
                input.release_duck = player.is_ducking;
                input.jump = true;
            }
        }
        ObstacleKind::Flying => {
            if gap <= speed * 10.0 {
                input.duck = !player.is_ducking;
            }
        }
    }
    input
}
