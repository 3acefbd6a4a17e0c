//! Procedural obstacle and coffee generation
//!
//! Two independent timers run against the session clock. Each spawn
//! shortens its own interval a little, down to a floor, so difficulty
//! ramps over a run.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::state::{GameEvent, GameState, ObstacleKind, ObstacleLabel};
use crate::tuning::Tuning;

/// Spawn timers and current intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    /// Clock time (ms) of the last obstacle spawn
    pub last_obstacle_ms: f64,
    /// Clock time (ms) of the last coffee spawn attempt
    pub last_coffee_ms: f64,
    pub obstacle_interval_ms: f64,
    pub coffee_interval_ms: f64,
}

impl Spawner {
    /// Fresh timers anchored at `now_ms`. Used both at construction and on
    /// every start, so there is one reset policy.
    pub fn new(tuning: &Tuning, now_ms: f64) -> Self {
        Self {
            last_obstacle_ms: now_ms,
            last_coffee_ms: now_ms,
            obstacle_interval_ms: tuning.obstacle_interval_ms,
            coffee_interval_ms: tuning.coffee_interval_ms,
        }
    }

    /// True (and timer rearmed) when an obstacle is due
    fn obstacle_due(&mut self, tuning: &Tuning, now_ms: f64) -> bool {
        if now_ms - self.last_obstacle_ms > self.obstacle_interval_ms {
            self.last_obstacle_ms = now_ms;
            self.obstacle_interval_ms = (self.obstacle_interval_ms
                - tuning.obstacle_interval_step_ms)
                .max(tuning.obstacle_interval_floor_ms);
            true
        } else {
            false
        }
    }

    /// True (and timer rearmed) when a coffee is due. The timer rearms even
    /// if the spawn ends up suppressed.
    fn coffee_due(&mut self, tuning: &Tuning, now_ms: f64) -> bool {
        if now_ms - self.last_coffee_ms > self.coffee_interval_ms {
            self.last_coffee_ms = now_ms;
            self.coffee_interval_ms = (self.coffee_interval_ms - tuning.coffee_interval_step_ms)
                .max(tuning.coffee_interval_floor_ms);
            true
        } else {
            false
        }
    }
}

/// Spawn whatever is due at `now_ms`
pub fn spawn_entities(state: &mut GameState, now_ms: f64) {
    if state.spawner.obstacle_due(&state.tuning, now_ms) {
        spawn_obstacle(state);
    }

    if state.spawner.coffee_due(&state.tuning, now_ms) {
        spawn_coffee(state);
    }
}

/// Place a new obstacle at the right edge
pub fn spawn_obstacle(state: &mut GameState) {
    let label = ObstacleLabel::ALL[state.rng.random_range(0..ObstacleLabel::ALL.len())];
    let flying = state.rng.random_bool(state.tuning.flying_chance);

    let t = &state.tuning;
    let (kind, rect) = if flying {
        (
            ObstacleKind::Flying,
            Rect::new(
                t.canvas_width,
                t.ground_y - t.flying_obstacle_lift,
                t.flying_obstacle_width,
                t.flying_obstacle_height,
            ),
        )
    } else {
        (
            ObstacleKind::Ground,
            Rect::new(
                t.canvas_width,
                t.ground_y + t.ground_obstacle_offset,
                t.ground_obstacle_width,
                t.ground_obstacle_height,
            ),
        )
    };

    let id = state.push_obstacle(rect, kind, label);
    log::debug!("Spawned {:?} {} obstacle #{}", kind, label.as_str(), id);
    state.events.push(GameEvent::ObstacleSpawned { id, kind });
}

/// Whether an obstacle is still close enough to the right edge to block a
/// coffee spawn
pub fn coffee_blocked(state: &GameState) -> bool {
    let threshold = state.tuning.canvas_width - state.tuning.coffee_obstacle_gap;
    state.obstacles.iter().any(|o| o.rect.pos.x > threshold)
}

/// Place a new coffee at the right edge unless an obstacle is too close
pub fn spawn_coffee(state: &mut GameState) {
    if coffee_blocked(state) {
        log::debug!("Coffee spawn suppressed by nearby obstacle");
        state.events.push(GameEvent::CoffeeSuppressed);
        return;
    }

    let floating = state.rng.random_bool(state.tuning.floating_chance);
    let t = &state.tuning;
    let y = if floating {
        t.ground_y - t.floating_coffee_lift
    } else {
        t.ground_y + t.coffee_offset
    };
    let rect = Rect::new(t.canvas_width, y, t.coffee_size, t.coffee_size);

    let id = state.push_coffee(rect, floating);
    log::debug!("Spawned coffee #{} (floating: {})", id, floating);
    state.events.push(GameEvent::CoffeeSpawned { id });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(7, Tuning::default())
    }

    #[test]
    fn test_nothing_due_before_interval() {
        let mut s = state();
        spawn_entities(&mut s, 2000.0);
        assert!(s.obstacles.is_empty());
        assert!(s.coffees.is_empty());
    }

    #[test]
    fn test_obstacle_interval_decays_to_floor() {
        let mut s = state();
        let mut now = 0.0;
        let mut last_interval = s.spawner.obstacle_interval_ms;
        for _ in 0..400 {
            now += s.spawner.obstacle_interval_ms + 1.0;
            spawn_entities(&mut s, now);
            assert!(s.spawner.obstacle_interval_ms <= last_interval);
            assert!(s.spawner.obstacle_interval_ms >= 800.0);
            last_interval = s.spawner.obstacle_interval_ms;
        }
        assert_eq!(s.spawner.obstacle_interval_ms, 800.0);
        assert_eq!(s.obstacles.len(), 400);
    }

    #[test]
    fn test_obstacle_shapes() {
        let mut s = state();
        for _ in 0..200 {
            spawn_obstacle(&mut s);
        }
        let flying = s
            .obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Flying)
            .count();
        // 40% nominal
        assert!((40..=120).contains(&flying), "flying count {}", flying);

        for o in &s.obstacles {
            assert_eq!(o.rect.pos.x, 800.0);
            match o.kind {
                ObstacleKind::Ground => {
                    assert_eq!(o.rect.pos.y, 340.0);
                    assert_eq!(o.rect.size.x, 40.0);
                    assert_eq!(o.rect.size.y, 25.0);
                }
                ObstacleKind::Flying => {
                    assert_eq!(o.rect.pos.y, 305.0);
                    assert_eq!(o.rect.size.x, 50.0);
                    assert_eq!(o.rect.size.y, 30.0);
                }
            }
        }
    }

    #[test]
    fn test_coffee_shapes() {
        let mut s = state();
        for _ in 0..200 {
            spawn_coffee(&mut s);
        }
        let floating = s.coffees.iter().filter(|c| c.floating).count();
        // 25% nominal
        assert!((20..=80).contains(&floating), "floating count {}", floating);

        for c in &s.coffees {
            assert_eq!(c.rect.pos.x, 800.0);
            assert_eq!(c.rect.size.x, 20.0);
            assert_eq!(c.rect.size.y, 20.0);
            assert!(!c.collected);
            if c.floating {
                assert_eq!(c.rect.pos.y, 295.0);
            } else {
                assert_eq!(c.rect.pos.y, 345.0);
            }
        }
    }

    #[test]
    fn test_both_labels_appear() {
        let mut s = state();
        for _ in 0..50 {
            spawn_obstacle(&mut s);
        }
        assert!(s.obstacles.iter().any(|o| o.label == ObstacleLabel::Bug));
        assert!(s.obstacles.iter().any(|o| o.label == ObstacleLabel::Deadline));
    }

    #[test]
    fn test_coffee_suppressed_near_edge() {
        let mut s = state();
        s.push_obstacle(
            Rect::new(700.0, 340.0, 40.0, 25.0),
            ObstacleKind::Ground,
            ObstacleLabel::Bug,
        );
        spawn_coffee(&mut s);
        assert!(s.coffees.is_empty());
        assert!(s.events.contains(&GameEvent::CoffeeSuppressed));

        // Exactly at the threshold is not "within" the gap
        s.obstacles[0].rect.pos.x = 680.0;
        spawn_coffee(&mut s);
        assert_eq!(s.coffees.len(), 1);
    }

    #[test]
    fn test_suppressed_coffee_still_rearms_timer() {
        let mut s = state();
        s.push_obstacle(
            Rect::new(790.0, 340.0, 40.0, 25.0),
            ObstacleKind::Ground,
            ObstacleLabel::Deadline,
        );
        spawn_entities(&mut s, 2501.0);
        assert!(s.coffees.is_empty());
        assert_eq!(s.spawner.last_coffee_ms, 2501.0);
        assert_eq!(s.spawner.coffee_interval_ms, 2498.0);
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = state();
        let mut b = state();
        for _ in 0..30 {
            spawn_obstacle(&mut a);
            spawn_obstacle(&mut b);
        }
        let kinds_a: Vec<_> = a.obstacles.iter().map(|o| (o.kind, o.label)).collect();
        let kinds_b: Vec<_> = b.obstacles.iter().map(|o| (o.kind, o.label)).collect();
        assert_eq!(kinds_a, kinds_b);
    }
}
