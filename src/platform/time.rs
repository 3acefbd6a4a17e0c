//! Monotonic clocks
//!
//! The simulation never reads time itself; hosts inject a [`Clock`] so
//! tests can drive spawn timers and boost expiry with virtual time.

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds since an arbitrary fixed origin; never goes backwards
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        debug_assert!(ms >= 0.0, "clock must not go backwards");
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        debug_assert!(ms >= self.now.get(), "clock must not go backwards");
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Wall clock: `Instant` on native, `performance.now()` in the browser
#[derive(Debug, Clone)]
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}
