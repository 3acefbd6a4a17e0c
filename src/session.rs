//! A player's game session
//!
//! Owns the simulation state, the persisted profile and the knowledge about
//! the remote personal best. Turns raw control events into tick input and
//! finalizes each run on game over.

use crate::persistence::{KeyValueStore, Profile};
use crate::platform::Control;
use crate::service::{LeaderboardEntry, ReportEvent, Request, ServiceError};
use crate::sim::{self, GameEvent, GamePhase, GameState, TickInput};
use crate::tuning::Tuning;

pub struct Session {
    pub state: GameState,
    pub profile: Profile,
    store: Box<dyn KeyValueStore>,
    /// Best score acknowledged by the backend, once known
    pub personal_best: Option<u64>,
    /// Last leaderboard fetched, display only
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Most recent backend failure, for the UI
    pub last_service_error: Option<ServiceError>,
    /// Input accumulated since the last step
    input: TickInput,
    /// Backend calls waiting to be dispatched
    outbox: Vec<Request>,
}

impl Session {
    /// Idle session with the profile loaded from `store`
    pub fn new(seed: u64, tuning: Tuning, store: Box<dyn KeyValueStore>) -> Self {
        let profile = Profile::load(store.as_ref());
        let mut state = GameState::new(seed, tuning);
        state.stats.lifetime_coffee = profile.total_coffee;
        Self {
            state,
            profile,
            store,
            personal_best: None,
            leaderboard: Vec::new(),
            last_service_error: None,
            input: TickInput::default(),
            outbox: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Begin a fresh run (also used for restart)
    pub fn start(&mut self, now_ms: f64) {
        self.input = TickInput {
            autopilot: self.input.autopilot,
            ..Default::default()
        };
        self.state.stats.lifetime_coffee = self.profile.total_coffee;
        sim::start(&mut self.state, now_ms);
    }

    /// Queue a player command for the next step. Presses are ignored
    /// outside a run; releasing duck always goes through.
    pub fn control(&mut self, control: Control) {
        match control {
            Control::Jump if self.is_running() => self.input.jump = true,
            Control::Duck if self.is_running() => self.input.duck = true,
            Control::ReleaseDuck => {
                self.input.duck = false;
                self.input.release_duck = true;
            }
            _ => {}
        }
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.input.autopilot = enabled;
    }

    /// Run one tick and finalize the run if it ended
    pub fn step(&mut self, now_ms: f64) -> Vec<GameEvent> {
        sim::tick(&mut self.state, &self.input, now_ms);

        // Clear one-shot inputs after processing
        self.input.jump = false;
        self.input.duck = false;
        self.input.release_duck = false;

        let events = self.state.drain_events();
        for event in &events {
            if let GameEvent::GameOver { score, coffee } = *event {
                self.finish_run(score, coffee);
            }
        }
        events
    }

    fn finish_run(&mut self, score: u64, coffee: u32) {
        let known_best = self.personal_best.unwrap_or(self.profile.high_score);

        let rank = self
            .profile
            .record_run(score, coffee, self.state.stats.lifetime_coffee);
        if let Some(rank) = rank {
            log::info!("Run placed #{} on the local board", rank);
        }
        if let Err(e) = self.profile.save(self.store.as_mut()) {
            log::warn!("Could not save profile: {}", e);
        }

        if score > known_best {
            self.outbox.push(Request::Submit(score));
        }
    }

    /// Take the backend calls produced since the last call
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Fold a completed backend call into the session
    pub fn apply_report(&mut self, event: ReportEvent) {
        match event {
            ReportEvent::Submitted { score, .. } => {
                self.personal_best = Some(self.personal_best.unwrap_or(0).max(score));
                self.last_service_error = None;
            }
            ReportEvent::PersonalBest(best) => {
                self.personal_best = Some(best);
            }
            ReportEvent::Leaderboard(rows) => {
                self.leaderboard = rows;
            }
            ReportEvent::Failed { error, .. } => {
                self.last_service_error = Some(error);
            }
        }
    }

    /// Wipe the local board
    pub fn clear_profile(&mut self) {
        if let Err(e) = self.profile.clear(self.store.as_mut()) {
            log::warn!("Could not clear profile: {}", e);
        }
        self.state.stats.lifetime_coffee = 0;
    }

    /// Global leaderboard rows as display lines, best first
    pub fn leaderboard_lines(&self) -> Vec<String> {
        self.leaderboard
            .iter()
            .enumerate()
            .map(|(i, row)| format!("{}. {} {}", i + 1, row.identifier, row.score))
            .collect()
    }

    /// Local best runs as display lines
    pub fn best_score_lines(&self) -> Vec<String> {
        self.profile
            .best_scores
            .entries
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} ({} coffee)", i + 1, r.score, r.coffee))
            .collect()
    }

    /// Direct access to the backing store (host glue and tests)
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}
