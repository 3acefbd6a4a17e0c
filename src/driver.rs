//! Frame driver
//!
//! Bridges a [`Session`] to whatever produces display frames. The host asks
//! the [`FrameScheduler`] for frames; the driver only requests the next one
//! while the run is still going, and cancels on teardown, so a frame never
//! fires for a finished or dismantled session.

use crate::platform::{Clock, ManualClock};
use crate::service::{Request, ScoreReporter};
use crate::session::Session;
use crate::sim::GameEvent;

/// Something that can arrange for [`FrameDriver::frame`] to be called once
pub trait FrameScheduler {
    fn request_frame(&mut self);
    fn cancel_frame(&mut self);
}

/// Scheduler that just remembers whether a frame is wanted. Headless runs
/// and tests poll it; the browser host turns it into `requestAnimationFrame`
/// and records the callback handle so teardown can cancel it.
#[derive(Debug, Clone, Default)]
pub struct PendingFrame {
    pending: bool,
    /// Host callback currently registered for the next frame
    handle: Option<i32>,
    /// Registered callback that was cancelled and must be revoked by the host
    cancelled: Option<i32>,
    /// Total frames ever requested
    pub requested: u64,
}

impl PendingFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, if any
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// The host registered a callback for the request it just took
    pub fn scheduled(&mut self, handle: i32) {
        self.handle = Some(handle);
    }

    /// The registered callback is running
    pub fn fired(&mut self) {
        self.handle = None;
    }

    pub fn handle(&self) -> Option<i32> {
        self.handle
    }

    /// Handle of a registered callback the host still has to revoke
    pub fn take_cancelled(&mut self) -> Option<i32> {
        self.cancelled.take()
    }
}

impl FrameScheduler for PendingFrame {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requested += 1;
    }

    fn cancel_frame(&mut self) {
        self.pending = false;
        if let Some(handle) = self.handle.take() {
            self.cancelled = Some(handle);
        }
    }
}

/// Whether the loop goes on after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Stopped,
}

pub struct FrameDriver<C: Clock, F: FrameScheduler> {
    pub session: Session,
    clock: C,
    scheduler: F,
    reporter: Option<ScoreReporter>,
    torn_down: bool,
}

impl<C: Clock, F: FrameScheduler> FrameDriver<C, F> {
    pub fn new(session: Session, clock: C, scheduler: F) -> Self {
        Self {
            session,
            clock,
            scheduler,
            reporter: None,
            torn_down: false,
        }
    }

    /// Attach a backend and ask it for the personal best and leaderboard
    pub fn with_reporter(mut self, mut reporter: ScoreReporter) -> Self {
        reporter.fetch_personal_best();
        reporter.fetch_leaderboard();
        self.reporter = Some(reporter);
        self
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn reporter(&self) -> Option<&ScoreReporter> {
        self.reporter.as_ref()
    }

    /// Start a run and request its first frame
    pub fn start(&mut self) {
        if self.torn_down {
            log::warn!("Ignoring start on a torn-down driver");
            return;
        }
        self.session.start(self.clock.now_ms());
        self.scheduler.request_frame();
    }

    pub fn restart(&mut self) {
        self.start();
    }

    /// Advance one frame. Requests the next frame only if still running.
    pub fn frame(&mut self) -> (FrameOutcome, Vec<GameEvent>) {
        if self.torn_down || !self.session.is_running() {
            return (FrameOutcome::Stopped, Vec::new());
        }

        let events = self.session.step(self.clock.now_ms());
        self.pump();

        if self.session.is_running() {
            self.scheduler.request_frame();
            (FrameOutcome::Continue, events)
        } else {
            (FrameOutcome::Stopped, events)
        }
    }

    /// Dispatch queued backend calls and fold in finished ones. Without a
    /// reporter the calls stay queued on the session for the host to take.
    pub fn pump(&mut self) {
        let Some(reporter) = self.reporter.as_mut() else {
            return;
        };
        for request in self.session.take_requests() {
            match request {
                Request::Submit(score) => reporter.submit_score(score),
                Request::PersonalBest => reporter.fetch_personal_best(),
                Request::Leaderboard => reporter.fetch_leaderboard(),
            }
        }
        for event in reporter.poll() {
            self.session.apply_report(event);
        }
    }

    /// Stop for good: cancel any pending frame
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.scheduler.cancel_frame();
        log::info!("Driver torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<C: Clock, F: FrameScheduler> FrameDriver<C, F> {
    /// Pump until every backend call in flight has reported back or
    /// `timeout` passes. Returns whether everything settled.
    pub fn settle(&mut self, timeout: std::time::Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            self.pump();
            let in_flight = self.reporter.as_ref().map_or(0, |r| r.in_flight());
            if in_flight == 0 {
                return true;
            }
            if std::time::Instant::now() >= deadline {
                log::warn!("{} score service calls still pending", in_flight);
                return false;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }
}

impl FrameDriver<ManualClock, PendingFrame> {
    /// Drive frames on virtual time until the run stops or `max_frames`
    /// have run. Returns the number of frames executed.
    pub fn run_headless(&mut self, frame_ms: f64, max_frames: u64) -> u64 {
        let mut frames = 0;
        while frames < max_frames && self.scheduler.take() {
            self.clock.advance(frame_ms);
            self.frame();
            frames += 1;
        }
        frames
    }
}
