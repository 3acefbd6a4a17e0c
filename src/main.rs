//! Bug Chase entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::Value;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{KeyboardEvent, RequestInit, RequestMode, Response};

    use bug_chase::persistence::{KeyValueStore, LocalStore, MemoryStore};
    use bug_chase::platform::{Clock, SystemClock, control_for_key_down, control_for_key_up};
    use bug_chase::service::{
        ReportEvent, Request, ServiceConfig, ServiceError, SubmitAck, decode_body,
        decode_leaderboard, decode_personal_best, submit_body,
    };
    use bug_chase::sim::{GameEvent, GamePhase};
    use bug_chase::{FrameDriver, FrameOutcome, PendingFrame, Session, Tuning};

    type Driver = FrameDriver<SystemClock, PendingFrame>;

    /// Game instance shared by the frame loop and the DOM handlers
    struct Game {
        driver: Driver,
        service: ServiceConfig,
        /// Backend results delivered by fetch futures, applied on the next frame
        inbox: Rc<RefCell<Vec<ReportEvent>>>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let store: Box<dyn KeyValueStore> = match LocalStore::open() {
                Ok(store) => Box::new(store),
                Err(e) => {
                    log::warn!("{}; progress will not be saved", e);
                    Box::new(MemoryStore::new())
                }
            };
            let service = ServiceConfig::resolve(store.as_ref());
            let session = Session::new(seed, Tuning::default(), store);
            let mut game = Self {
                driver: FrameDriver::new(session, SystemClock::new(), PendingFrame::new()),
                service,
                inbox: Rc::new(RefCell::new(Vec::new())),
            };
            game.dispatch(Request::PersonalBest);
            game.dispatch(Request::Leaderboard);
            game
        }

        fn frame(&mut self) -> FrameOutcome {
            for event in self.inbox.borrow_mut().drain(..) {
                self.driver.session.apply_report(event);
            }

            let (outcome, events) = self.driver.frame();
            for event in &events {
                if let GameEvent::GameOver { score, coffee } = event {
                    log::info!("Game over: {} points, {} coffee", score, coffee);
                }
            }
            for request in self.driver.session.take_requests() {
                self.dispatch(request);
            }
            self.update_hud();
            outcome
        }

        fn dispatch(&self, request: Request) {
            let config = self.service.clone();
            let inbox = self.inbox.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = execute(&config, request).await.unwrap_or_else(|error| {
                    log::warn!("Score service {:?} failed: {}", request, error);
                    ReportEvent::Failed { request, error }
                });
                inbox.borrow_mut().push(event);
            });
        }

        fn update_hud(&self) {
            let session = &self.driver.session;
            let stats = &session.state.stats;
            set_text("score", &stats.score.to_string());
            set_text("coffee", &stats.coffee.to_string());
            set_text("total-coffee", &stats.lifetime_coffee.to_string());
            set_text("high-score", &session.profile.high_score.to_string());

            let boost = &session.state.boost;
            if boost.active {
                let now = self.driver.clock().now_ms();
                set_text("boost", &format!("{:.1}s", boost.remaining_ms(now) / 1000.0));
            } else {
                set_text("boost", "");
            }

            match session.personal_best {
                Some(best) => set_text("personal-best", &best.to_string()),
                None => set_text("personal-best", "-"),
            }
            match &session.last_service_error {
                Some(e) => set_text("service-status", &e.to_string()),
                None => set_text("service-status", ""),
            }

            let over = session.phase() == GamePhase::GameOver;
            set_visible("game-over", over);
            set_visible("start-prompt", session.phase() == GamePhase::Idle);
            if over {
                set_text("final-score", &stats.score.to_string());
                set_text("final-coffee", &stats.coffee.to_string());
            }
            set_text("best-scores", &session.best_score_lines().join("\n"));
            set_text("leaderboard", &session.leaderboard_lines().join("\n"));
        }
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(id: &str, visible: bool) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    async fn execute(config: &ServiceConfig, request: Request) -> Result<ReportEvent, ServiceError> {
        match request {
            Request::Submit(score) => {
                fetch_json(config, "POST", "submit", Some(submit_body(score))).await?;
                Ok(ReportEvent::Submitted {
                    score,
                    ack: SubmitAck { score },
                })
            }
            Request::PersonalBest => {
                let value = fetch_json(config, "GET", "highscore", None).await?;
                decode_personal_best(&value).map(ReportEvent::PersonalBest)
            }
            Request::Leaderboard => {
                let value = fetch_json(config, "GET", "leaderboard", None).await?;
                decode_leaderboard(value).map(ReportEvent::Leaderboard)
            }
        }
    }

    fn js_error(e: JsValue) -> ServiceError {
        ServiceError::Network(format!("{:?}", e))
    }

    async fn fetch_json(
        config: &ServiceConfig,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ServiceError> {
        let bearer = config.bearer()?;

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = body {
            opts.set_body(&JsValue::from_str(&body.to_string()));
        }

        let request = web_sys::Request::new_with_str_and_init(&config.endpoint(path), &opts)
            .map_err(js_error)?;
        let headers = request.headers();
        headers.set("Authorization", &bearer).map_err(js_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_error)?;

        let window = web_sys::window().ok_or_else(|| ServiceError::Network("no window".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();

        if !response.ok() {
            return Err(ServiceError::Status {
                code: response.status(),
                message: text,
            });
        }
        decode_body(&text)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
        }

        let seed = js_sys::Date::now() as u64;
        log::info!("Bug Chase starting with seed {}", seed);

        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow().update_hud();

        setup_input_handlers(game.clone());
        setup_restart_button(game.clone());
        setup_clear_button(game.clone());
        setup_teardown(game);
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Key down: Space starts a run when none is going, then jump/duck
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if code == "Space" || code == "ArrowDown" {
                    event.prevent_default();
                }
                let start = {
                    let mut g = game.borrow_mut();
                    if !g.driver.session.is_running() && code == "Space" {
                        g.driver.start();
                        true
                    } else {
                        if let Some(control) = control_for_key_down(&code) {
                            g.driver.session.control(control);
                        }
                        false
                    }
                };
                if start {
                    schedule(game.clone());
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up: release duck
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(control) = control_for_key_up(&event.code()) {
                    game.borrow_mut().driver.session.control(control);
                }
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Turn a pending frame request into a `requestAnimationFrame` callback
    fn schedule(game: Rc<RefCell<Game>>) {
        if !game.borrow_mut().driver.scheduler_mut().take() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback_game = game.clone();
        let closure = Closure::once(move |_time: f64| {
            game_loop(callback_game);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => game.borrow_mut().driver.scheduler_mut().scheduled(handle),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        game.borrow_mut().driver.scheduler_mut().fired();
        let outcome = game.borrow_mut().frame();
        if outcome == FrameOutcome::Continue {
            schedule(game);
        }
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                {
                    let mut g = game.borrow_mut();
                    if g.driver.session.phase() == GamePhase::Running {
                        return;
                    }
                    g.driver.restart();
                    log::info!("Restarted");
                }
                schedule(game.clone());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Wipe the local board and lifetime coffee, between runs only
    fn setup_clear_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id("clear-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if g.driver.session.is_running() {
                    return;
                }
                g.driver.session.clear_profile();
                g.update_hud();
                log::info!("Local leaderboard cleared");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Stop the loop when the page goes away, revoking any frame callback
    /// the browser still holds
    fn setup_teardown(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let target = window.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            g.driver.teardown();
            if let Some(handle) = g.driver.scheduler_mut().take_cancelled() {
                let _ = target.cancel_animation_frame(handle);
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::sync::Arc;
    use std::time::Duration;

    use bug_chase::consts::{FRAME_MS, MAX_HEADLESS_FRAMES};
    use bug_chase::persistence::{FileStore, KeyValueStore, MemoryStore};
    use bug_chase::platform::ManualClock;
    use bug_chase::service::{BASE_URL_ENV, Dispatch, HttpScoreService, ScoreReporter, ServiceConfig};
    use bug_chase::{FrameDriver, PendingFrame, Session, Tuning};

    env_logger::init();
    log::info!("Bug Chase (native) starting...");

    let tuning = match std::env::var("BUG_CHASE_TUNING") {
        Ok(path) => Tuning::load(path),
        Err(_) => Tuning::default(),
    };
    let seed = std::env::var("BUG_CHASE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });

    let store: Box<dyn KeyValueStore> = match FileStore::default_location() {
        Ok(store) => {
            log::info!("Profile at {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            log::warn!("{}; using an in-memory profile", e);
            Box::new(MemoryStore::new())
        }
    };

    let reporter = std::env::var(BASE_URL_ENV).ok().map(|_| {
        let config = ServiceConfig::resolve(store.as_ref());
        log::info!("Score service at {}", config.base_url);
        ScoreReporter::new(Arc::new(HttpScoreService::new(config)), Dispatch::Background)
    });

    let mut session = Session::new(seed, tuning, store);
    let clear = std::env::args().any(|a| a == "--clear")
        || std::env::var("BUG_CHASE_CLEAR").is_ok_and(|v| !v.is_empty() && v != "0");
    if clear {
        session.clear_profile();
        log::info!("Local leaderboard cleared");
    }
    session.set_autopilot(true);

    let mut driver = FrameDriver::new(session, ManualClock::new(), PendingFrame::new());
    if let Some(reporter) = reporter {
        driver = driver.with_reporter(reporter);
    }

    // Know the server's best before the run so submission is gated on it
    driver.settle(Duration::from_secs(5));

    driver.start();
    let frames = driver.run_headless(FRAME_MS, MAX_HEADLESS_FRAMES);

    // Let background submissions land before exiting
    driver.settle(Duration::from_secs(15));
    driver.teardown();

    let session = &driver.session;
    let stats = &session.state.stats;
    log::info!(
        "Run over after {} frames ({} ticks): {} points, {} coffee",
        frames,
        session.state.time_ticks,
        stats.score,
        stats.coffee
    );
    if let Some(e) = &session.last_service_error {
        log::warn!("Score service: {}", e);
    }

    println!("Score:        {}", stats.score);
    println!("Coffee:       {}", stats.coffee);
    println!("Total coffee: {}", stats.lifetime_coffee);
    println!("High score:   {}", session.profile.high_score);
    println!("Best runs:");
    for line in session.best_score_lines() {
        println!("  {}", line);
    }
    if let Some(best) = session.personal_best {
        println!("Personal best (server): {}", best);
    }
    let leaderboard = session.leaderboard_lines();
    if !leaderboard.is_empty() {
        println!("Leaderboard:");
        for line in leaderboard {
            println!("  {}", line);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
