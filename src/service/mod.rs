//! Remote score service
//!
//! The backend is an opaque HTTP collaborator with three operations:
//! submit a score, fetch the caller's personal best, fetch the global
//! leaderboard. The simulation never waits on it: requests go through
//! [`ScoreReporter`], which runs them off the frame loop and hands results
//! back through a channel that the driver polls once per frame.

#[cfg(not(target_arch = "wasm32"))]
pub mod http;

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persistence::{KeyValueStore, load_token};

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpScoreService;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://localhost:44383/bugchase";
/// Environment override for the API root
pub const BASE_URL_ENV: &str = "BUG_CHASE_API_URL";
/// Environment override for the bearer token
pub const TOKEN_ENV: &str = "BUG_CHASE_TOKEN";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Not signed in")]
    MissingToken,
}

/// Backend acknowledgement of a submitted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub score: u64,
}

/// One row of the global leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(alias = "username", alias = "userName", alias = "name")]
    pub identifier: String,
    #[serde(alias = "highScore")]
    pub score: u64,
}

/// Where the service lives and who we are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
        }
    }
}

impl ServiceConfig {
    /// Base URL from the environment (or default); token from the
    /// environment, falling back to the one stored at sign-in.
    pub fn resolve(store: &dyn KeyValueStore) -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| load_token(store));
        Self { base_url, token }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn bearer(&self) -> Result<String, ServiceError> {
        self.token
            .as_deref()
            .map(|t| format!("Bearer {}", t))
            .ok_or(ServiceError::MissingToken)
    }
}

/// JSON body of a score submission
pub fn submit_body(score: u64) -> Value {
    serde_json::json!({ "highScore": score })
}

/// Parse a response body; an empty body reads as `null`
pub fn decode_body(body: &str) -> Result<Value, ServiceError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Personal best as a bare number, `{ highScore }` or `{ score }`.
/// `null` means no score yet.
pub fn decode_personal_best(value: &Value) -> Result<u64, ServiceError> {
    let score = match value {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => map
            .get("highScore")
            .or_else(|| map.get("score"))
            .and_then(Value::as_u64),
        Value::Null => Some(0),
        _ => None,
    };
    score.ok_or_else(|| ServiceError::Decode(format!("no score in {}", value)))
}

pub fn decode_leaderboard(value: Value) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    serde_json::from_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Backend operations. Implementations may block; callers go through
/// [`ScoreReporter`] to keep that off the frame loop.
pub trait ScoreService: Send + Sync {
    fn submit_score(&self, score: u64) -> Result<SubmitAck, ServiceError>;
    fn personal_best(&self) -> Result<u64, ServiceError>;
    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError>;
}

/// A queued backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Submit(u64),
    PersonalBest,
    Leaderboard,
}

/// Completed backend call
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Submitted { score: u64, ack: SubmitAck },
    PersonalBest(u64),
    Leaderboard(Vec<LeaderboardEntry>),
    Failed { request: Request, error: ServiceError },
}

/// How requests are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// One short-lived worker thread per request (native)
    Background,
    /// Run on the caller's thread; results still arrive via [`ScoreReporter::poll`]
    Inline,
}

/// Fire-and-poll front end for a [`ScoreService`]
pub struct ScoreReporter {
    service: Arc<dyn ScoreService>,
    dispatch: Dispatch,
    tx: Sender<ReportEvent>,
    rx: Receiver<ReportEvent>,
    in_flight: usize,
}

impl ScoreReporter {
    pub fn new(service: Arc<dyn ScoreService>, dispatch: Dispatch) -> Self {
        let (tx, rx) = channel();
        Self {
            service,
            dispatch,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn submit_score(&mut self, score: u64) {
        log::info!("Submitting score {}", score);
        self.send(Request::Submit(score));
    }

    pub fn fetch_personal_best(&mut self) {
        self.send(Request::PersonalBest);
    }

    pub fn fetch_leaderboard(&mut self) {
        self.send(Request::Leaderboard);
    }

    /// Requests sent but not yet collected by [`poll`](Self::poll)
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collect every finished request without blocking
    pub fn poll(&mut self) -> Vec<ReportEvent> {
        let events: Vec<ReportEvent> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(events.len());
        events
    }

    fn send(&mut self, request: Request) {
        self.in_flight += 1;
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        match self.dispatch {
            #[cfg(not(target_arch = "wasm32"))]
            Dispatch::Background => {
                std::thread::spawn(move || {
                    // Receiver gone means the session was torn down
                    let _ = tx.send(execute(service.as_ref(), request));
                });
            }
            _ => {
                let _ = tx.send(execute(service.as_ref(), request));
            }
        }
    }
}

fn execute(service: &dyn ScoreService, request: Request) -> ReportEvent {
    let result = match request {
        Request::Submit(score) => service
            .submit_score(score)
            .map(|ack| ReportEvent::Submitted { score, ack }),
        Request::PersonalBest => service.personal_best().map(ReportEvent::PersonalBest),
        Request::Leaderboard => service.leaderboard().map(ReportEvent::Leaderboard),
    };
    result.unwrap_or_else(|error| {
        log::warn!("Score service {:?} failed: {}", request, error);
        ReportEvent::Failed { request, error }
    })
}


#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::fake::FakeService;
    use super::*;
    use crate::persistence::{MemoryStore, TOKEN_KEY};

    #[test]
    fn test_inline_reporter_delivers_on_poll() {
        let service = Arc::new(FakeService::with_best(10));
        let mut reporter = ScoreReporter::new(service.clone(), Dispatch::Inline);

        reporter.submit_score(42);
        reporter.fetch_personal_best();
        assert_eq!(reporter.in_flight(), 2);

        let events = reporter.poll();
        assert_eq!(
            events,
            vec![
                ReportEvent::Submitted {
                    score: 42,
                    ack: SubmitAck { score: 42 }
                },
                ReportEvent::PersonalBest(42),
            ]
        );
        assert_eq!(reporter.in_flight(), 0);
        assert_eq!(service.submissions(), vec![42]);
        assert!(reporter.poll().is_empty());
    }

    #[test]
    fn test_failures_are_reported_not_raised() {
        let mut reporter = ScoreReporter::new(Arc::new(FakeService::offline()), Dispatch::Inline);
        reporter.fetch_leaderboard();
        match reporter.poll().as_slice() {
            [ReportEvent::Failed { request, error }] => {
                assert_eq!(*request, Request::Leaderboard);
                assert!(matches!(error, ServiceError::Network(_)));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_background_reporter_eventually_delivers() {
        let service = Arc::new(FakeService::default());
        let mut reporter = ScoreReporter::new(service, Dispatch::Background);
        reporter.fetch_leaderboard();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && Instant::now() < deadline {
            events = reporter.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(events.as_slice(), [ReportEvent::Leaderboard(rows)] if rows.len() == 1));
        assert_eq!(reporter.in_flight(), 0);
    }

    #[test]
    fn test_endpoint_and_bearer() {
        let config = ServiceConfig {
            base_url: "http://example.test/bugchase/".to_string(),
            token: Some("t0k".to_string()),
        };
        assert_eq!(config.endpoint("submit"), "http://example.test/bugchase/submit");
        assert_eq!(config.bearer().unwrap(), "Bearer t0k");

        let anonymous = ServiceConfig::default();
        assert_eq!(anonymous.bearer(), Err(ServiceError::MissingToken));
    }

    #[test]
    fn test_token_comes_from_store() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "\"stored\"").unwrap();
        let config = ServiceConfig::resolve(&store);
        // Environment wins when set; otherwise the stored token is used
        match std::env::var(TOKEN_ENV) {
            Ok(v) if !v.is_empty() => assert_eq!(config.token.as_deref(), Some(v.as_str())),
            _ => assert_eq!(config.token.as_deref(), Some("stored")),
        }
    }

    #[test]
    fn test_decode_personal_best_shapes() {
        for (body, expected) in [
            ("812", Some(812)),
            (r#"{"highScore": 77}"#, Some(77)),
            (r#"{"score": 5}"#, Some(5)),
            ("", Some(0)),
            ("null", Some(0)),
            (r#""high""#, None),
        ] {
            let value = decode_body(body).unwrap();
            assert_eq!(decode_personal_best(&value).ok(), expected, "body {:?}", body);
        }
        assert!(matches!(decode_body("<html>"), Err(ServiceError::Decode(_))));
    }

    #[test]
    fn test_submit_body_shape() {
        assert_eq!(submit_body(42).to_string(), r#"{"highScore":42}"#);
    }

    #[test]
    fn test_leaderboard_entry_aliases() {
        let rows: Vec<LeaderboardEntry> =
            serde_json::from_str(r#"[{"username": "grace", "highScore": 900}]"#).unwrap();
        assert_eq!(rows[0].identifier, "grace");
        assert_eq!(rows[0].score, 900);
    }
}
