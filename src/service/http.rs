//! Blocking HTTP client for the score service (native only)
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  leaderboard` -> `[{ username, highScore }, ...]`
//! - `GET  highscore`   -> number, or `{ highScore }`
//! - `POST submit`      <- `{ highScore }`

use std::time::Duration;

use serde_json::Value;

use super::{
    LeaderboardEntry, ScoreService, ServiceConfig, ServiceError, SubmitAck, decode_body,
    decode_leaderboard, decode_personal_best, submit_body,
};

const TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpScoreService {
    config: ServiceConfig,
    agent: ureq::Agent,
}

impl HttpScoreService {
    pub fn new(config: ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
        Self { config, agent }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn get(&self, path: &str) -> Result<Value, ServiceError> {
        let response = self
            .agent
            .get(&self.config.endpoint(path))
            .set("Authorization", &self.config.bearer()?)
            .set("Content-Type", "application/json")
            .call()
            .map_err(map_error)?;
        read_json(response)
    }

    fn post(&self, path: &str, body: Value) -> Result<Value, ServiceError> {
        let response = self
            .agent
            .post(&self.config.endpoint(path))
            .set("Authorization", &self.config.bearer()?)
            .send_json(body)
            .map_err(map_error)?;
        read_json(response)
    }
}

fn map_error(error: ureq::Error) -> ServiceError {
    match error {
        ureq::Error::Status(code, response) => ServiceError::Status {
            code,
            message: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => ServiceError::Network(transport.to_string()),
    }
}

fn read_json(response: ureq::Response) -> Result<Value, ServiceError> {
    let body = response
        .into_string()
        .map_err(|e| ServiceError::Decode(e.to_string()))?;
    decode_body(&body)
}

impl ScoreService for HttpScoreService {
    fn submit_score(&self, score: u64) -> Result<SubmitAck, ServiceError> {
        self.post("submit", submit_body(score))?;
        Ok(SubmitAck { score })
    }

    fn personal_best(&self) -> Result<u64, ServiceError> {
        decode_personal_best(&self.get("highscore")?)
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        decode_leaderboard(self.get("leaderboard")?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::thread::JoinHandle;

    use super::*;

    /// What the test server saw
    struct Seen {
        method: String,
        url: String,
        auth: Option<String>,
        body: String,
    }

    /// Serve exactly one request with the given status and body
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Seen>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = std::thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut received = String::new();
            request.as_reader().read_to_string(&mut received).unwrap();
            let seen = Seen {
                method: request.method().to_string(),
                url: request.url().to_string(),
                auth: request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string()),
                body: received,
            };
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            request.respond(response).unwrap();
            seen
        });
        (format!("http://127.0.0.1:{}/bugchase", port), handle)
    }

    fn client(base_url: String) -> HttpScoreService {
        HttpScoreService::new(ServiceConfig {
            base_url,
            token: Some("secret".to_string()),
        })
    }

    #[test]
    fn test_submit_posts_high_score() {
        let (url, server) = serve_once(200, "{}");
        let ack = client(url).submit_score(1234).unwrap();
        assert_eq!(ack.score, 1234);

        let seen = server.join().unwrap();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.url, "/bugchase/submit");
        assert_eq!(seen.auth.as_deref(), Some("Bearer secret"));
        let body: Value = serde_json::from_str(&seen.body).unwrap();
        assert_eq!(body["highScore"], 1234);
    }

    #[test]
    fn test_personal_best_accepts_bare_number_and_object() {
        let (url, server) = serve_once(200, "812");
        assert_eq!(client(url).personal_best().unwrap(), 812);
        assert_eq!(server.join().unwrap().url, "/bugchase/highscore");

        let (url, server) = serve_once(200, r#"{"highScore": 77}"#);
        assert_eq!(client(url).personal_best().unwrap(), 77);
        server.join().unwrap();
    }

    #[test]
    fn test_leaderboard_rows() {
        let (url, server) = serve_once(
            200,
            r#"[{"username": "ada", "highScore": 500}, {"username": "linus", "highScore": 300}]"#,
        );
        let rows = client(url).leaderboard().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].identifier, "ada");
        assert_eq!(rows[1].score, 300);
        assert_eq!(server.join().unwrap().method, "GET");
    }

    #[test]
    fn test_http_error_maps_to_status() {
        let (url, server) = serve_once(401, "expired");
        let err = client(url).personal_best().unwrap_err();
        assert_eq!(
            err,
            ServiceError::Status {
                code: 401,
                message: "expired".to_string()
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        let (url, server) = serve_once(200, "<html>");
        assert!(matches!(
            client(url).leaderboard(),
            Err(ServiceError::Decode(_))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_missing_token_short_circuits() {
        let service = HttpScoreService::new(ServiceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            token: None,
        });
        assert_eq!(service.submit_score(1), Err(ServiceError::MissingToken));
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        drop(server);
        let service = client(format!("http://127.0.0.1:{}", port));
        assert!(matches!(
            service.leaderboard(),
            Err(ServiceError::Network(_))
        ));
    }
}
