//! Local persistence for the player profile
//!
//! Values are strings under fixed keys, matching browser LocalStorage:
//! - `bugChaseTotalCoffee`: lifetime coffee count
//! - `bugChaseHighScore`: best local score
//! - `bugChaseBestScores`: JSON array of the top runs
//!
//! Anything missing or unparseable reads back as the zero/empty default.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;

use std::collections::BTreeMap;

use crate::highscores::{BestScores, ScoreRecord};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

pub const TOTAL_COFFEE_KEY: &str = "bugChaseTotalCoffee";
pub const HIGH_SCORE_KEY: &str = "bugChaseHighScore";
pub const BEST_SCORES_KEY: &str = "bugChaseBestScores";
/// Bearer token for the score service (JSON-encoded string)
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String key/value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Read the stored bearer token, if any. The value is a JSON string.
pub fn load_token(store: &dyn KeyValueStore) -> Option<String> {
    let raw = read_key(store, TOKEN_KEY)?;
    match serde_json::from_str::<Option<String>>(&raw) {
        Ok(token) => token.filter(|t| !t.is_empty()),
        Err(e) => {
            log::warn!("Ignoring malformed stored token: {}", e);
            None
        }
    }
}

/// Persistent stats carried between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub high_score: u64,
    pub best_scores: BestScores,
    pub total_coffee: u64,
}

impl Profile {
    /// Load the profile. Never fails: unreadable values fall back to
    /// defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let high_score = read_key(store, HIGH_SCORE_KEY)
            .map(|raw| parse_count(HIGH_SCORE_KEY, &raw))
            .unwrap_or(0);
        let total_coffee = read_key(store, TOTAL_COFFEE_KEY)
            .map(|raw| parse_count(TOTAL_COFFEE_KEY, &raw))
            .unwrap_or(0);
        let best_scores = read_key(store, BEST_SCORES_KEY)
            .map(|raw| match serde_json::from_str::<Vec<ScoreRecord>>(&raw) {
                Ok(entries) => BestScores::from_entries(entries),
                Err(e) => {
                    log::warn!("Ignoring malformed {}: {}", BEST_SCORES_KEY, e);
                    BestScores::new()
                }
            })
            .unwrap_or_default();

        log::info!(
            "Loaded profile: high score {}, {} best runs, {} coffee",
            high_score,
            best_scores.len(),
            total_coffee
        );

        Self {
            high_score,
            best_scores,
            total_coffee,
        }
    }

    /// Write all three keys
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(HIGH_SCORE_KEY, &self.high_score.to_string())?;
        store.set(BEST_SCORES_KEY, &serde_json::to_string(&self.best_scores)?)?;
        store.set(TOTAL_COFFEE_KEY, &self.total_coffee.to_string())?;
        log::info!("Profile saved ({} best runs)", self.best_scores.len());
        Ok(())
    }

    /// Fold a finished run into the profile. Returns the rank the run took
    /// in the best-score list.
    pub fn record_run(&mut self, score: u64, coffee: u32, lifetime_coffee: u64) -> Option<usize> {
        self.high_score = self.high_score.max(score);
        self.total_coffee = lifetime_coffee;
        self.best_scores.add_score(score, coffee)
    }

    /// Forget everything, in memory and in the store
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        *self = Self::default();
        store.remove(HIGH_SCORE_KEY)?;
        store.remove(BEST_SCORES_KEY)?;
        store.remove(TOTAL_COFFEE_KEY)?;
        log::info!("Leaderboard cleared");
        Ok(())
    }
}

fn read_key(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Could not read {}: {}", key, e);
            None
        }
    }
}

fn parse_count(key: &str, raw: &str) -> u64 {
    raw.trim().parse().unwrap_or_else(|_| {
        log::warn!("Ignoring malformed {}: {:?}", key, raw);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Profile::load(&store), Profile::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut profile = Profile::default();
        profile.record_run(150, 2, 9);
        profile.record_run(90, 1, 10);
        profile.save(&mut store).unwrap();

        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap().as_deref(), Some("150"));
        assert_eq!(store.get(TOTAL_COFFEE_KEY).unwrap().as_deref(), Some("10"));

        let loaded = Profile::load(&store);
        assert_eq!(loaded, profile);
        assert_eq!(loaded.best_scores.top_score(), Some(150));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "lots").unwrap();
        store.set(TOTAL_COFFEE_KEY, "-3").unwrap();
        store.set(BEST_SCORES_KEY, "{\"score\": oops").unwrap();

        let profile = Profile::load(&store);
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn test_best_scores_of_wrong_shape_fall_back() {
        let mut store = MemoryStore::new();
        store.set(BEST_SCORES_KEY, r#"{"score": 10, "coffee": 1}"#).unwrap();
        store.set(HIGH_SCORE_KEY, "10").unwrap();
        let profile = Profile::load(&store);
        assert!(profile.best_scores.is_empty());
        assert_eq!(profile.high_score, 10);
    }

    #[test]
    fn test_clear_removes_keys() {
        let mut store = MemoryStore::new();
        let mut profile = Profile::default();
        profile.record_run(10, 1, 1);
        profile.save(&mut store).unwrap();

        profile.clear(&mut store).unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap(), None);
        assert_eq!(store.get(BEST_SCORES_KEY).unwrap(), None);
        assert_eq!(store.get(TOTAL_COFFEE_KEY).unwrap(), None);
    }

    #[test]
    fn test_token_is_json_string() {
        let mut store = MemoryStore::new();
        assert_eq!(load_token(&store), None);
        store.set(TOKEN_KEY, "\"abc.def\"").unwrap();
        assert_eq!(load_token(&store).as_deref(), Some("abc.def"));
        store.set(TOKEN_KEY, "null").unwrap();
        assert_eq!(load_token(&store), None);
        store.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(load_token(&store), None);
    }
}
