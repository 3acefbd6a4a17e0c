//! Best-score list
//!
//! Keeps the top five runs on this device, highest score first.

use serde::{Deserialize, Serialize};

/// Maximum number of runs to keep
pub const MAX_HIGH_SCORES: usize = 5;

/// A single finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u64,
    /// Coffee collected during the run
    pub coffee: u32,
}

/// Top-N runs, sorted descending by score. Stored as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct BestScores {
    pub entries: Vec<ScoreRecord>,
}

impl BestScores {
    /// Create empty list
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from untrusted stored entries, restoring order and bound
    pub fn from_entries(mut entries: Vec<ScoreRecord>) -> Self {
        entries.retain(|e| e.score > 0);
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_HIGH_SCORES);
        Self { entries }
    }

    /// Check if a score would make the list
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Record a run. Returns the rank achieved (1-indexed) or None if it
    /// didn't make the list. Ties rank below existing entries.
    pub fn add_score(&mut self, score: u64, coffee: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let record = ScoreRecord { score, coffee };
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, record);
                i + 1
            }
            None => {
                self.entries.push(record);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_descending(scores: &BestScores) -> bool {
        scores.entries.windows(2).all(|w| w[0].score >= w[1].score)
    }

    #[test]
    fn test_zero_score_ignored() {
        let mut scores = BestScores::new();
        assert_eq!(scores.add_score(0, 3), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_bounded_and_sorted_after_many_runs() {
        let mut scores = BestScores::new();
        for (i, score) in [120, 40, 900, 15, 300, 77, 5000, 60].iter().enumerate() {
            scores.add_score(*score, i as u32);
        }
        assert_eq!(scores.len(), MAX_HIGH_SCORES);
        assert!(is_descending(&scores));
        let kept: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(kept, vec![5000, 900, 300, 120, 77]);
        assert_eq!(scores.top_score(), Some(5000));
    }

    #[test]
    fn test_rank_reporting() {
        let mut scores = BestScores::new();
        assert_eq!(scores.add_score(100, 1), Some(1));
        assert_eq!(scores.add_score(300, 2), Some(1));
        assert_eq!(scores.add_score(200, 0), Some(2));
        // Tie goes below the existing entry
        assert_eq!(scores.add_score(200, 4), Some(3));
        assert_eq!(scores.entries[1].coffee, 0);
        assert_eq!(scores.entries[2].coffee, 4);
    }

    #[test]
    fn test_full_list_rejects_low_score() {
        let mut scores = BestScores::new();
        for s in [50, 60, 70, 80, 90] {
            scores.add_score(s, 0);
        }
        assert!(!scores.qualifies(50));
        assert_eq!(scores.add_score(40, 0), None);
        assert_eq!(scores.add_score(55, 0), Some(5));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(55));
    }

    #[test]
    fn test_from_entries_repairs_stored_list() {
        let raw = vec![
            ScoreRecord { score: 10, coffee: 0 },
            ScoreRecord { score: 0, coffee: 0 },
            ScoreRecord { score: 80, coffee: 2 },
            ScoreRecord { score: 30, coffee: 1 },
            ScoreRecord { score: 20, coffee: 1 },
            ScoreRecord { score: 70, coffee: 1 },
            ScoreRecord { score: 60, coffee: 1 },
        ];
        let scores = BestScores::from_entries(raw);
        assert_eq!(scores.len(), 5);
        assert!(is_descending(&scores));
        assert_eq!(scores.top_score(), Some(80));
    }

    #[test]
    fn test_serializes_as_array() {
        let mut scores = BestScores::new();
        scores.add_score(42, 3);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"[{"score":42,"coffee":3}]"#);
        let back: BestScores = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scores);
    }
}
