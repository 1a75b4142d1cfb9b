//! Local leaderboard
//!
//! Top 10 finished runs, stored as JSON under `skyrun_highscores`.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Metres run
    pub distance: f32,
    pub coins: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, sorted by score descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "skyrun_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Add a finished run. Returns the rank achieved (1-indexed) if it qualified.
    pub fn add_score(
        &mut self,
        score: u64,
        distance: f32,
        coins: u32,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            distance,
            coins,
            timestamp,
        };

        // Ties rank below existing entries
        let index = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from storage; missing or malformed data starts fresh
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("No high scores found, starting fresh");
            return Self::new();
        };
        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("Discarding malformed high scores: {}", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => {
                store.set(Self::STORAGE_KEY, &json);
                log::info!("High scores saved ({} entries)", self.entries.len());
            }
            Err(e) => log::error!("Failed to serialize high scores: {}", e),
        }
    }
}

/// Format a timestamp relative to now ("3 days ago")
pub fn format_date(timestamp: f64, now: f64) -> String {
    let diff_mins = ((now - timestamp) / 60_000.0).max(0.0);
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", n, unit)
        }
    };

    if diff_days >= 2.0 {
        plural(diff_days.floor() as u64, "day")
    } else if diff_days >= 1.0 {
        "Yesterday".to_string()
    } else if diff_hours >= 1.0 {
        plural(diff_hours.floor() as u64, "hour")
    } else if diff_mins >= 1.0 {
        plural(diff_mins.floor() as u64, "min")
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_sorted_and_capped() {
        let mut scores = HighScores::new();
        for s in 1..=12u64 {
            scores.add_score(s * 100, s as f32 * 90.0, 1, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1200));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(300));
        assert!(!scores.qualifies(300));
        assert!(scores.qualifies(301));
    }

    #[test]
    fn test_rank_and_ties() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, 0.0, 0, 0.0), None);
        assert_eq!(scores.add_score(500, 450.0, 5, 0.0), Some(1));
        assert_eq!(scores.add_score(800, 700.0, 10, 0.0), Some(1));
        assert_eq!(scores.add_score(500, 400.0, 10, 0.0), Some(3));
    }

    #[test]
    fn test_storage() {
        let store = MemoryStore::new();
        assert!(HighScores::load(&store).is_empty());

        let mut scores = HighScores::new();
        scores.add_score(1234, 1100.5, 13, 1_700_000_000_000.0);
        scores.save(&store);
        assert_eq!(HighScores::load(&store), scores);

        store.set("skyrun_highscores", "[1, 2");
        assert!(HighScores::load(&store).is_empty());
    }

    #[test]
    fn test_format_date() {
        let min = 60_000.0;
        assert_eq!(format_date(0.0, 30_000.0), "Just now");
        assert_eq!(format_date(0.0, min), "1 min ago");
        assert_eq!(format_date(0.0, 5.0 * min), "5 mins ago");
        assert_eq!(format_date(0.0, 125.0 * min), "2 hours ago");
        assert_eq!(format_date(0.0, 30.0 * 60.0 * min), "Yesterday");
        assert_eq!(format_date(0.0, 4.0 * 24.0 * 60.0 * min), "4 days ago");
    }
}
