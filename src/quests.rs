//! Quest board
//!
//! Tracks local progress toward the reward contract's quests. A quest becomes
//! claimable once its goal is met; the reward itself is paid by the contract
//! after `claimQuestReward(id)`.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, PlayerProgress};

/// What a quest asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestGoal {
    /// Metres in a single run
    DistanceInRun(f32),
    /// Coins collected in a single run
    CoinsInRun(u32),
    /// Lifetime jumps
    TotalJumps(u64),
}

impl QuestGoal {
    /// Progress toward the goal in `[0, 1]`
    pub fn fraction(&self, progress: &PlayerProgress, run: &RunRecord) -> f32 {
        let (have, need) = match *self {
            QuestGoal::DistanceInRun(metres) => (run.distance as f64, metres as f64),
            QuestGoal::CoinsInRun(coins) => (run.coins as f64, coins as f64),
            QuestGoal::TotalJumps(jumps) => (progress.jumps as f64, jumps as f64),
        };
        if need <= 0.0 {
            return 1.0;
        }
        (have / need).clamp(0.0, 1.0) as f32
    }
}

/// Contract-side quest definition mirrored locally
#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    /// Contract quest id
    pub id: u64,
    pub title: &'static str,
    pub goal: QuestGoal,
    /// Reward in whole tokens
    pub reward: u64,
}

/// Default quests, matching the ids created on the contract
pub const DEFAULT_QUESTS: &[Quest] = &[
    Quest {
        id: 1,
        title: "First Steps",
        goal: QuestGoal::DistanceInRun(500.0),
        reward: 10,
    },
    Quest {
        id: 2,
        title: "Coin Collector",
        goal: QuestGoal::CoinsInRun(50),
        reward: 25,
    },
    Quest {
        id: 3,
        title: "Marathon",
        goal: QuestGoal::DistanceInRun(5000.0),
        reward: 100,
    },
    Quest {
        id: 4,
        title: "Hopper",
        goal: QuestGoal::TotalJumps(1000),
        reward: 50,
    },
];

/// Result of the run just finished
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunRecord {
    pub distance: f32,
    pub coins: u32,
}

/// Per-quest local state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub id: u64,
    pub completed: bool,
    pub claimed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestBoard {
    quests: Vec<Quest>,
    progress: Vec<QuestProgress>,
}

impl Default for QuestBoard {
    fn default() -> Self {
        Self::new(DEFAULT_QUESTS.to_vec())
    }
}

impl QuestBoard {
    const STORAGE_KEY: &'static str = "skyrun_quests";

    pub fn new(quests: Vec<Quest>) -> Self {
        let progress = quests
            .iter()
            .map(|q| QuestProgress {
                id: q.id,
                ..Default::default()
            })
            .collect();
        Self { quests, progress }
    }

    /// Default quests with saved completion state applied
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut board = Self::default();
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            return board;
        };
        match serde_json::from_str::<Vec<QuestProgress>>(&json) {
            Ok(saved) => {
                for entry in saved {
                    if let Some(slot) = board.progress.iter_mut().find(|p| p.id == entry.id) {
                        *slot = entry;
                    }
                }
            }
            Err(e) => log::warn!("Ignoring malformed quest state: {}", e),
        }
        board
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        match serde_json::to_string(&self.progress) {
            Ok(json) => store.set(Self::STORAGE_KEY, &json),
            Err(e) => log::error!("Failed to serialize quest state: {}", e),
        }
    }

    pub fn quests(&self) -> impl Iterator<Item = (&Quest, &QuestProgress)> {
        self.quests.iter().zip(self.progress.iter())
    }

    /// Mark quests whose goal is now met. Returns the newly completed ids.
    pub fn evaluate(&mut self, progress: &PlayerProgress, run: &RunRecord) -> Vec<u64> {
        let mut completed = Vec::new();
        for (quest, state) in self.quests.iter().zip(self.progress.iter_mut()) {
            if state.completed {
                continue;
            }
            if quest.goal.fraction(progress, run) >= 1.0 {
                state.completed = true;
                completed.push(quest.id);
                log::info!("Quest {} \"{}\" completed", quest.id, quest.title);
            }
        }
        completed
    }

    /// Completed quests whose reward has not been claimed
    pub fn claimable(&self) -> Vec<u64> {
        self.progress
            .iter()
            .filter(|p| p.completed && !p.claimed)
            .map(|p| p.id)
            .collect()
    }

    /// Record a successful claim. False for unknown or incomplete quests.
    pub fn mark_claimed(&mut self, id: u64) -> bool {
        match self.progress.iter_mut().find(|p| p.id == id) {
            Some(state) if state.completed => {
                state.claimed = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_distance_quest_needs_single_run() {
        let mut board = QuestBoard::default();
        let progress = PlayerProgress::default();
        let short = RunRecord {
            distance: 300.0,
            coins: 0,
        };
        assert!(board.evaluate(&progress, &short).is_empty());
        assert!(board.evaluate(&progress, &short).is_empty());

        let long = RunRecord {
            distance: 650.0,
            coins: 0,
        };
        assert_eq!(board.evaluate(&progress, &long), vec![1]);
        // Completion is reported once
        assert!(board.evaluate(&progress, &long).is_empty());
        assert_eq!(board.claimable(), vec![1]);
    }

    #[test]
    fn test_total_jumps_uses_lifetime_progress() {
        let mut board = QuestBoard::default();
        let progress = PlayerProgress {
            jumps: 1000,
            ..Default::default()
        };
        let newly = board.evaluate(&progress, &RunRecord::default());
        assert_eq!(newly, vec![4]);
    }

    #[test]
    fn test_claim_flow() {
        let mut board = QuestBoard::default();
        assert!(!board.mark_claimed(2));
        let run = RunRecord {
            distance: 10.0,
            coins: 60,
        };
        board.evaluate(&PlayerProgress::default(), &run);
        assert_eq!(board.claimable(), vec![2]);
        assert!(board.mark_claimed(2));
        assert!(board.claimable().is_empty());
        assert!(!board.mark_claimed(99));
    }

    #[test]
    fn test_fraction_clamped() {
        let run = RunRecord {
            distance: 10_000.0,
            coins: 5,
        };
        let progress = PlayerProgress::default();
        assert_eq!(QuestGoal::DistanceInRun(5000.0).fraction(&progress, &run), 1.0);
        assert_eq!(QuestGoal::CoinsInRun(10).fraction(&progress, &run), 0.5);
        assert_eq!(QuestGoal::TotalJumps(0).fraction(&progress, &run), 1.0);
    }

    #[test]
    fn test_persisted_state() {
        let store = MemoryStore::new();
        let mut board = QuestBoard::default();
        let run = RunRecord {
            distance: 600.0,
            coins: 0,
        };
        board.evaluate(&PlayerProgress::default(), &run);
        board.mark_claimed(1);
        board.save(&store);

        let loaded = QuestBoard::load(&store);
        assert_eq!(loaded, board);

        store.set("skyrun_quests", "{broken");
        assert_eq!(QuestBoard::load(&store), QuestBoard::default());
    }
}
