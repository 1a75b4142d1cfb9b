//! Progressive difficulty curve
//!
//! Maps distance travelled in a run to a discrete tier. Each tier sets the
//! scroll speed multiplier and obstacle pacing used by the tick.

/// A distance threshold paired with difficulty parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyMilestone {
    /// Distance (metres) at which this tier starts
    pub distance_threshold: f32,
    /// Display label
    pub name: &'static str,
    /// Multiplier on `BASE_RUN_SPEED`
    pub speed_multiplier: f32,
    /// Seconds between obstacle spawns
    pub obstacle_spawn_interval_secs: f32,
    /// Minimum distance between consecutive obstacles (metres)
    pub min_obstacle_gap_m: f32,
}

// Ordered by threshold, ascending. First entry must start at 0.
pub const DIFFICULTY_MILESTONES: &[DifficultyMilestone] = &[
    DifficultyMilestone {
        distance_threshold: 0.0,
        name: "Beginner",
        speed_multiplier: 1.0,
        obstacle_spawn_interval_secs: 2.0,
        min_obstacle_gap_m: 12.0,
    },
    DifficultyMilestone {
        distance_threshold: 1000.0,
        name: "Novice",
        speed_multiplier: 1.15,
        obstacle_spawn_interval_secs: 1.8,
        min_obstacle_gap_m: 11.0,
    },
    DifficultyMilestone {
        distance_threshold: 2500.0,
        name: "Runner",
        speed_multiplier: 1.3,
        obstacle_spawn_interval_secs: 1.6,
        min_obstacle_gap_m: 10.0,
    },
    DifficultyMilestone {
        distance_threshold: 5000.0,
        name: "Sprinter",
        speed_multiplier: 1.5,
        obstacle_spawn_interval_secs: 1.4,
        min_obstacle_gap_m: 9.0,
    },
    DifficultyMilestone {
        distance_threshold: 8000.0,
        name: "Expert",
        speed_multiplier: 1.7,
        obstacle_spawn_interval_secs: 1.2,
        min_obstacle_gap_m: 8.0,
    },
    DifficultyMilestone {
        distance_threshold: 12000.0,
        name: "Master",
        speed_multiplier: 1.9,
        obstacle_spawn_interval_secs: 1.0,
        min_obstacle_gap_m: 7.0,
    },
    DifficultyMilestone {
        distance_threshold: 17000.0,
        name: "Legend",
        speed_multiplier: 2.1,
        obstacle_spawn_interval_secs: 0.85,
        min_obstacle_gap_m: 6.0,
    },
];

/// Mutable part of the difficulty manager, reset every run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DifficultyState {
    pub current_milestone_index: usize,
    pub total_distance: f32,
}

/// Result of a difficulty update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyUpdate {
    /// Parameters of the active tier
    pub milestone: DifficultyMilestone,
    /// Index of the active tier
    pub index: usize,
    /// Percent progress toward the next tier (0-100)
    pub progress: f32,
    /// Set only on the update that crossed into a higher tier
    pub tier_increased: bool,
}

/// Owns the milestone table and the per-run difficulty state
#[derive(Debug, Clone)]
pub struct DifficultyManager {
    milestones: &'static [DifficultyMilestone],
    state: DifficultyState,
}

impl Default for DifficultyManager {
    fn default() -> Self {
        Self::new(DIFFICULTY_MILESTONES)
    }
}

impl DifficultyManager {
    /// Create a manager over a milestone table (ascending, non-empty)
    pub fn new(milestones: &'static [DifficultyMilestone]) -> Self {
        debug_assert!(!milestones.is_empty(), "milestone table is empty");
        debug_assert!(
            milestones
                .windows(2)
                .all(|w| w[0].distance_threshold < w[1].distance_threshold),
            "milestone table must be strictly ascending"
        );
        Self {
            milestones,
            state: DifficultyState::default(),
        }
    }

    /// Feed the cumulative run distance; advances the tier when a threshold is crossed
    pub fn update(&mut self, total_distance: f32) -> DifficultyUpdate {
        // NaN and negative distances count as the start line
        let distance = if total_distance.is_nan() {
            0.0
        } else {
            total_distance.max(0.0)
        };
        self.state.total_distance = distance;

        let mut selected = 0;
        for (i, m) in self.milestones.iter().enumerate() {
            if distance >= m.distance_threshold {
                selected = i;
            } else {
                break;
            }
        }

        let tier_increased = selected > self.state.current_milestone_index;
        if tier_increased {
            self.state.current_milestone_index = selected;
            log::info!(
                "Difficulty increased to {} at {:.0} m",
                self.milestones[selected].name,
                distance
            );
        }

        DifficultyUpdate {
            milestone: *self.current(),
            index: self.state.current_milestone_index,
            progress: self.progress_to_next_milestone(),
            tier_increased,
        }
    }

    /// Percent progress from the current tier to the next (100 at the final tier)
    pub fn progress_to_next_milestone(&self) -> f32 {
        let index = self.state.current_milestone_index;
        let Some(next) = self.milestones.get(index + 1) else {
            return 100.0;
        };
        let start = self.milestones[index].distance_threshold;
        let span = next.distance_threshold - start;
        if span <= 0.0 {
            return 100.0;
        }
        ((self.state.total_distance - start) / span * 100.0).clamp(0.0, 100.0)
    }

    /// Back to the first tier at zero distance
    pub fn reset(&mut self) {
        self.state = DifficultyState::default();
    }

    pub fn current(&self) -> &DifficultyMilestone {
        &self.milestones[self.state.current_milestone_index]
    }

    pub fn next(&self) -> Option<&DifficultyMilestone> {
        self.milestones.get(self.state.current_milestone_index + 1)
    }

    pub fn state(&self) -> DifficultyState {
        self.state
    }

    pub fn is_max_tier(&self) -> bool {
        self.state.current_milestone_index + 1 >= self.milestones.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_first_tier() {
        let mut dm = DifficultyManager::default();
        let u = dm.update(0.0);
        assert_eq!(u.index, 0);
        assert_eq!(u.milestone.name, "Beginner");
        assert!(!u.tier_increased);
        assert_eq!(u.progress, 0.0);
    }

    #[test]
    fn test_novice_progress() {
        let mut dm = DifficultyManager::default();
        let u = dm.update(1200.0);
        assert_eq!(u.index, 1);
        assert_eq!(u.milestone.name, "Novice");
        assert!(u.tier_increased);
        // (1200 - 1000) / (2500 - 1000) * 100
        assert!((u.progress - 13.333).abs() < 0.01);
    }

    #[test]
    fn test_notification_fires_once() {
        let mut dm = DifficultyManager::default();
        assert!(dm.update(1000.0).tier_increased);
        assert!(!dm.update(1001.0).tier_increased);
        assert!(!dm.update(1500.0).tier_increased);
        assert!(dm.update(2500.0).tier_increased);
    }

    #[test]
    fn test_skipping_tiers_lands_on_highest_reached() {
        let mut dm = DifficultyManager::default();
        let u = dm.update(9000.0);
        assert_eq!(u.milestone.name, "Expert");
        assert!(u.tier_increased);
    }

    #[test]
    fn test_max_tier_progress_is_100() {
        let mut dm = DifficultyManager::default();
        let u = dm.update(17000.0);
        assert!(dm.is_max_tier());
        assert_eq!(u.progress, 100.0);
        assert_eq!(dm.update(1.0e9).progress, 100.0);
        assert!(dm.next().is_none());
    }

    #[test]
    fn test_reset() {
        let mut dm = DifficultyManager::default();
        dm.update(13000.0);
        dm.reset();
        assert_eq!(dm.state(), DifficultyState::default());
        assert_eq!(dm.current().name, "Beginner");
        // Crossing again notifies again
        assert!(dm.update(1000.0).tier_increased);
    }

    #[test]
    fn test_negative_and_nan_distance() {
        let mut dm = DifficultyManager::default();
        assert_eq!(dm.update(-50.0).index, 0);
        assert_eq!(dm.state().total_distance, 0.0);
        assert_eq!(dm.update(f32::NAN).progress, 0.0);
    }

    #[test]
    fn test_tier_does_not_drop_within_run() {
        let mut dm = DifficultyManager::default();
        dm.update(3000.0);
        let u = dm.update(100.0);
        assert_eq!(u.milestone.name, "Runner");
        assert_eq!(u.progress, 0.0);
    }

    proptest! {
        #[test]
        fn prop_selects_highest_threshold_reached(d in 0.0f32..30000.0) {
            let mut dm = DifficultyManager::default();
            let u = dm.update(d);
            prop_assert!(u.milestone.distance_threshold <= d);
            if let Some(next) = DIFFICULTY_MILESTONES.get(u.index + 1) {
                prop_assert!(next.distance_threshold > d);
            }
        }

        #[test]
        fn prop_progress_in_range(d in -1000.0f32..50000.0) {
            let mut dm = DifficultyManager::default();
            let p = dm.update(d).progress;
            prop_assert!((0.0..=100.0).contains(&p));
        }

        #[test]
        fn prop_monotonic_and_idempotent(mut ds in proptest::collection::vec(0.0f32..20000.0, 1..32)) {
            ds.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mut dm = DifficultyManager::default();
            let mut last = 0;
            for d in ds {
                let first = dm.update(d);
                let again = dm.update(d);
                prop_assert!(first.index >= last);
                prop_assert_eq!(first.index, again.index);
                prop_assert!(!again.tier_increased);
                last = first.index;
            }
        }
    }
}
