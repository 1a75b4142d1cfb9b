//! Player progress persistence
//!
//! Progress lives in plain LocalStorage scalars so the legacy page scripts can
//! keep reading the same keys:
//! - `HI`, `myCoins`, `jumps`, `deaths`, `slides`
//! - `shieldLevel`, `boosterLevel`, `pageMuted`
//!
//! `hashconnectData` belongs to the wallet SDK; we only ever clear it.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::sim::{Loadout, RunStats};

pub mod keys {
    pub const HIGH_SCORE: &str = "HI";
    pub const COINS: &str = "myCoins";
    pub const JUMPS: &str = "jumps";
    pub const DEATHS: &str = "deaths";
    pub const SLIDES: &str = "slides";
    pub const SHIELD_LEVEL: &str = "shieldLevel";
    pub const BOOSTER_LEVEL: &str = "boosterLevel";
    pub const PAGE_MUTED: &str = "pageMuted";
    pub const HASHCONNECT_DATA: &str = "hashconnectData";
}

/// String key-value storage (LocalStorage in the browser)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for native builds and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    /// None when storage is unavailable (private mode, sandboxed iframe)
    pub fn open() -> Option<Self> {
        let storage = crate::platform::local_storage()?;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if self.storage.set_item(key, value).is_err() {
            log::warn!("LocalStorage write failed for {}", key);
        }
    }

    fn remove(&self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}

/// Upgrade levels cap
pub const MAX_UPGRADE_LEVEL: u8 = 5;

/// Typed view of the progress scalars
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerProgress {
    pub high_score: u64,
    pub coins: u64,
    pub jumps: u64,
    pub deaths: u64,
    pub slides: u64,
    pub shield_level: u8,
    pub booster_level: u8,
    pub muted: bool,
}

/// Largest float counter accepted from storage (2^53)
const MAX_EXACT_FLOAT_COUNT: f64 = 9_007_199_254_740_992.0;

/// Parse a stored counter, falling back to 0 on garbage
fn read_u64(store: &dyn KeyValueStore, key: &str) -> u64 {
    let Some(raw) = store.get(key) else {
        return 0;
    };
    let trimmed = raw.trim();
    // Older page scripts wrote floats ("12.0")
    match trimmed.parse::<u64>() {
        Ok(v) => v,
        Err(_) => match trimmed.parse::<f64>() {
            // Past 2^53 a float no longer holds an exact count
            Ok(f) if f.is_finite() && (0.0..=MAX_EXACT_FLOAT_COUNT).contains(&f) => f as u64,
            _ => {
                log::warn!("Ignoring malformed value for {}: {:?}", key, raw);
                0
            }
        },
    }
}

fn read_level(store: &dyn KeyValueStore, key: &str) -> u8 {
    read_u64(store, key).min(MAX_UPGRADE_LEVEL as u64) as u8
}

impl PlayerProgress {
    /// Load progress; missing or malformed keys fall back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let progress = Self {
            high_score: read_u64(store, keys::HIGH_SCORE),
            coins: read_u64(store, keys::COINS),
            jumps: read_u64(store, keys::JUMPS),
            deaths: read_u64(store, keys::DEATHS),
            slides: read_u64(store, keys::SLIDES),
            shield_level: read_level(store, keys::SHIELD_LEVEL),
            booster_level: read_level(store, keys::BOOSTER_LEVEL),
            muted: store.get(keys::PAGE_MUTED).as_deref() == Some("true"),
        };
        log::info!(
            "Loaded progress: high score {}, {} coins",
            progress.high_score,
            progress.coins
        );
        progress
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        store.set(keys::HIGH_SCORE, &self.high_score.to_string());
        store.set(keys::COINS, &self.coins.to_string());
        store.set(keys::JUMPS, &self.jumps.to_string());
        store.set(keys::DEATHS, &self.deaths.to_string());
        store.set(keys::SLIDES, &self.slides.to_string());
        store.set(keys::SHIELD_LEVEL, &self.shield_level.to_string());
        store.set(keys::BOOSTER_LEVEL, &self.booster_level.to_string());
        store.set(keys::PAGE_MUTED, if self.muted { "true" } else { "false" });
    }

    /// Fold a finished run into the totals. Returns true on a new high score.
    pub fn record_run(&mut self, score: u64, stats: &RunStats) -> bool {
        self.coins = self.coins.saturating_add(stats.coins as u64);
        self.jumps = self.jumps.saturating_add(stats.jumps as u64);
        self.slides = self.slides.saturating_add(stats.slides as u64);
        self.deaths = self.deaths.saturating_add(1);
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }

    pub fn loadout(&self) -> Loadout {
        Loadout {
            shield_level: self.shield_level,
            booster_level: self.booster_level,
        }
    }

    /// Forget the wallet pairing cached by the wallet SDK
    pub fn clear_wallet_pairing(store: &dyn KeyValueStore) {
        store.remove(keys::HASHCONNECT_DATA);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_on_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(PlayerProgress::load(&store), PlayerProgress::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let progress = PlayerProgress {
            high_score: 4200,
            coins: 310,
            jumps: 99,
            deaths: 7,
            slides: 12,
            shield_level: 2,
            booster_level: 1,
            muted: true,
        };
        progress.save(&store);
        assert_eq!(store.get("HI").as_deref(), Some("4200"));
        assert_eq!(store.get("pageMuted").as_deref(), Some("true"));
        assert_eq!(PlayerProgress::load(&store), progress);
    }

    #[test]
    fn test_malformed_values() {
        let store = MemoryStore::new();
        store.set("HI", "not a number");
        store.set("myCoins", "12.0");
        store.set("jumps", "-4");
        store.set("shieldLevel", "99");
        let progress = PlayerProgress::load(&store);
        assert_eq!(progress.high_score, 0);
        assert_eq!(progress.coins, 12);
        assert_eq!(progress.jumps, 0);
        assert_eq!(progress.shield_level, MAX_UPGRADE_LEVEL);
    }

    #[test]
    fn test_record_run() {
        let mut progress = PlayerProgress {
            high_score: 100,
            ..Default::default()
        };
        let stats = RunStats {
            jumps: 5,
            slides: 2,
            coins: 9,
            ..Default::default()
        };
        assert!(!progress.record_run(80, &stats));
        assert!(progress.record_run(150, &stats));
        assert_eq!(progress.high_score, 150);
        assert_eq!(progress.coins, 18);
        assert_eq!(progress.deaths, 2);
        assert_eq!(progress.jumps, 10);
    }

    #[test]
    fn test_huge_float_counter_is_malformed() {
        let store = MemoryStore::new();
        store.set("myCoins", "1e30");
        store.set("jumps", "4.0e15");
        let mut progress = PlayerProgress::load(&store);
        assert_eq!(progress.coins, 0);
        assert_eq!(progress.jumps, 4_000_000_000_000_000);

        let stats = RunStats {
            coins: 5,
            ..Default::default()
        };
        progress.record_run(100, &stats);
        assert_eq!(progress.coins, 5);
    }

    #[test]
    fn test_record_run_saturates() {
        let mut progress = PlayerProgress {
            coins: u64::MAX - 1,
            jumps: u64::MAX,
            slides: u64::MAX,
            deaths: u64::MAX,
            ..Default::default()
        };
        let stats = RunStats {
            jumps: 3,
            slides: 3,
            coins: 5,
            ..Default::default()
        };
        progress.record_run(1, &stats);
        assert_eq!(progress.coins, u64::MAX);
        assert_eq!(progress.jumps, u64::MAX);
        assert_eq!(progress.slides, u64::MAX);
        assert_eq!(progress.deaths, u64::MAX);
    }

    #[test]
    fn test_clear_wallet_pairing() {
        let store = MemoryStore::new();
        store.set("hashconnectData", "{}");
        PlayerProgress::clear_wallet_pairing(&store);
        assert!(store.get("hashconnectData").is_none());
    }
}
