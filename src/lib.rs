//! SkyRun - an endless runner with an optional reward-contract bridge
//!
//! Core modules:
//! - `sim`: Deterministic simulation (runner physics, difficulty curve, effects)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Player progress in LocalStorage
//! - `wallet`: Bridge to the JS wallet layer
//! - `contract`: Reward contract ABI encoding
//! - `quests`, `shop`, `highscores`, `settings`: Meta progression and preferences

pub mod audio;
pub mod contract;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod quests;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod shop;
pub mod sim;
pub mod wallet;

pub use highscores::HighScores;
pub use persistence::PlayerProgress;
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, particle lifetimes are tuned to it)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Visible world in metres (16:9)
    pub const VIEW_WIDTH: f32 = 24.0;
    pub const VIEW_HEIGHT: f32 = 13.5;
    /// Ground line height above the bottom of the view
    pub const GROUND_Y: f32 = 2.0;

    /// Runner defaults
    pub const PLAYER_X: f32 = 4.0;
    pub const PLAYER_WIDTH: f32 = 0.8;
    pub const PLAYER_HEIGHT: f32 = 1.6;
    pub const PLAYER_SLIDE_HEIGHT: f32 = 0.8;
    /// Gravity (m/s², downward)
    pub const GRAVITY: f32 = 40.0;
    /// Take-off velocity (m/s) - apex about 2.8 m
    pub const JUMP_VELOCITY: f32 = 15.0;
    /// Slide duration (seconds)
    pub const SLIDE_DURATION: f32 = 0.7;

    /// Scroll speed at tier multiplier 1.0 (m/s)
    pub const BASE_RUN_SPEED: f32 = 12.0;
    /// Extra multiplier while the booster is active
    pub const BOOSTER_SPEED_FACTOR: f32 = 1.5;
    /// Obstacles spawn just beyond the right edge
    pub const SPAWN_X: f32 = VIEW_WIDTH + 1.0;
    /// Jitter applied to the spawn interval (fraction)
    pub const SPAWN_JITTER: f32 = 0.2;

    /// Points per coin
    pub const COIN_SCORE: u64 = 10;
    pub const COIN_RADIUS: f32 = 0.3;
    pub const PICKUP_SIZE: f32 = 0.7;

    /// Seconds spent in the crash screen before the run ends
    pub const CRASH_GRACE_SECS: f32 = 3.0;
    /// Invulnerability after continuing with a lifeline
    pub const REVIVE_INVULNERABLE_SECS: f32 = 2.0;

    /// Base power-up durations (seconds), extended by shop levels
    pub const SHIELD_BASE_SECS: f32 = 6.0;
    pub const BOOSTER_BASE_SECS: f32 = 4.0;
    pub const MAGNET_SECS: f32 = 8.0;
    pub const POWERUP_SECS_PER_LEVEL: f32 = 1.5;

    /// Seconds the "difficulty increased" banner stays up
    pub const BANNER_SECS: f32 = 2.5;
}

/// Convert seconds to whole simulation ticks
#[inline]
pub fn secs_to_ticks(secs: f32) -> u32 {
    (secs / consts::SIM_DT).round().max(0.0) as u32
}
