//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod particles;
pub mod shake;
pub mod state;
pub mod tick;

pub use collision::{Aabb, circle_aabb_overlap};
pub use difficulty::{
    DIFFICULTY_MILESTONES, DifficultyManager, DifficultyMilestone, DifficultyState,
    DifficultyUpdate,
};
pub use particles::{Particle, ParticleKind, ParticleSystem};
pub use shake::ScreenShake;
pub use state::{
    Banner, Coin, GameEvent, GamePhase, GameState, Loadout, Obstacle, ObstacleKind, Pickup,
    PickupKind, RunStats, Runner,
};
pub use tick::{TickInput, tick};
