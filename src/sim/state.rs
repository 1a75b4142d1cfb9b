//! Game state and core simulation types
//!
//! Everything a run needs lives here; the tick mutates it in place.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::Aabb;
use super::difficulty::DifficultyManager;
use super::particles::ParticleSystem;
use super::shake::ScreenShake;
use crate::consts::*;
use crate::secs_to_ticks;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Runner waiting at the start line for the first jump
    Ready,
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Hit an obstacle; a lifeline can continue the run
    Crashed,
    /// Run ended
    GameOver,
}

/// The player character
#[derive(Debug, Clone, Default)]
pub struct Runner {
    /// Feet height above the ground line
    pub y: f32,
    /// Vertical velocity (m/s, up positive)
    pub vy: f32,
    pub grounded: bool,
    /// Ticks of slide remaining
    pub slide_ticks: u32,
    /// Ticks of post-revive invulnerability remaining
    pub invulnerable_ticks: u32,
}

impl Runner {
    pub fn new() -> Self {
        Self {
            grounded: true,
            ..Default::default()
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.slide_ticks > 0
    }

    pub fn height(&self) -> f32 {
        if self.is_sliding() {
            PLAYER_SLIDE_HEIGHT
        } else {
            PLAYER_HEIGHT
        }
    }

    /// World-space box of the runner
    pub fn bounds(&self) -> Aabb {
        Aabb::from_origin_size(
            Vec2::new(PLAYER_X, GROUND_Y + self.y),
            Vec2::new(PLAYER_WIDTH, self.height()),
        )
    }

    /// Slightly forgiving box used for obstacle hits
    pub fn hitbox(&self) -> Aabb {
        self.bounds().shrink(0.1)
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    /// Box on the ground - jump over
    Crate,
    /// Overhead beam - slide under
    Barrier,
    /// Low spikes - jump over
    Spikes,
}

impl ObstacleKind {
    /// Offset of the bottom edge above the ground line
    pub fn elevation(&self) -> f32 {
        match self {
            ObstacleKind::Barrier => 1.0,
            _ => 0.0,
        }
    }

    pub fn size(&self) -> Vec2 {
        match self {
            ObstacleKind::Crate => Vec2::new(1.0, 1.0),
            ObstacleKind::Barrier => Vec2::new(0.8, 3.0),
            ObstacleKind::Spikes => Vec2::new(1.2, 0.6),
        }
    }
}

/// An obstacle scrolling toward the runner
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Left edge in view space
    pub x: f32,
}

impl Obstacle {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_origin_size(
            Vec2::new(self.x, GROUND_Y + self.kind.elevation()),
            self.kind.size(),
        )
    }

    /// Right edge in view space
    pub fn right(&self) -> f32 {
        self.x + self.kind.size().x
    }
}

/// A collectible coin
#[derive(Debug, Clone)]
pub struct Coin {
    pub id: u32,
    pub pos: Vec2,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    /// Absorbs one obstacle hit
    Shield,
    /// Faster scrolling, more distance
    Booster,
    /// Pulls nearby coins in
    Magnet,
}

/// A power-up pickup
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
}

impl Pickup {
    pub fn bounds(&self) -> Aabb {
        let half = Vec2::splat(PICKUP_SIZE / 2.0);
        Aabb {
            min: self.pos - half,
            max: self.pos + half,
        }
    }
}

/// Active power-up effects
#[derive(Debug, Clone, Default)]
pub struct ActiveEffects {
    pub shield_ticks: u32,
    pub booster_ticks: u32,
    pub magnet_ticks: u32,
}

impl ActiveEffects {
    pub fn shield_active(&self) -> bool {
        self.shield_ticks > 0
    }

    pub fn booster_active(&self) -> bool {
        self.booster_ticks > 0
    }

    pub fn magnet_active(&self) -> bool {
        self.magnet_ticks > 0
    }

    pub fn decay(&mut self) {
        self.shield_ticks = self.shield_ticks.saturating_sub(1);
        self.booster_ticks = self.booster_ticks.saturating_sub(1);
        self.magnet_ticks = self.magnet_ticks.saturating_sub(1);
    }
}

/// Shop upgrades carried into a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loadout {
    pub shield_level: u8,
    pub booster_level: u8,
}

impl Loadout {
    pub fn shield_secs(&self) -> f32 {
        SHIELD_BASE_SECS + self.shield_level as f32 * POWERUP_SECS_PER_LEVEL
    }

    pub fn booster_secs(&self) -> f32 {
        BOOSTER_BASE_SECS + self.booster_level as f32 * POWERUP_SECS_PER_LEVEL
    }
}

/// Per-run counters folded into player progress when the run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub jumps: u32,
    pub slides: u32,
    pub coins: u32,
    pub obstacles_passed: u32,
    pub lifelines_used: u32,
}

/// Transient overlay text (difficulty tier changes)
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: String,
    pub ticks_left: u32,
}

/// Things that happened during a tick, drained by the host for audio/HUD/persistence
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RunStarted,
    Jumped,
    Slid,
    CoinCollected { total: u32 },
    PowerUpCollected(PickupKind),
    ShieldAbsorbed,
    DifficultyIncreased { index: usize, name: &'static str },
    Crashed { distance: f32 },
    Revived { lifelines_left: u32 },
    GameOver { score: u64, distance: f32, coins: u32 },
}

/// Complete state of a run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub runner: Runner,
    /// Active obstacles (sorted by id for determinism)
    pub obstacles: Vec<Obstacle>,
    pub coins: Vec<Coin>,
    pub pickups: Vec<Pickup>,
    pub effects: ActiveEffects,
    /// Metres travelled this run
    pub distance: f32,
    /// Current scroll speed (m/s)
    pub speed: f32,
    pub stats: RunStats,
    /// Lifelines available to continue after a crash
    pub lifelines: u32,
    pub loadout: Loadout,
    pub difficulty: DifficultyManager,
    /// Seconds until the next obstacle may spawn
    pub spawn_timer: f32,
    /// Ticks left in the crash screen
    pub crash_ticks: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    pub shake: ScreenShake,
    /// Whether impacts start a screen shake (settings)
    pub shake_enabled: bool,
    pub banner: Option<Banner>,
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

/// Grace period before the first obstacle (seconds)
pub const FIRST_SPAWN_DELAY: f32 = 1.5;
/// Default particle cap when no settings are applied
pub const DEFAULT_MAX_PARTICLES: usize = 500;

impl GameState {
    /// Create a new run with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Ready,
            runner: Runner::new(),
            obstacles: Vec::new(),
            coins: Vec::new(),
            pickups: Vec::new(),
            effects: ActiveEffects::default(),
            distance: 0.0,
            speed: 0.0,
            stats: RunStats::default(),
            lifelines: 0,
            loadout: Loadout::default(),
            difficulty: DifficultyManager::default(),
            spawn_timer: FIRST_SPAWN_DELAY,
            crash_ticks: 0,
            time_ticks: 0,
            particles: ParticleSystem::new(DEFAULT_MAX_PARTICLES),
            shake: ScreenShake::default(),
            shake_enabled: true,
            banner: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Start over with a new seed, keeping loadout, lifelines and effect settings
    pub fn restart(&mut self, seed: u64) {
        let loadout = self.loadout;
        let lifelines = self.lifelines;
        let shake_enabled = self.shake_enabled;
        let mut particles = std::mem::take(&mut self.particles);
        particles.clear();

        *self = Self::new(seed);
        self.loadout = loadout;
        self.lifelines = lifelines;
        self.shake_enabled = shake_enabled;
        self.particles = particles;
        self.difficulty.reset();
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Distance metres plus coin bonus
    pub fn score(&self) -> u64 {
        self.distance.max(0.0).floor() as u64 + self.stats.coins as u64 * COIN_SCORE
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Shake the camera if enabled
    pub fn add_shake(&mut self, intensity: f32, duration: f32) {
        if self.shake_enabled {
            self.shake.start(intensity, duration);
        }
    }

    pub fn show_banner(&mut self, text: String) {
        self.banner = Some(Banner {
            text,
            ticks_left: secs_to_ticks(BANNER_SECS),
        });
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.obstacles.sort_by_key(|o| o.id);
        self.coins.sort_by_key(|c| c.id);
        self.pickups.sort_by_key(|p| p.id);
    }
}
