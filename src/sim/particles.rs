//! Cosmetic particle effects
//!
//! Integrated once per fixed tick in world units per tick. Particles never
//! affect gameplay; dead ones are filtered out at the start of each update.

use glam::Vec2;
use rand::Rng;

use crate::consts::SIM_DT;

/// What spawned the particle (drives color and lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Coin,
    Sparkle,
    Damage,
    PowerUp,
}

impl ParticleKind {
    /// Initial life in seconds
    pub fn life(&self) -> f32 {
        match self {
            ParticleKind::Coin => 0.8,
            ParticleKind::Sparkle => 0.5,
            ParticleKind::Damage => 1.0,
            ParticleKind::PowerUp => 1.2,
        }
    }

    /// Vertical acceleration per tick² (negative falls)
    pub fn gravity(&self) -> f32 {
        match self {
            ParticleKind::Coin => -0.006,
            ParticleKind::Sparkle => 0.0,
            ParticleKind::Damage => -0.012,
            ParticleKind::PowerUp => 0.002, // Floats upward
        }
    }

    pub fn color(&self) -> [f32; 4] {
        match self {
            ParticleKind::Coin => [1.0, 0.84, 0.0, 1.0],
            ParticleKind::Sparkle => [1.0, 1.0, 0.9, 1.0],
            ParticleKind::Damage => [1.0, 0.25, 0.2, 1.0],
            ParticleKind::PowerUp => [0.3, 0.9, 1.0, 1.0],
        }
    }
}

/// A single particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    /// Metres per tick
    pub vel: Vec2,
    pub gravity: f32,
    /// Remaining life in seconds
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    pub color: [f32; 4],
    pub kind: ParticleKind,
}

/// Life below this counts as spent (absorbs f32 drift of repeated SIM_DT steps)
const LIFE_EPSILON: f32 = 1.0e-4;

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, vel: Vec2, size: f32) -> Self {
        Self {
            pos,
            vel,
            gravity: kind.gravity(),
            life: kind.life(),
            max_life: kind.life(),
            size,
            color: kind.color(),
            kind,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.life <= LIFE_EPSILON
    }

    /// Remaining life as 0-1 (for alpha fade)
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    fn integrate(&mut self) {
        self.pos += self.vel;
        self.vel.y += self.gravity;
        self.life -= SIM_DT;
    }
}

/// The active particle set
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    /// Hard cap on live particles (0 disables spawning)
    max_particles: usize,
}

impl ParticleSystem {
    pub fn new(max_particles: usize) -> Self {
        Self {
            particles: Vec::with_capacity(max_particles.min(512)),
            max_particles,
        }
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
        self.particles.truncate(max);
    }

    /// Drop spent particles, then advance the rest by one tick
    pub fn update(&mut self) {
        self.particles.retain(|p| !p.is_dead());
        for p in &mut self.particles {
            p.integrate();
        }
    }

    pub fn spawn(&mut self, particle: Particle) {
        if self.particles.len() < self.max_particles {
            self.particles.push(particle);
        }
    }

    /// Golden burst fanning upward from a collected coin
    pub fn spawn_coin_burst(&mut self, pos: Vec2, rng: &mut impl Rng) {
        for _ in 0..8 {
            let angle = rng.random_range(0.2f32..std::f32::consts::PI - 0.2);
            let speed = rng.random_range(0.04f32..0.1);
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            let size = rng.random_range(0.08f32..0.16);
            self.spawn(Particle::new(ParticleKind::Coin, pos, vel, size));
        }
        self.spawn_sparkles(pos, 3, rng);
    }

    /// Short-lived glints with no gravity
    pub fn spawn_sparkles(&mut self, pos: Vec2, count: usize, rng: &mut impl Rng) {
        for _ in 0..count {
            let jitter = Vec2::new(rng.random_range(-0.3f32..0.3), rng.random_range(-0.3f32..0.3));
            let vel = Vec2::new(rng.random_range(-0.02f32..0.02), rng.random_range(-0.02f32..0.02));
            let size = rng.random_range(0.05f32..0.1);
            self.spawn(Particle::new(ParticleKind::Sparkle, pos + jitter, vel, size));
        }
    }

    /// Debris spray on a collision
    pub fn spawn_damage(&mut self, pos: Vec2, rng: &mut impl Rng) {
        for _ in 0..16 {
            let angle = rng.random_range(0.0f32..std::f32::consts::TAU);
            let speed = rng.random_range(0.05f32..0.18);
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            let size = rng.random_range(0.1f32..0.22);
            self.spawn(Particle::new(ParticleKind::Damage, pos, vel, size));
        }
    }

    /// Rising ring when a power-up is picked up
    pub fn spawn_powerup(&mut self, pos: Vec2, rng: &mut impl Rng) {
        let count = 12;
        for i in 0..count {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let speed = 0.06 + rng.random_range(0.0f32..0.02);
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            self.spawn(Particle::new(ParticleKind::PowerUp, pos, vel, 0.14));
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
