//! Builds the frame's vertex list from the game state
//!
//! Everything is emitted in world metres; `world_to_ndc` maps the fixed
//! `VIEW_WIDTH x VIEW_HEIGHT` view into the viewport, letterboxed.

use glam::Vec2;
use rand::Rng;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::consts::{BANNER_SECS, COIN_RADIUS, GROUND_Y, PICKUP_SIZE, VIEW_HEIGHT, VIEW_WIDTH};
use crate::secs_to_ticks;
use crate::sim::{GameState, ObstacleKind, PickupKind};

/// Spacing of the scrolling ground stripes (metres)
const STRIPE_SPACING: f32 = 2.0;
/// Progress bar geometry (metres, screen-fixed)
const PROGRESS_BAR_WIDTH: f32 = 8.0;
const PROGRESS_BAR_HEIGHT: f32 = 0.3;
/// Banner fades out over its last half second
const BANNER_FADE_SECS: f32 = 0.5;

/// Map a world position to NDC for a viewport of the given aspect (w / h)
pub fn world_to_ndc(pos: Vec2, aspect: f32) -> Vec2 {
    let centered = pos - Vec2::new(VIEW_WIDTH, VIEW_HEIGHT) * 0.5;
    let view_aspect = VIEW_WIDTH / VIEW_HEIGHT;
    if aspect > view_aspect {
        // Pillarbox
        Vec2::new(
            centered.x * 2.0 / (VIEW_HEIGHT * aspect),
            centered.y * 2.0 / VIEW_HEIGHT,
        )
    } else {
        // Letterbox
        Vec2::new(
            centered.x * 2.0 / VIEW_WIDTH,
            centered.y * 2.0 * aspect / VIEW_WIDTH,
        )
    }
}

fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * alpha]
}

fn offset_all(vertices: &mut [Vertex], offset: Vec2) {
    if offset == Vec2::ZERO {
        return;
    }
    for v in vertices {
        v.position[0] += offset.x;
        v.position[1] += offset.y;
    }
}

/// World geometry (shaken) followed by the HUD overlay (steady).
/// `rng` only drives cosmetic jitter so the simulation RNG stays untouched.
pub fn build(state: &GameState, circle_segments: u32, rng: &mut impl Rng) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(1024);

    push_world(state, circle_segments, &mut vertices);
    offset_all(&mut vertices, state.shake.offset(rng));
    push_hud(state, &mut vertices);

    vertices
}

fn push_world(state: &GameState, segments: u32, out: &mut Vec<Vertex>) {
    // Ground band overdraws the bottom of the view so shake never exposes sky
    out.extend(shapes::rect(
        Vec2::new(-1.0, -1.0),
        Vec2::new(VIEW_WIDTH + 1.0, GROUND_Y),
        colors::GROUND,
    ));
    let phase = state.distance.rem_euclid(STRIPE_SPACING);
    let mut x = -phase;
    while x < VIEW_WIDTH + STRIPE_SPACING {
        out.extend(shapes::rect(
            Vec2::new(x, GROUND_Y - 0.25),
            Vec2::new(x + STRIPE_SPACING * 0.5, GROUND_Y),
            colors::GROUND_STRIPE,
        ));
        x += STRIPE_SPACING;
    }

    for obstacle in &state.obstacles {
        let b = obstacle.bounds();
        match obstacle.kind {
            ObstacleKind::Crate => out.extend(shapes::aabb(&b, colors::CRATE)),
            ObstacleKind::Barrier => out.extend(shapes::aabb(&b, colors::BARRIER)),
            ObstacleKind::Spikes => {
                // Three teeth across the footprint
                let w = (b.max.x - b.min.x) / 3.0;
                for i in 0..3 {
                    let x0 = b.min.x + w * i as f32;
                    out.extend(shapes::spike(
                        Vec2::new(x0, b.min.y),
                        Vec2::new(x0 + w, b.max.y),
                        colors::SPIKES,
                    ));
                }
            }
        }
    }

    for coin in &state.coins {
        out.extend(shapes::circle(coin.pos, COIN_RADIUS, colors::COIN, segments));
    }

    for pickup in &state.pickups {
        let color = match pickup.kind {
            PickupKind::Shield => colors::PICKUP_SHIELD,
            PickupKind::Booster => colors::PICKUP_BOOSTER,
            PickupKind::Magnet => colors::PICKUP_MAGNET,
        };
        out.extend(shapes::circle(pickup.pos, PICKUP_SIZE * 0.5, color, segments));
    }

    push_runner(state, segments, out);

    for particle in state.particles.iter() {
        let color = with_alpha(particle.color, particle.life_fraction());
        out.extend(shapes::circle(particle.pos, particle.size, color, 6));
    }
}

fn push_runner(state: &GameState, segments: u32, out: &mut Vec<Vertex>) {
    let runner = &state.runner;
    // Blink while invulnerable after a revive
    if runner.invulnerable_ticks > 0 && (runner.invulnerable_ticks / 6) % 2 == 0 {
        return;
    }
    let bounds = runner.bounds();
    let color = if state.effects.booster_active() {
        colors::RUNNER_BOOSTED
    } else {
        colors::RUNNER
    };
    out.extend(shapes::aabb(&bounds, color));

    if state.effects.shield_active() {
        let radius = bounds.size().max_element() * 0.75;
        out.extend(shapes::ring(
            bounds.center(),
            radius - 0.1,
            radius,
            colors::SHIELD,
            segments * 2,
        ));
    }
}

fn push_hud(state: &GameState, out: &mut Vec<Vertex>) {
    // Progress toward the next difficulty tier
    let left = (VIEW_WIDTH - PROGRESS_BAR_WIDTH) * 0.5;
    let top = VIEW_HEIGHT - 0.6;
    let bottom = top - PROGRESS_BAR_HEIGHT;
    out.extend(shapes::rect(
        Vec2::new(left, bottom),
        Vec2::new(left + PROGRESS_BAR_WIDTH, top),
        colors::PROGRESS_TRACK,
    ));
    let fraction = state.difficulty.progress_to_next_milestone() / 100.0;
    if fraction > 0.0 {
        out.extend(shapes::rect(
            Vec2::new(left, bottom),
            Vec2::new(left + PROGRESS_BAR_WIDTH * fraction, top),
            colors::PROGRESS_FILL,
        ));
    }

    // Band behind the DOM banner text
    if let Some(banner) = &state.banner {
        let fade_ticks = secs_to_ticks(BANNER_FADE_SECS.min(BANNER_SECS)).max(1);
        let alpha = (banner.ticks_left as f32 / fade_ticks as f32).min(1.0);
        let mid = VIEW_HEIGHT * 0.65;
        out.extend(shapes::rect(
            Vec2::new(0.0, mid - 0.9),
            Vec2::new(VIEW_WIDTH, mid + 0.9),
            with_alpha(colors::BANNER, alpha),
        ));
    }
}
