//! Vertex format shared by the world and HUD layers

use bytemuck::{Pod, Zeroable};

/// Position (world metres until `RenderState::render` maps it to NDC) plus RGBA
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Palette for the sky, ground and everything on the track
pub mod colors {
    pub const SKY: [f32; 4] = [0.35, 0.62, 0.92, 1.0];
    pub const GROUND: [f32; 4] = [0.28, 0.55, 0.25, 1.0];
    pub const GROUND_STRIPE: [f32; 4] = [0.22, 0.45, 0.2, 1.0];
    pub const RUNNER: [f32; 4] = [0.95, 0.45, 0.15, 1.0];
    pub const RUNNER_BOOSTED: [f32; 4] = [1.0, 0.8, 0.2, 1.0];
    pub const SHIELD: [f32; 4] = [0.4, 0.8, 1.0, 0.45];
    pub const CRATE: [f32; 4] = [0.6, 0.4, 0.2, 1.0];
    pub const BARRIER: [f32; 4] = [0.8, 0.15, 0.2, 1.0];
    pub const SPIKES: [f32; 4] = [0.55, 0.55, 0.6, 1.0];
    pub const COIN: [f32; 4] = [1.0, 0.84, 0.0, 1.0];
    pub const PICKUP_SHIELD: [f32; 4] = [0.3, 0.7, 1.0, 1.0];
    pub const PICKUP_BOOSTER: [f32; 4] = [1.0, 0.5, 0.1, 1.0];
    pub const PICKUP_MAGNET: [f32; 4] = [0.8, 0.3, 0.9, 1.0];
    pub const PROGRESS_TRACK: [f32; 4] = [0.0, 0.0, 0.0, 0.35];
    pub const PROGRESS_FILL: [f32; 4] = [1.0, 0.84, 0.0, 0.9];
    pub const BANNER: [f32; 4] = [0.1, 0.05, 0.2, 0.7];
}
