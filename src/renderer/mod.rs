//! WebGPU rendering module
//!
//! The scene is flat-shaded triangles built on the CPU each frame
//! (`scene::build`) and drawn with a single alpha-blended pipeline.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use vertex::Vertex;
