//! Tinta GPU — wgpu render pass that grades an image through a tiled 3D LUT.
//!
//! This crate owns all GPU resources. No async runtime dependency; it exposes
//! a blocking wgpu API that `tinta` drives from a worker thread.

pub mod context;
pub mod error;
pub mod lut_applicator;
pub mod readback;
pub mod renderer;
pub mod textures;

pub use context::GpuContext;
pub use error::GpuError;
pub use lut_applicator::LutApplicator;
pub use renderer::{LutRenderer, RenderOutput, RenderTarget, render_offscreen};
pub use textures::{GpuTexture, RenderTexture};
