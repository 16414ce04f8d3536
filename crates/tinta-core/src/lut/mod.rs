//! Tiled 3D LUTs: layout math, the texture-backed LUT type, and the CPU
//! reference of the GPU lookup.

pub mod apply;
pub mod layout;
pub mod tiled;
