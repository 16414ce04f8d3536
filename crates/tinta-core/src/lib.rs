//! Tinta Core — domain layer for LUT color filters.
//!
//! This crate contains the filter identifiers, the tiled 3D LUT layout,
//! the CPU reference lookup and the filter→LUT registry. No GPU or async
//! runtime dependencies.

pub mod error;
pub mod filter;
pub mod lut;
pub mod presets;
pub mod raster;
pub mod registry;

// Re-exports for convenience.
pub use error::CoreError;
pub use filter::FilterId;
pub use lut::apply::{apply_to_image, blend};
pub use lut::layout::{CUBE_SIZE, GRID, LutLayout};
pub use lut::tiled::TiledLut;
pub use registry::{LutRegistry, LutSlot, LutSource};
