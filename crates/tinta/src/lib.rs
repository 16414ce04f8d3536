//! Tinta — apply a named color filter to a photo and hand back a new file.
//!
//! The entry point is [`LutPipeline::apply_lut`]. It never fails: when the
//! filter is `none`, has no LUT, or any stage breaks (asset load, GPU setup,
//! shader link, snapshot write), the caller gets the source URI back.
//!
//! All async operations must run inside a Tokio runtime; decoding, rendering
//! and encoding happen on the blocking pool.

pub mod assets;
pub mod backend;
pub mod completion;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod sink;
pub mod uri;

pub use backend::{BackendKind, CpuBackend, GpuBackend, RenderBackend, RenderJob};
pub use config::PipelineConfig;
pub use error::{ApplyError, AssetError, ConfigError, RenderError, SinkError};
pub use export::{ExportRequest, MediaKind, prepare_for_upload};
pub use pipeline::LutPipeline;
pub use tinta_core::{FilterId, LutRegistry, LutSlot, LutSource};
