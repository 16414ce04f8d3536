use std::path::PathBuf;

use tinta_core::{CoreError, FilterId};
use tinta_gpu::GpuError;

/// Failure loading a source image or LUT.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("unsupported URI scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("malformed file URI `{uri}`: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("invalid LUT: {0}")]
    Lut(#[from] CoreError),
    #[error("filter `{0}` has no preset")]
    NoPreset(FilterId),
    #[error("asset worker failed: {0}")]
    Worker(String),
}

/// Failure producing the graded frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("render finished without reporting a result")]
    Abandoned,
    #[error("{0}")]
    Backend(String),
}

/// Failure writing the output file.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("sink worker failed: {0}")]
    Worker(String),
}

/// Why a filter was not applied. Only ever logged; callers get the source URI.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("no LUT bound for filter `{0}`")]
    Unbound(FilterId),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
