//! Render backends: where the graded frame is actually produced.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tinta_core::{TiledLut, apply_to_image};
use tinta_gpu::{GpuContext, GpuError, render_offscreen};

use crate::completion::Completion;
use crate::error::{ConfigError, RenderError};

pub type RenderResult = Result<RgbaImage, RenderError>;

/// Everything a backend needs for one frame.
#[derive(Clone)]
pub struct RenderJob {
    pub source: Arc<RgbaImage>,
    pub lut: Arc<TiledLut>,
    pub intensity: f32,
}

/// Produces a graded frame for a [`RenderJob`].
///
/// `render` runs on a blocking worker. Implementations must settle `done`
/// on every path (or drop it, which the pipeline treats as a failure) and
/// release their surface before returning.
pub trait RenderBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn render(&self, job: RenderJob, done: Completion<RenderResult>);
}

/// Renders on the GPU, one scoped device per job.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpuBackend;

impl RenderBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn render(&self, job: RenderJob, done: Completion<RenderResult>) {
        let ctx = match GpuContext::create_blocking() {
            Ok(ctx) => ctx,
            Err(e) => {
                done.settle(Err(e.into()));
                return;
            }
        };

        let lost = done.clone();
        ctx.on_device_lost(move |message| {
            if lost.settle(Err(GpuError::DeviceLost(message.clone()).into())) {
                tracing::warn!("GPU device lost during LUT render: {message}");
            }
        });

        let result = render_offscreen(&ctx, &job.source, &job.lut, job.intensity);
        done.settle(result.map_err(RenderError::from));
        // Dropping `ctx` releases the device; its lost callback then finds
        // the completion already settled.
    }
}

/// Renders with the CPU reference lookup. Same numeric semantics as the
/// shader; used headless and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuBackend;

impl RenderBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn render(&self, job: RenderJob, done: Completion<RenderResult>) {
        let image = apply_to_image(&job.source, &job.lut, job.intensity);
        done.settle(Ok(image));
    }
}

/// Which backend the pipeline renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Gpu,
    Cpu,
}

impl BackendKind {
    pub fn build(self) -> Arc<dyn RenderBackend> {
        match self {
            Self::Gpu => Arc::new(GpuBackend),
            Self::Cpu => Arc::new(CpuBackend),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu => write!(f, "gpu"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(ConfigError::Invalid(format!("unknown backend `{other}`"))),
        }
    }
}
