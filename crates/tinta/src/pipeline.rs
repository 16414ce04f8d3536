//! The fail-open LUT operation.
//!
//! [`LutPipeline::apply_lut`] never fails from the caller's point of view:
//! on any problem it logs and hands back the source URI, so a filter can
//! only ever degrade to "no filter".

use std::path::PathBuf;
use std::sync::Arc;

use tinta_core::lut::layout::clamp_unit;
use tinta_core::{FilterId, LutRegistry, LutSlot};

use crate::assets::AssetLoader;
use crate::backend::{RenderBackend, RenderJob};
use crate::completion::completion;
use crate::config::PipelineConfig;
use crate::error::{ApplyError, ConfigError, RenderError, SinkError};
use crate::sink::FileSink;
use crate::uri;

pub struct LutPipeline {
    registry: LutRegistry,
    assets: AssetLoader,
    backend: Arc<dyn RenderBackend>,
    sink: FileSink,
    config: PipelineConfig,
}

impl LutPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let registry = config.registry()?;
        let backend = config.backend.build();
        let sink = FileSink::new(&config.output_dir, config.jpeg_quality);

        tracing::info!(
            "LUT pipeline ready (backend {}, output {})",
            backend.name(),
            sink.dir().display()
        );

        Ok(Self {
            registry,
            assets: AssetLoader::new(),
            backend,
            sink,
            config,
        })
    }

    /// Replace the filter→LUT table.
    pub fn with_registry(mut self, registry: LutRegistry) -> Self {
        self.registry = registry;
        self.assets.clear();
        self
    }

    /// Replace the renderer.
    pub fn with_backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn registry(&self) -> &LutRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetLoader {
        &self.assets
    }

    pub fn sink(&self) -> &FileSink {
        &self.sink
    }

    /// [`apply_lut`](Self::apply_lut) at the configured default intensity.
    pub async fn apply(&self, source_uri: &str, filter: FilterId) -> String {
        self.apply_lut(source_uri, filter, self.config.default_intensity)
            .await
    }

    /// Grade `source_uri` with `filter` at `intensity` and return the URI of
    /// the new JPEG, or `source_uri` itself when nothing was (or could be)
    /// applied.
    pub async fn apply_lut(&self, source_uri: &str, filter: FilterId, intensity: f32) -> String {
        match self.try_apply(source_uri, filter, intensity).await {
            Ok(Some(path)) => uri::from_path(&path, source_uri),
            Ok(None) => source_uri.to_string(),
            Err(ApplyError::Unbound(filter)) => {
                tracing::warn!("No LUT bound for filter `{filter}`, keeping original image");
                source_uri.to_string()
            }
            Err(e) => {
                tracing::warn!("Failed to apply filter `{filter}` to {source_uri}: {e}");
                source_uri.to_string()
            }
        }
    }

    /// Same as [`apply_lut`](Self::apply_lut) but reports why nothing was
    /// written. `Ok(None)` means the filter has no transform.
    pub async fn try_apply(
        &self,
        source_uri: &str,
        filter: FilterId,
        intensity: f32,
    ) -> Result<Option<PathBuf>, ApplyError> {
        let source = match self.registry.resolve(filter) {
            LutSlot::Disabled => {
                tracing::debug!("Filter `{filter}` is disabled");
                return Ok(None);
            }
            LutSlot::Unbound => return Err(ApplyError::Unbound(filter)),
            LutSlot::Bound(source) => source,
        };

        // Source photos are single-use; only LUTs stay cached. The lease
        // evicts on every exit, including a failed LUT load or cancellation.
        let lease = SourceLease {
            assets: &self.assets,
            uri: source_uri,
        };
        let (image, lut) = tokio::try_join!(
            self.assets.load_image(source_uri),
            self.assets.load_lut(source),
        )?;
        drop(lease);

        let job = RenderJob {
            source: image,
            lut,
            intensity: clamp_unit(intensity),
        };
        let (done, rx) = completion();
        let backend = Arc::clone(&self.backend);
        // Detached: if this future is dropped the worker still runs to the
        // end and releases its context.
        drop(tokio::task::spawn_blocking(move || backend.render(job, done)));
        let graded = rx.await.ok_or(RenderError::Abandoned)??;

        let sink = self.sink.clone();
        let path = tokio::task::spawn_blocking(move || sink.write_jpeg(&graded))
            .await
            .map_err(|e| SinkError::Worker(e.to_string()))??;

        tracing::info!(
            "Applied `{filter}` at {:.2} with {} backend -> {}",
            clamp_unit(intensity),
            self.backend.name(),
            path.display()
        );
        Ok(Some(path))
    }
}

/// Evicts a source image from the asset cache when dropped.
struct SourceLease<'a> {
    assets: &'a AssetLoader,
    uri: &'a str,
}

impl Drop for SourceLease<'_> {
    fn drop(&mut self) {
        self.assets.evict_image(self.uri);
    }
}
