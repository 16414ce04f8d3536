//! Pipeline configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tinta_core::{FilterId, LutRegistry, LutSource};

use crate::backend::BackendKind;
use crate::error::ConfigError;
use crate::sink::{DEFAULT_JPEG_QUALITY, default_output_dir};

/// Runtime configuration for [`LutPipeline`](crate::LutPipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Renderer used for every invocation.
    pub backend: BackendKind,
    /// Directory graded JPEGs are written to.
    pub output_dir: PathBuf,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// Intensity used by [`LutPipeline::apply`](crate::LutPipeline::apply).
    pub default_intensity: f32,
    /// LUT images that replace the built-in presets.
    pub luts: HashMap<FilterId, PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: std::env::var("TINTA_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            output_dir: std::env::var_os("TINTA_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_output_dir),
            jpeg_quality: std::env::var("TINTA_JPEG_QUALITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            default_intensity: 1.0,
            luts: HashMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Read a `.toml` or `.json` config file. Missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            Some("toml") => toml::from_str(&text)?,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported config extension {other:?} for {}",
                    path.display()
                )));
            }
        };
        config.validated()
    }

    /// Check ranges and normalise the default intensity into `0..=1`.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.luts.contains_key(&FilterId::None) {
            return Err(ConfigError::Invalid(
                "filter `none` cannot have a LUT".to_string(),
            ));
        }
        self.default_intensity = tinta_core::lut::layout::clamp_unit(self.default_intensity);
        Ok(self)
    }

    /// Built-in presets with the configured LUT files bound over them.
    pub fn registry(&self) -> Result<LutRegistry, ConfigError> {
        let mut registry = LutRegistry::builtin();
        for (filter, path) in &self.luts {
            registry
                .bind(*filter, LutSource::File(path.clone()))
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(registry)
    }
}
