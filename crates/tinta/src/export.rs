//! Pre-upload step used by the export flow.

use serde::{Deserialize, Serialize};
use tinta_core::FilterId;

use crate::pipeline::LutPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// What the user picked in the editor for one piece of media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub source_uri: String,
    pub media: MediaKind,
    #[serde(default)]
    pub filter: FilterId,
    #[serde(default = "full_intensity")]
    pub intensity: f32,
}

fn full_intensity() -> f32 {
    1.0
}

impl ExportRequest {
    pub fn image(source_uri: impl Into<String>, filter: FilterId) -> Self {
        Self {
            source_uri: source_uri.into(),
            media: MediaKind::Image,
            filter,
            intensity: full_intensity(),
        }
    }

    pub fn video(source_uri: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            media: MediaKind::Video,
            filter: FilterId::None,
            intensity: full_intensity(),
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Whether the pipeline has anything to do for this request.
    pub fn needs_filter(&self) -> bool {
        self.media == MediaKind::Image && !self.filter.is_none() && self.intensity > 0.0
    }
}

/// URI to upload for `request`: the graded JPEG when a filter applies,
/// otherwise the original media.
pub async fn prepare_for_upload(pipeline: &LutPipeline, request: &ExportRequest) -> String {
    if !request.needs_filter() {
        return request.source_uri.clone();
    }
    pipeline
        .apply_lut(&request.source_uri, request.filter, request.intensity)
        .await
}
