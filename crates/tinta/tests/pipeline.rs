//! End-to-end pipeline tests on the CPU backend.
//!
//! Run with: `cargo test -p tinta`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use tinta::backend::RenderResult;
use tinta::completion::Completion;
use tinta::{
    ApplyError, BackendKind, CpuBackend, ExportRequest, FilterId, LutPipeline, LutRegistry,
    LutSource, PipelineConfig, RenderBackend, RenderError, RenderJob, prepare_for_upload,
};
use tinta_core::TiledLut;
use tinta_core::raster::mean_abs_diff;

/// Counts invocations and renders on the CPU.
#[derive(Default)]
struct CountingBackend {
    calls: AtomicUsize,
}

impl RenderBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn render(&self, job: RenderJob, done: Completion<RenderResult>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CpuBackend.render(job, done);
    }
}

struct FailingBackend;

impl RenderBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn render(&self, _job: RenderJob, done: Completion<RenderResult>) {
        done.settle(Err(RenderError::Backend("context creation failed".to_string())));
    }
}

/// Returns without settling.
struct SilentBackend;

impl RenderBackend for SilentBackend {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn render(&self, _job: RenderJob, _done: Completion<RenderResult>) {}
}

struct PanickingBackend;

impl RenderBackend for PanickingBackend {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn render(&self, _job: RenderJob, _done: Completion<RenderResult>) {
        panic!("driver crashed");
    }
}

struct Fixture {
    dir: TempDir,
    source: String,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        mid_tone_gradient(48, 32).save(&path).unwrap();
        let source = path.to_str().unwrap().to_string();
        Self { dir, source }
    }

    fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            backend: BackendKind::Cpu,
            output_dir: self.output_dir(),
            ..PipelineConfig::default()
        }
    }

    fn pipeline(&self) -> LutPipeline {
        LutPipeline::new(self.config()).unwrap()
    }

    fn source_image(&self) -> RgbaImage {
        image::open(&self.source).unwrap().to_rgba8()
    }

    fn outputs(&self) -> usize {
        std::fs::read_dir(self.output_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn mid_tone_gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (60 + x * 120 / width) as u8,
            (70 + y * 110 / height) as u8,
            110,
            255,
        ])
    })
}

fn open(uri: &str) -> RgbaImage {
    image::open(tinta::uri::to_path(uri).unwrap()).unwrap().to_rgba8()
}

fn mean_channel(image: &RgbaImage, c: usize) -> f32 {
    let sum: u64 = image.pixels().map(|p| p.0[c] as u64).sum();
    sum as f32 / (image.width() * image.height()) as f32
}

#[tokio::test]
async fn test_none_returns_source_without_rendering() {
    let fx = Fixture::new();
    let backend = Arc::new(CountingBackend::default());
    let pipeline = fx.pipeline().with_backend(backend.clone());

    for intensity in [0.0, 0.5, 1.0] {
        let out = pipeline.apply_lut(&fx.source, FilterId::None, intensity).await;
        assert_eq!(out, fx.source);
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.outputs(), 0);
}

#[tokio::test]
async fn test_zero_intensity_is_a_reencode() {
    let fx = Fixture::new();
    let out = fx.pipeline().apply_lut(&fx.source, FilterId::Night, 0.0).await;

    assert_ne!(out, fx.source);
    assert!(out.ends_with(".jpg"));
    let diff = mean_abs_diff(&fx.source_image(), &open(&out)).unwrap();
    assert!(diff < 4.0, "re-encode drifted by {diff}");
}

#[tokio::test]
async fn test_full_intensity_changes_colors() {
    let fx = Fixture::new();
    let out = fx.pipeline().apply_lut(&fx.source, FilterId::Warm, 1.0).await;

    assert_ne!(out, fx.source);
    let graded = open(&out);
    assert_eq!(graded.dimensions(), (48, 32));
    let diff = mean_abs_diff(&fx.source_image(), &graded).unwrap();
    assert!(diff > 5.0, "warm filter barely changed the image ({diff})");
}

#[tokio::test]
async fn test_zero_intensity_is_idempotent() {
    let fx = Fixture::new();
    let pipeline = fx.pipeline();

    let first = pipeline.apply_lut(&fx.source, FilterId::Cool, 0.0).await;
    let second = pipeline.apply_lut(&first, FilterId::Cool, 0.0).await;

    assert_ne!(first, second);
    let diff = mean_abs_diff(&open(&first), &open(&second)).unwrap();
    assert!(diff < 3.0, "second pass drifted by {diff}");
}

#[tokio::test]
async fn test_identity_lut_file_preserves_colors() {
    let fx = Fixture::new();
    let lut_path = fx.dir.path().join("identity.png");
    TiledLut::identity().image().save(&lut_path).unwrap();

    let registry = LutRegistry::builtin()
        .with(FilterId::Gold, LutSource::File(lut_path))
        .unwrap();
    let pipeline = fx.pipeline().with_registry(registry);

    let out = pipeline.apply_lut(&fx.source, FilterId::Gold, 1.0).await;
    assert_ne!(out, fx.source);
    let diff = mean_abs_diff(&fx.source_image(), &open(&out)).unwrap();
    assert!(diff < 4.0, "identity LUT drifted by {diff}");
}

#[tokio::test]
async fn test_file_uri_style_is_preserved() {
    let fx = Fixture::new();
    let pipeline = fx.pipeline();

    let uri = format!("file://{}", fx.source);
    let out = pipeline.apply_lut(&uri, FilterId::Pink, 1.0).await;
    assert!(out.starts_with("file://"), "{out}");
    assert_ne!(out, uri);

    let plain = pipeline.apply_lut(&fx.source, FilterId::Pink, 1.0).await;
    assert!(!plain.starts_with("file://"), "{plain}");
}

#[tokio::test]
async fn test_percent_encoded_file_uri_is_graded() {
    let fx = Fixture::new();
    let spaced = fx.dir.path().join("my photo é.png");
    mid_tone_gradient(16, 16).save(&spaced).unwrap();
    let uri = tinta::uri::from_path(&spaced, "file://");
    assert!(uri.contains("my%20photo%20%C3%A9.png"), "{uri}");

    let out = fx.pipeline().apply_lut(&uri, FilterId::Warm, 1.0).await;
    assert_ne!(out, uri, "filter was skipped");
    assert!(out.starts_with("file://"), "{out}");
    assert_eq!(open(&out).dimensions(), (16, 16));
}

#[tokio::test]
async fn test_output_dir_with_spaces_gives_valid_uri() {
    let fx = Fixture::new();
    let config = PipelineConfig {
        output_dir: fx.dir.path().join("graded photos"),
        ..fx.config()
    };
    let pipeline = LutPipeline::new(config).unwrap();

    let uri = format!("file://{}", fx.source);
    let out = pipeline.apply_lut(&uri, FilterId::Cool, 1.0).await;
    assert!(out.contains("/graded%20photos/"), "{out}");
    assert!(!out.contains(' '), "{out}");
    assert!(tinta::uri::to_path(&out).unwrap().exists());
}

#[tokio::test]
async fn test_source_image_not_cached_after_failed_lut() {
    let fx = Fixture::new();
    let lut_path = fx.dir.path().join("wide.png");
    RgbaImage::new(300, 200).save(&lut_path).unwrap();
    let registry = LutRegistry::builtin()
        .with(FilterId::Warm, LutSource::File(lut_path))
        .unwrap();
    let pipeline = fx.pipeline().with_registry(registry);

    assert_eq!(pipeline.apply_lut(&fx.source, FilterId::Warm, 1.0).await, fx.source);
    assert_eq!(pipeline.assets().cached_images(), 0);
    assert_eq!(pipeline.assets().cached_luts(), 0);
    assert!(!pipeline.assets().image_handle(&fx.source).unwrap().is_ready());
}

#[tokio::test]
async fn test_source_image_not_cached_after_success() {
    let fx = Fixture::new();
    let pipeline = fx.pipeline();

    let out = pipeline.apply_lut(&fx.source, FilterId::Gold, 1.0).await;
    assert_ne!(out, fx.source);
    assert_eq!(pipeline.assets().cached_images(), 0);
    assert_eq!(pipeline.assets().cached_luts(), 1);
}

#[tokio::test]
async fn test_missing_source_returns_source() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("gone.jpg");
    let missing = missing.to_str().unwrap();

    let out = fx.pipeline().apply_lut(missing, FilterId::Warm, 1.0).await;
    assert_eq!(out, missing);
    assert_eq!(fx.outputs(), 0);
}

#[tokio::test]
async fn test_unsupported_scheme_returns_source() {
    let fx = Fixture::new();
    let uri = "content://media/external/images/1";
    assert_eq!(fx.pipeline().apply_lut(uri, FilterId::Warm, 1.0).await, uri);
}

#[tokio::test]
async fn test_missing_lut_returns_source() {
    let fx = Fixture::new();
    let registry = LutRegistry::builtin()
        .with(FilterId::Warm, LutSource::File(fx.dir.path().join("nope.png")))
        .unwrap();
    let pipeline = fx.pipeline().with_registry(registry);

    assert_eq!(pipeline.apply_lut(&fx.source, FilterId::Warm, 1.0).await, fx.source);
    assert!(matches!(
        pipeline.try_apply(&fx.source, FilterId::Warm, 1.0).await,
        Err(ApplyError::Asset(_))
    ));
    assert_eq!(fx.outputs(), 0);
}

#[tokio::test]
async fn test_unbound_filter_returns_source() {
    let fx = Fixture::new();
    let backend = Arc::new(CountingBackend::default());
    let pipeline = fx
        .pipeline()
        .with_registry(LutRegistry::unbound())
        .with_backend(backend.clone());

    for filter in FilterId::all() {
        assert_eq!(pipeline.apply_lut(&fx.source, *filter, 1.0).await, fx.source);
    }
    assert!(matches!(
        pipeline.try_apply(&fx.source, FilterId::Night, 1.0).await,
        Err(ApplyError::Unbound(FilterId::Night))
    ));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_failures_return_source() {
    let fx = Fixture::new();
    let backends: [Arc<dyn RenderBackend>; 3] = [
        Arc::new(FailingBackend),
        Arc::new(SilentBackend),
        Arc::new(PanickingBackend),
    ];

    for backend in backends {
        let name = backend.name();
        let pipeline = fx.pipeline().with_backend(backend);
        let out = pipeline.apply_lut(&fx.source, FilterId::Cool, 1.0).await;
        assert_eq!(out, fx.source, "{name} backend");
    }
    assert_eq!(fx.outputs(), 0);

    let pipeline = fx.pipeline().with_backend(Arc::new(SilentBackend));
    assert!(matches!(
        pipeline.try_apply(&fx.source, FilterId::Cool, 1.0).await,
        Err(ApplyError::Render(RenderError::Abandoned))
    ));
}

#[tokio::test]
async fn test_unwritable_output_returns_source() {
    let fx = Fixture::new();
    let blocker = fx.dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = PipelineConfig {
        output_dir: blocker,
        ..fx.config()
    };
    let pipeline = LutPipeline::new(config).unwrap();
    assert_eq!(pipeline.apply_lut(&fx.source, FilterId::Gold, 1.0).await, fx.source);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_invocations_do_not_interfere() {
    let fx = Fixture::new();
    let pipeline = fx.pipeline();

    let (warm, cool) = tokio::join!(
        pipeline.apply_lut(&fx.source, FilterId::Warm, 1.0),
        pipeline.apply_lut(&fx.source, FilterId::Cool, 1.0),
    );

    assert_ne!(warm, fx.source);
    assert_ne!(cool, fx.source);
    assert_ne!(warm, cool);

    let warm = open(&warm);
    let cool = open(&cool);
    let warm_bias = mean_channel(&warm, 0) - mean_channel(&warm, 2);
    let cool_bias = mean_channel(&cool, 0) - mean_channel(&cool, 2);
    assert!(
        warm_bias > cool_bias + 10.0,
        "warm {warm_bias} vs cool {cool_bias}"
    );
    assert_eq!(fx.outputs(), 2);
}

#[tokio::test]
async fn test_default_intensity_from_config() {
    let fx = Fixture::new();
    let config = PipelineConfig {
        default_intensity: 0.0,
        ..fx.config()
    };
    let out = LutPipeline::new(config)
        .unwrap()
        .apply(&fx.source, FilterId::Night)
        .await;
    let diff = mean_abs_diff(&fx.source_image(), &open(&out)).unwrap();
    assert!(diff < 4.0, "default intensity 0 drifted by {diff}");
}

#[tokio::test]
async fn test_export_only_filters_images() {
    let fx = Fixture::new();
    let backend = Arc::new(CountingBackend::default());
    let pipeline = fx.pipeline().with_backend(backend.clone());

    let skipped = [
        ExportRequest::video(fx.source.clone()),
        ExportRequest::image(fx.source.clone(), FilterId::None),
        ExportRequest::image(fx.source.clone(), FilterId::Warm).with_intensity(0.0),
    ];
    for request in &skipped {
        assert_eq!(prepare_for_upload(&pipeline, request).await, fx.source);
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

    let request = ExportRequest::image(fx.source.clone(), FilterId::Warm);
    let out = prepare_for_upload(&pipeline, &request).await;
    assert_ne!(out, fx.source);
    assert!(Path::new(&out).exists());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}
