//! Source image and LUT loading.
//!
//! Loads are keyed by source identity and idempotent: concurrent requests
//! for the same key share one decode, and later requests get the cached
//! result. Failed loads are not cached and leave no entry behind.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;
use tinta_core::{FilterId, LutSource, TiledLut, presets};
use tokio::sync::OnceCell;

use crate::error::AssetError;
use crate::uri;

/// Identity of a loadable asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Path(PathBuf),
    Encoded(EncodedKey),
    Preset(FilterId),
}

impl AssetKey {
    pub fn for_source(source: &LutSource) -> Self {
        match source {
            LutSource::File(path) => Self::Path(path.clone()),
            LutSource::Encoded(bytes) => Self::Encoded(EncodedKey(Arc::clone(bytes))),
            LutSource::Preset(filter) => Self::Preset(*filter),
        }
    }
}

/// In-memory buffer compared by allocation. The key holds its own reference,
/// so the address cannot be reused by another buffer while cached.
#[derive(Clone)]
pub struct EncodedKey(Arc<[u8]>);

impl PartialEq for EncodedKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EncodedKey {}

impl Hash for EncodedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state);
        self.0.len().hash(state);
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedKey({:p}, {} bytes)", self.0.as_ptr(), self.0.len())
    }
}

/// Shared view of an asset that may still be loading.
pub struct AssetHandle<T> {
    cell: Arc<OnceCell<Arc<T>>>,
}

impl<T> AssetHandle<T> {
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    /// The loaded asset, if ready.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

impl<T> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

type Slot<T> = Arc<OnceCell<Arc<T>>>;
type Slots<T> = Mutex<HashMap<AssetKey, Slot<T>>>;

#[derive(Default)]
pub struct AssetLoader {
    images: Slots<RgbaImage>,
    luts: Slots<TiledLut>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and decode the image at `uri` (plain path or `file://`).
    pub async fn load_image(&self, uri: &str) -> Result<Arc<RgbaImage>, AssetError> {
        let path = uri::to_path(uri)?;
        let key = AssetKey::Path(path.clone());
        load(&self.images, key, move || decode_image(&path)).await
    }

    /// Load, decode and validate a LUT.
    pub async fn load_lut(&self, source: &LutSource) -> Result<Arc<TiledLut>, AssetError> {
        let key = AssetKey::for_source(source);
        let source = source.clone();
        load(&self.luts, key, move || decode_lut(&source)).await
    }

    /// Handle for `uri`, shared with any load in flight or still to come.
    pub fn image_handle(&self, uri: &str) -> Result<AssetHandle<RgbaImage>, AssetError> {
        let path = uri::to_path(uri)?;
        Ok(AssetHandle {
            cell: slot(&self.images, AssetKey::Path(path)),
        })
    }

    pub fn lut_handle(&self, source: &LutSource) -> AssetHandle<TiledLut> {
        AssetHandle {
            cell: slot(&self.luts, AssetKey::for_source(source)),
        }
    }

    /// Number of source image entries, loaded or in flight.
    pub fn cached_images(&self) -> usize {
        self.images.lock().len()
    }

    /// Number of LUT entries, loaded or in flight.
    pub fn cached_luts(&self) -> usize {
        self.luts.lock().len()
    }

    /// Drop the cached source image for `uri`. In-flight holders keep theirs.
    pub fn evict_image(&self, uri: &str) {
        if let Ok(path) = uri::to_path(uri) {
            self.images.lock().remove(&AssetKey::Path(path));
        }
    }

    /// Drop a cached LUT so the next load reads the source again.
    pub fn evict_lut(&self, source: &LutSource) {
        self.luts.lock().remove(&AssetKey::for_source(source));
    }

    pub fn clear(&self) {
        self.images.lock().clear();
        self.luts.lock().clear();
    }
}

fn slot<T>(slots: &Slots<T>, key: AssetKey) -> Slot<T> {
    Arc::clone(slots.lock().entry(key).or_default())
}

async fn load<T, F>(slots: &Slots<T>, key: AssetKey, work: F) -> Result<Arc<T>, AssetError>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T, AssetError> + Send + 'static,
{
    let cell = slot(slots, key.clone());
    match cell.get_or_try_init(|| blocking(work)).await {
        Ok(value) => Ok(Arc::clone(value)),
        Err(e) => {
            forget_failed(slots, &key, &cell);
            Err(e)
        }
    }
}

/// Remove `cell` from `slots` unless it was replaced or has since been
/// filled by a concurrent load.
fn forget_failed<T>(slots: &Slots<T>, key: &AssetKey, cell: &Slot<T>) {
    let mut slots = slots.lock();
    let stale = slots
        .get(key)
        .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
    if stale {
        slots.remove(key);
    }
}

async fn blocking<T, F>(work: F) -> Result<Arc<T>, AssetError>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T, AssetError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AssetError::Worker(e.to_string()))?
        .map(Arc::new)
}

fn read(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_image(path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = read(path)?;
    let image = image::load_from_memory(&bytes)?.to_rgba8();
    tracing::debug!(
        "Loaded source {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

fn decode_lut(source: &LutSource) -> Result<TiledLut, AssetError> {
    let lut = match source {
        LutSource::File(path) => TiledLut::decode(&read(path)?)?,
        LutSource::Encoded(bytes) => TiledLut::decode(bytes)?,
        LutSource::Preset(filter) => {
            presets::bake_preset(*filter).ok_or(AssetError::NoPreset(*filter))?
        }
    };
    tracing::debug!("Loaded LUT {} (side {})", describe(source), lut.side());
    Ok(lut)
}

fn describe(source: &LutSource) -> String {
    match source {
        LutSource::File(path) => path.display().to_string(),
        LutSource::Encoded(bytes) => format!("<{} encoded bytes>", bytes.len()),
        LutSource::Preset(filter) => format!("preset:{filter}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_image_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", &RgbaImage::new(3, 2));
        let loader = AssetLoader::new();
        let uri = path.to_str().unwrap();

        let handle = loader.image_handle(uri).unwrap();
        assert!(!handle.is_ready());

        let first = loader.load_image(uri).await.unwrap();
        assert!(handle.is_ready());
        assert_eq!(first.dimensions(), (3, 2));

        // Served from cache even once the file is gone.
        std::fs::remove_file(&path).unwrap();
        let second = loader.load_image(&format!("file://{uri}")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        loader.evict_image(uri);
        assert!(loader.load_image(uri).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_reports_path_and_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.png");
        let loader = AssetLoader::new();
        let source = LutSource::File(path.clone());

        let err = loader.load_lut(&source).await.unwrap_err();
        assert!(matches!(err, AssetError::Io { path: p, .. } if p == path));

        TiledLut::identity().image().save(&path).unwrap();
        let lut = loader.load_lut(&source).await.unwrap();
        assert!(lut.is_identity(0.01));
    }

    #[tokio::test]
    async fn test_invalid_lut_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "bad.png", &RgbaImage::new(100, 50));
        let err = AssetLoader::new()
            .load_lut(&LutSource::File(path))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Lut(_)));
    }

    #[tokio::test]
    async fn test_preset_and_encoded_sources() {
        let loader = AssetLoader::new();
        let warm = loader
            .load_lut(&LutSource::Preset(FilterId::Warm))
            .await
            .unwrap();
        assert!(!warm.is_identity(0.01));

        let err = loader
            .load_lut(&LutSource::Preset(FilterId::None))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NoPreset(FilterId::None)));

        let mut png = Vec::new();
        TiledLut::identity()
            .image()
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let encoded = LutSource::Encoded(png.into());
        let lut = loader.load_lut(&encoded).await.unwrap();
        assert!(lut.is_identity(0.01));
        assert!(loader.lut_handle(&encoded).is_ready());
    }

    #[tokio::test]
    async fn test_remote_uri_is_unsupported() {
        let err = AssetLoader::new()
            .load_image("content://media/external/1")
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedScheme(_)));
    }

    fn identity_png() -> Vec<u8> {
        let mut png = Vec::new();
        TiledLut::identity()
            .image()
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    #[tokio::test]
    async fn test_failed_loads_leave_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new();

        let missing = dir.path().join("missing.png");
        assert!(loader.load_image(missing.to_str().unwrap()).await.is_err());
        assert_eq!(loader.cached_images(), 0);

        let bad = write_png(dir.path(), "bad.png", &RgbaImage::new(30, 20));
        assert!(loader.load_lut(&LutSource::File(bad)).await.is_err());
        assert_eq!(loader.cached_luts(), 0);
    }

    #[tokio::test]
    async fn test_evict_lut_rereads_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("look.png");
        TiledLut::identity().image().save(&path).unwrap();
        let source = LutSource::File(path.clone());
        let loader = AssetLoader::new();

        let first = loader.load_lut(&source).await.unwrap();
        assert_eq!(loader.cached_luts(), 1);

        std::fs::remove_file(&path).unwrap();
        let cached = loader.load_lut(&source).await.unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        loader.evict_lut(&source);
        assert_eq!(loader.cached_luts(), 0);
        assert!(matches!(
            loader.load_lut(&source).await,
            Err(AssetError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_encoded_key_tracks_the_buffer_not_its_address() {
        let loader = AssetLoader::new();
        let bytes: Arc<[u8]> = identity_png().into();
        let same_content: Arc<[u8]> = identity_png().into();

        let a = AssetKey::for_source(&LutSource::Encoded(Arc::clone(&bytes)));
        let b = AssetKey::for_source(&LutSource::Encoded(Arc::clone(&bytes)));
        let c = AssetKey::for_source(&LutSource::Encoded(same_content));
        assert_eq!(a, b);
        assert_ne!(a, c);

        loader
            .load_lut(&LutSource::Encoded(Arc::clone(&bytes)))
            .await
            .unwrap();
        // The cache entry keeps the buffer alive, so its address stays unique.
        assert!(Arc::strong_count(&bytes) >= 2);
        loader.clear();
        assert_eq!(Arc::strong_count(&bytes), 3);
    }
}
