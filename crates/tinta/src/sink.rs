//! Filesystem sink for graded frames.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};

use crate::error::SinkError;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// `<temp>/tinta`
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("tinta")
}

/// Writes one uniquely named JPEG per call. Files appear atomically: they
/// are written under a `.part` name and renamed once complete.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    quality: u8,
    seq: Arc<AtomicU64>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            quality: quality.clamp(1, 100),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `image` as JPEG (alpha dropped) and return the final path.
    pub fn write_jpeg(&self, image: &RgbaImage) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(self.next_name());
        let part = path.with_extension("jpg.part");

        if let Err(e) = self.encode_to(&part, image) {
            let _ = fs::remove_file(&part);
            return Err(e);
        }
        if let Err(e) = fs::rename(&part, &path) {
            let _ = fs::remove_file(&part);
            return Err(e.into());
        }

        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Delete a file this sink produced. Missing files are not an error.
    pub fn remove(&self, path: &Path) -> Result<(), SinkError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn encode_to(&self, part: &Path, image: &RgbaImage) -> Result<(), SinkError> {
        let rgb = RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            Rgb([r, g, b])
        });

        let mut writer = BufWriter::new(File::create(part)?);
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, self.quality))?;
        writer.flush()?;
        Ok(())
    }

    fn next_name(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        format!("tinta-{}-{seq}-{nanos}.jpg", std::process::id())
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(default_output_dir(), DEFAULT_JPEG_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_jpeg_creates_unique_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("out"), 85);
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([10, 200, 30, 128]));

        let a = sink.write_jpeg(&image).unwrap();
        let b = sink.write_jpeg(&image).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "jpg");

        let decoded = image::open(&a).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
        let px = decoded.get_pixel(4, 4).0;
        assert!(px[1] > 150 && px[0] < 60, "{px:?}");

        let leftovers: Vec<_> = fs::read_dir(sink.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_unwritable_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let sink = FileSink::new(&blocker, 90);
        let err = sink.write_jpeg(&RgbaImage::new(2, 2)).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path(), 90);
        let path = sink.write_jpeg(&RgbaImage::new(2, 2)).unwrap();

        sink.remove(&path).unwrap();
        assert!(!path.exists());
        sink.remove(&path).unwrap();
    }
}
