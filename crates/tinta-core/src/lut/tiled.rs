//! A 3D LUT stored as a tiled RGBA8 texture.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::CoreError;
use crate::lut::layout::{CANONICAL_SIDE, LutLayout, clamp_unit};
use crate::raster::{f32_to_unorm8, unorm8_to_f32};

/// A 3D color transform packed into a square 2D texture.
///
/// The texture is what gets uploaded to texture unit 1 on the GPU; the
/// [`sample`](Self::sample) method is the CPU reference of the fragment
/// stage lookup and uses the same bilinear, clamp-to-edge filtering.
#[derive(Debug, Clone)]
pub struct TiledLut {
    image: RgbaImage,
    layout: LutLayout,
}

impl TiledLut {
    /// Wrap an already-decoded LUT image, validating its tiling.
    pub fn from_image(image: RgbaImage) -> Result<Self, CoreError> {
        let layout = LutLayout::CANONICAL;
        let (width, height) = image.dimensions();
        if width != height {
            return Err(CoreError::NotSquare { width, height });
        }
        let tile_px = width / layout.grid;
        if width == 0 || width % layout.grid != 0 || tile_px < 2 {
            return Err(CoreError::BadTiling {
                side: width,
                grid: layout.grid,
            });
        }
        Ok(Self { image, layout })
    }

    /// Decode a LUT from encoded image bytes (PNG, JPEG).
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_image(image)
    }

    /// Load a LUT image from disk.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let image = image::open(path)?.to_rgba8();
        tracing::debug!("loaded LUT image {} ({}px)", path.display(), image.width());
        Self::from_image(image)
    }

    /// Bake an arbitrary color transform into a canonical 512×512 LUT.
    pub fn from_fn(transform: impl Fn([f32; 3]) -> [f32; 3]) -> Self {
        let layout = LutLayout::CANONICAL;
        let side = CANONICAL_SIDE;
        let tile_px = side / layout.grid;
        let cell_max = (tile_px - 1) as f32;
        let slice_max = (layout.cube_size - 1) as f32;

        let image = RgbaImage::from_fn(side, side, |x, y| {
            let slice = (y / tile_px) * layout.grid + x / tile_px;
            let rgb = [
                (x % tile_px) as f32 / cell_max,
                (y % tile_px) as f32 / cell_max,
                slice as f32 / slice_max,
            ];
            let out = transform(rgb);
            Rgba([
                f32_to_unorm8(out[0]),
                f32_to_unorm8(out[1]),
                f32_to_unorm8(out[2]),
                255,
            ])
        });
        Self { image, layout }
    }

    /// The identity LUT: every cell encodes its own coordinate.
    pub fn identity() -> Self {
        Self::from_fn(|rgb| rgb)
    }

    pub fn layout(&self) -> LutLayout {
        self.layout
    }

    /// Texture side in pixels.
    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Look up `rgb` in the cube.
    ///
    /// Samples the two slices bracketing blue at the red/green coordinate and
    /// interpolates linearly on the fractional slice position.
    pub fn sample(&self, rgb: [f32; 3]) -> [f32; 3] {
        let slices = self.layout.slices(rgb[2]);
        let lo = self.sample_slice(slices.lo, rgb[0], rgb[1]);
        let hi = self.sample_slice(slices.hi, rgb[0], rgb[1]);
        let t = slices.frac;
        [
            lo[0] + (hi[0] - lo[0]) * t,
            lo[1] + (hi[1] - lo[1]) * t,
            lo[2] + (hi[2] - lo[2]) * t,
        ]
    }

    /// Whether every sampled cell maps within `tolerance` of itself.
    pub fn is_identity(&self, tolerance: f32) -> bool {
        const STEPS: u32 = 9;
        (0..STEPS).all(|ri| {
            (0..STEPS).all(|gi| {
                (0..STEPS).all(|bi| {
                    let rgb = [
                        ri as f32 / (STEPS - 1) as f32,
                        gi as f32 / (STEPS - 1) as f32,
                        bi as f32 / (STEPS - 1) as f32,
                    ];
                    let out = self.sample(rgb);
                    (0..3).all(|c| (out[c] - rgb[c]).abs() <= tolerance)
                })
            })
        })
    }

    fn sample_slice(&self, slice: u32, red: f32, green: f32) -> [f32; 3] {
        let [u, v] = self
            .layout
            .texel_center_coord(slice, clamp_unit(red), clamp_unit(green), self.side());
        self.bilinear(u, v)
    }

    /// Bilinear texel fetch with clamp-to-edge addressing, matching a
    /// linear-filtered GPU sampler.
    fn bilinear(&self, u: f32, v: f32) -> [f32; 3] {
        let side = self.side() as f32;
        let x = u * side - 0.5;
        let y = v * side - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let t00 = self.texel(x0 as i64, y0 as i64);
        let t10 = self.texel(x0 as i64 + 1, y0 as i64);
        let t01 = self.texel(x0 as i64, y0 as i64 + 1);
        let t11 = self.texel(x0 as i64 + 1, y0 as i64 + 1);

        let mut out = [0.0_f32; 3];
        for c in 0..3 {
            let top = t00[c] + (t10[c] - t00[c]) * fx;
            let bottom = t01[c] + (t11[c] - t01[c]) * fx;
            out[c] = top + (bottom - top) * fy;
        }
        out
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 3] {
        let max = self.side() as i64 - 1;
        let px = self
            .image
            .get_pixel(x.clamp(0, max) as u32, y.clamp(0, max) as u32);
        [
            unorm8_to_f32(px.0[0]),
            unorm8_to_f32(px.0[1]),
            unorm8_to_f32(px.0[2]),
        ]
    }
}
