//! CPU reference of the render pass: LUT lookup plus intensity blend.

use image::{Rgba, RgbaImage};

use crate::lut::layout::clamp_unit;
use crate::lut::tiled::TiledLut;
use crate::raster::{f32_to_unorm8, pixel_rgb};

/// Blend the original color toward the LUT color by `intensity`.
///
/// ```text
/// out = src + (graded − src) × clamp(intensity, 0, 1)
/// ```
///
/// `intensity = 0` returns `src` bit-for-bit. NaN intensity is treated as 0.
pub fn blend(src: [f32; 3], graded: [f32; 3], intensity: f32) -> [f32; 3] {
    let t = clamp_unit(intensity);
    [
        src[0] + (graded[0] - src[0]) * t,
        src[1] + (graded[1] - src[1]) * t,
        src[2] + (graded[2] - src[2]) * t,
    ]
}

/// Render `source` through `lut` at `intensity` into a new image.
///
/// Alpha is carried through unchanged. The source is never modified.
pub fn apply_to_image(source: &RgbaImage, lut: &TiledLut, intensity: f32) -> RgbaImage {
    let (width, height) = source.dimensions();
    let mut out = RgbaImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(source.pixels()) {
        let rgb = pixel_rgb(src);
        let graded = lut.sample(rgb);
        let mixed = blend(rgb, graded, intensity);
        *dst = Rgba([
            f32_to_unorm8(mixed[0]),
            f32_to_unorm8(mixed[1]),
            f32_to_unorm8(mixed[2]),
            src.0[3],
        ]);
    }
    out
}
