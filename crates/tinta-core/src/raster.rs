//! Raster helpers shared by the CPU reference path and the GPU readback.
//!
//! Images move through the pipeline as 8-bit RGBA (`image::RgbaImage`),
//! the same format the source photo and the LUT textures are uploaded in.

use image::RgbaImage;

/// Convert an 8-bit channel to a unit float.
#[inline]
pub fn unorm8_to_f32(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Convert a unit float to an 8-bit channel, clamping and rounding.
#[inline]
pub fn f32_to_unorm8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// RGB part of an RGBA8 pixel as unit floats.
#[inline]
pub fn pixel_rgb(px: &image::Rgba<u8>) -> [f32; 3] {
    [
        unorm8_to_f32(px.0[0]),
        unorm8_to_f32(px.0[1]),
        unorm8_to_f32(px.0[2]),
    ]
}

/// Mean absolute per-channel RGB difference in 8-bit units.
///
/// Returns `None` when the dimensions differ.
pub fn mean_abs_diff(a: &RgbaImage, b: &RgbaImage) -> Option<f32> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    let count = (a.width() as u64 * a.height() as u64 * 3).max(1);
    let sum: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| {
            (0..3)
                .map(|c| pa.0[c].abs_diff(pb.0[c]) as u64)
                .sum::<u64>()
        })
        .sum();
    Some(sum as f32 / count as f32)
}

/// Flip rows in place. GPU framebuffers read back bottom-up relative to
/// image files.
pub fn flip_rows(image: &mut RgbaImage) {
    image::imageops::flip_vertical_in_place(image);
}
