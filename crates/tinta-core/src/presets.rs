//! Procedural looks for the built-in filters.
//!
//! Each preset is a plain per-pixel color transform. Baking it with
//! [`TiledLut::from_fn`] yields the texture the renderer samples, so the
//! filters work without shipping LUT image assets.

use crate::filter::FilterId;
use crate::lut::tiled::TiledLut;

/// Rec. 709 luminance weights.
const LUMA_REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Bake the LUT for `filter`. `None` has no look and yields `None`.
pub fn bake_preset(filter: FilterId) -> Option<TiledLut> {
    if filter.is_none() {
        return None;
    }
    Some(TiledLut::from_fn(|rgb| grade(filter, rgb)))
}

/// Apply the look for `filter` to one pixel. `FilterId::None` is identity.
pub fn grade(filter: FilterId, rgb: [f32; 3]) -> [f32; 3] {
    let out = match filter {
        FilterId::None => rgb,
        FilterId::Warm => {
            let out = gain_offset(rgb, [1.08, 1.02, 0.86], [0.03, 0.01, 0.0]);
            saturate(out, 1.05)
        }
        FilterId::Cool => {
            let out = gain_offset(rgb, [0.9, 1.0, 1.1], [0.0, 0.01, 0.04]);
            saturate(out, 0.95)
        }
        FilterId::Pink => {
            // Lift shadows toward a soft magenta.
            let lifted = lift(rgb, [0.08, 0.02, 0.06]);
            gain_offset(lifted, [1.04, 0.94, 1.02], [0.0; 3])
        }
        FilterId::Gold => {
            let out = saturate(rgb, 0.85);
            let l = luma(out);
            // Warm the highlights more than the shadows.
            let warm = l * l;
            [
                out[0] + 0.10 * warm,
                out[1] + 0.05 * warm,
                out[2] - 0.12 * warm,
            ]
        }
        FilterId::Night => {
            let dim = [rgb[0].powf(1.3), rgb[1].powf(1.25), rgb[2].powf(1.1)];
            let out = saturate(dim, 0.7);
            gain_offset(out, [0.8, 0.88, 1.05], [0.0, 0.01, 0.04])
        }
    };
    out.map(|c| c.clamp(0.0, 1.0))
}

fn luma(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_REC709[0] + rgb[1] * LUMA_REC709[1] + rgb[2] * LUMA_REC709[2]
}

/// Scale chroma around Rec. 709 luminance. `1.0` is identity.
fn saturate(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let l = luma(rgb);
    rgb.map(|c| l + (c - l) * amount)
}

fn gain_offset(rgb: [f32; 3], gain: [f32; 3], offset: [f32; 3]) -> [f32; 3] {
    [
        rgb[0] * gain[0] + offset[0],
        rgb[1] * gain[1] + offset[1],
        rgb[2] * gain[2] + offset[2],
    ]
}

/// Raise the black point per channel, leaving white fixed.
fn lift(rgb: [f32; 3], amount: [f32; 3]) -> [f32; 3] {
    [
        amount[0] + rgb[0] * (1.0 - amount[0]),
        amount[1] + rgb[1] * (1.0 - amount[1]),
        amount[2] + rgb[2] * (1.0 - amount[2]),
    ]
}
