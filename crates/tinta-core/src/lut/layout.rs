//! Geometry of a 3D LUT packed into a 2D texture.
//!
//! A cube of `CUBE_SIZE` blue slices is laid out as a `GRID`×`GRID` grid of
//! tiles. Within a tile, red runs along x and green along y. Blue selects the
//! tile; the two nearest slices are sampled and blended on the fractional
//! slice position.
//!
//! ```text
//! slice_lo = floor(b × (S − 1))
//! slice_hi = min(ceil(b × (S − 1)), S − 1)
//! frac     = b × (S − 1) − slice_lo
//! origin_i = (i mod G, floor(i / G)) / G
//! coord    = origin_i + (r, g) / G
//! ```
//!
//! The GPU shader (`lut_quad.wgsl`) mirrors this module exactly.

/// Tiles per texture axis.
pub const GRID: u32 = 8;

/// Blue slices in the cube (`GRID²`).
pub const CUBE_SIZE: u32 = GRID * GRID;

/// Canonical LUT texture side in pixels: one texel per red/green cell.
pub const CANONICAL_SIDE: u32 = GRID * CUBE_SIZE;

/// Tile grid and cube size of a packed LUT texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutLayout {
    /// Tiles per texture axis.
    pub grid: u32,
    /// Number of blue slices. Always `grid * grid`.
    pub cube_size: u32,
}

/// The two slices bracketing a blue value and the blend weight between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceLookup {
    pub lo: u32,
    pub hi: u32,
    pub frac: f32,
}

impl Default for LutLayout {
    fn default() -> Self {
        Self::CANONICAL
    }
}

impl LutLayout {
    pub const CANONICAL: Self = Self {
        grid: GRID,
        cube_size: CUBE_SIZE,
    };

    /// Slices bracketing `blue`. Out-of-range input is clamped to `[0, 1]`.
    pub fn slices(&self, blue: f32) -> SliceLookup {
        let max = (self.cube_size - 1) as f32;
        let pos = clamp_unit(blue) * max;
        let lo = pos.floor();
        let hi = pos.ceil().min(max);
        SliceLookup {
            lo: lo as u32,
            hi: hi as u32,
            frac: pos - lo,
        }
    }

    /// Normalized top-left corner of the tile holding `slice`.
    pub fn tile_origin(&self, slice: u32) -> [f32; 2] {
        let g = self.grid as f32;
        [
            (slice % self.grid) as f32 / g,
            (slice / self.grid) as f32 / g,
        ]
    }

    /// Normalized texture coordinate for `(red, green)` inside `slice`,
    /// spanning the whole tile (`origin + rg / grid`).
    ///
    /// Reference formula only. Rendering and the CPU lookup sample at
    /// [`texel_center_coord`](Self::texel_center_coord), which agrees with
    /// this at the tile centre and stays inside the tile at the edges.
    pub fn sample_coord(&self, slice: u32, red: f32, green: f32) -> [f32; 2] {
        let origin = self.tile_origin(slice);
        let tile = 1.0 / self.grid as f32;
        [
            origin[0] + clamp_unit(red) * tile,
            origin[1] + clamp_unit(green) * tile,
        ]
    }

    /// [`sample_coord`](Self::sample_coord) contracted by half a texel on each
    /// tile edge, so `0` and `1` land on the first and last texel centers of
    /// the tile and bilinear filtering never reads a neighbouring tile.
    pub fn texel_center_coord(&self, slice: u32, red: f32, green: f32, side: u32) -> [f32; 2] {
        let origin = self.tile_origin(slice);
        let tile = 1.0 / self.grid as f32;
        let half_texel = 0.5 / side as f32;
        let span = tile - 2.0 * half_texel;
        [
            origin[0] + half_texel + clamp_unit(red) * span,
            origin[1] + half_texel + clamp_unit(green) * span,
        ]
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
