//! GPU-to-CPU framebuffer readback.

use std::sync::mpsc;

use image::RgbaImage;
use tinta_core::raster::flip_rows;

use crate::context::GpuContext;
use crate::error::GpuError;
use crate::textures::RenderTexture;

/// Row pitch for a `width`-pixel RGBA8 row, padded to the copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Strip row padding from a mapped staging buffer.
pub fn unpad_rows(mapped: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let unpadded = (width * 4) as usize;
    let padded = padded_row as usize;
    let mut out = vec![0_u8; unpadded * height as usize];
    for row in 0..height as usize {
        let src = row * padded;
        let dst = row * unpadded;
        out[dst..dst + unpadded].copy_from_slice(&mapped[src..src + unpadded]);
    }
    out
}

/// Copy the rendered framebuffer into a new image. Blocks until complete.
///
/// The quad maps texture origin to the bottom-left of the framebuffer, so the
/// rows are flipped to restore image-file orientation.
pub fn snapshot(
    ctx: &GpuContext,
    mut encoder: wgpu::CommandEncoder,
    target: &RenderTexture,
) -> Result<RgbaImage, GpuError> {
    let padded_row = padded_bytes_per_row(target.width);
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("tinta_snapshot_staging"),
        size: padded_row as u64 * target.height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        target.texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(target.height),
            },
        },
        wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.wait_idle()?;

    rx.recv()
        .map_err(|_| GpuError::Readback("map callback dropped".to_string()))?
        .map_err(|e| GpuError::Readback(e.to_string()))?;

    let pixels = {
        let mapped = slice.get_mapped_range();
        unpad_rows(&mapped, target.width, target.height, padded_row)
    };
    staging.unmap();

    let mut image = RgbaImage::from_raw(target.width, target.height, pixels)
        .ok_or_else(|| GpuError::Readback("framebuffer size mismatch".to_string()))?;
    flip_rows(&mut image);
    Ok(image)
}
