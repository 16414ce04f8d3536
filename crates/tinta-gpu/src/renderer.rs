//! Single render routine shared by the interactive preview and the offscreen
//! export path.

use image::RgbaImage;
use tinta_core::{LutLayout, TiledLut};

use crate::context::GpuContext;
use crate::error::GpuError;
use crate::lut_applicator::LutApplicator;
use crate::readback;
use crate::textures::{GpuTexture, RenderTexture, TEXTURE_FORMAT};

/// Where a frame is drawn.
pub enum RenderTarget<'a> {
    /// A scoped texture sized to the source, read back into an image.
    Offscreen,
    /// A view owned by the caller (e.g. a swapchain frame for live preview).
    View(&'a wgpu::TextureView),
}

/// Result of one [`LutRenderer::render`] call.
#[derive(Debug)]
pub enum RenderOutput {
    /// Offscreen frame, in image-file orientation.
    Image(RgbaImage),
    /// Frame submitted to a caller-owned view.
    Presented,
}

/// Source and LUT uploaded once, drawn at any intensity into any target.
pub struct LutRenderer {
    applicator: LutApplicator,
    source: GpuTexture,
    lut: GpuTexture,
    layout: LutLayout,
    target_format: wgpu::TextureFormat,
}

impl LutRenderer {
    /// Renderer for offscreen export.
    pub fn offscreen(ctx: &GpuContext, source: &RgbaImage, lut: &TiledLut) -> Result<Self, GpuError> {
        Self::new(ctx, source, lut, TEXTURE_FORMAT)
    }

    /// Validate sizes, build the shader program for `target_format`, and
    /// upload the source (unit 0) and LUT (unit 1).
    pub fn new(
        ctx: &GpuContext,
        source: &RgbaImage,
        lut: &TiledLut,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, GpuError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(GpuError::EmptyTarget { width, height });
        }
        let limit = ctx.max_texture_dimension();
        if width > limit || height > limit || lut.side() > limit {
            return Err(GpuError::TooLarge {
                width,
                height,
                limit,
            });
        }

        let applicator = LutApplicator::new(&ctx.device, target_format)?;
        let source = GpuTexture::upload_rgba8(&ctx.device, &ctx.queue, source, "tinta_source");
        let lut_tex = GpuTexture::upload_rgba8(&ctx.device, &ctx.queue, lut.image(), "tinta_lut");

        Ok(Self {
            applicator,
            source,
            lut: lut_tex,
            layout: lut.layout(),
            target_format,
        })
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source.width, self.source.height)
    }

    /// Clear, draw the quad at `intensity`, and finish the frame on `target`.
    pub fn render(
        &self,
        ctx: &GpuContext,
        target: RenderTarget<'_>,
        intensity: f32,
    ) -> Result<RenderOutput, GpuError> {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tinta_lut_encoder"),
            });

        match target {
            RenderTarget::Offscreen => {
                if self.target_format != TEXTURE_FORMAT {
                    return Err(GpuError::Validation(format!(
                        "offscreen target needs {TEXTURE_FORMAT:?}, program built for {:?}",
                        self.target_format
                    )));
                }
                let (width, height) = self.source_size();
                let frame = RenderTexture::new(&ctx.device, width, height);
                tracing::debug!(
                    "Offscreen LUT frame {width}x{height} ({} bytes)",
                    frame.byte_size()
                );
                self.encode(ctx, &mut encoder, &frame.view, intensity);
                let image = readback::snapshot(ctx, encoder, &frame)?;
                Ok(RenderOutput::Image(image))
            }
            RenderTarget::View(view) => {
                self.encode(ctx, &mut encoder, view, intensity);
                ctx.queue.submit(std::iter::once(encoder.finish()));
                Ok(RenderOutput::Presented)
            }
        }
    }

    fn encode(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        intensity: f32,
    ) {
        self.applicator.draw(
            &ctx.device,
            encoder,
            &self.source,
            &self.lut,
            self.layout,
            intensity,
            view,
        );
    }
}

/// Render `source` through `lut` offscreen and read the frame back.
pub fn render_offscreen(
    ctx: &GpuContext,
    source: &RgbaImage,
    lut: &TiledLut,
    intensity: f32,
) -> Result<RgbaImage, GpuError> {
    let renderer = LutRenderer::offscreen(ctx, source, lut)?;
    match renderer.render(ctx, RenderTarget::Offscreen, intensity)? {
        RenderOutput::Image(image) => Ok(image),
        RenderOutput::Presented => Err(GpuError::Readback(
            "offscreen render produced no image".to_string(),
        )),
    }
}
