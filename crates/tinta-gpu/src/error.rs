use thiserror::Error;

/// Errors produced while setting up or running the LUT render pass.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("shader program failed to link: {0}")]
    ShaderLink(String),
    #[error("render target is empty ({width}x{height})")]
    EmptyTarget { width: u32, height: u32 },
    #[error("texture {width}x{height} exceeds device limit {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
    #[error("GPU validation failed: {0}")]
    Validation(String),
    #[error("framebuffer readback failed: {0}")]
    Readback(String),
    #[error("GPU device lost: {0}")]
    DeviceLost(String),
}
