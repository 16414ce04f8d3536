//! GPU device acquisition.

use crate::error::GpuError;

/// A wgpu device and queue scoped to one render job (or one preview surface).
///
/// Dropping the context releases the device once every resource created
/// from it has been dropped too.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Request an adapter and device, blocking the current thread.
    pub fn create_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::create())
    }

    /// Request an adapter and a device with default features.
    pub async fn create() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await?;

        let info = adapter.get_info();
        tracing::debug!(
            "GPU adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tinta_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await?;

        Ok(Self { device, queue })
    }

    /// Wrap a device owned by the host application (interactive preview).
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Route device-lost notifications to `callback`.
    pub fn on_device_lost(&self, callback: impl Fn(String) + Send + 'static) {
        self.device
            .set_device_lost_callback(move |reason, message| {
                callback(format!("{reason:?}: {message}"));
            });
    }

    /// Largest 2D texture side the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Block until all submitted work and pending map callbacks complete.
    pub fn wait_idle(&self) -> Result<(), GpuError> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| GpuError::Readback(e.to_string()))
    }
}
