//! GPU context — wgpu device and queue.
//!
//! The sprite renderer never presents to a window itself; it draws into a
//! [`RenderTarget`](super::RenderTarget) owned by the caller. So the context
//! is just the device and queue, created without a surface.

use crate::error::{Result, SpriteError};

/// Wraps the wgpu device and queue.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// What the adapter supports below full WebGPU. GL adapters, for
    /// example, cannot copy depth textures into buffers.
    pub downlevel: wgpu::DownlevelFlags,
}

impl GpuContext {
    /// Wrap a device and queue the caller already owns (for example one
    /// shared with a windowed renderer).
    pub fn from_parts(adapter: &wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            downlevel: adapter.get_downlevel_capabilities().flags,
        }
    }

    /// Initialize wgpu without a surface: create instance, adapter, device
    /// and queue.
    pub fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| SpriteError::NoAdapter(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("Using GPU adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("sprig device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| SpriteError::Device(e.to_string()))?;

        Ok(Self::from_parts(&adapter, device, queue))
    }

    /// Whether depth attachments can be copied back to the host.
    pub fn can_read_depth(&self) -> bool {
        self.downlevel
            .contains(wgpu::DownlevelFlags::DEPTH_TEXTURE_AND_BUFFER_COPIES)
    }

    /// Run `build` inside a validation error scope and turn any captured
    /// error into [`SpriteError::Pipeline`].
    pub(crate) fn validated<T>(&self, build: impl FnOnce(&wgpu::Device) -> T) -> Result<T> {
        self.scoped(build, SpriteError::Pipeline)
    }

    /// Run `build` inside a validation error scope, mapping a captured
    /// error with `on_error`.
    pub(crate) fn scoped<T>(
        &self,
        build: impl FnOnce(&wgpu::Device) -> T,
        on_error: impl FnOnce(String) -> SpriteError,
    ) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = build(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(on_error(err.to_string())),
            None => Ok(value),
        }
    }
}

/// Headless context for GPU tests; `None` when the machine has no adapter.
#[cfg(test)]
pub(crate) fn test_gpu() -> Option<GpuContext> {
    test_gpu_with(wgpu::DownlevelFlags::empty())
}

/// Like [`test_gpu`], but also `None` when the adapter lacks `required`.
#[cfg(test)]
pub(crate) fn test_gpu_with(required: wgpu::DownlevelFlags) -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(gpu) if gpu.downlevel.contains(required) => Some(gpu),
        Ok(gpu) => {
            eprintln!(
                "skipping GPU test: adapter lacks {:?}",
                required.difference(gpu.downlevel)
            );
            None
        }
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

/// GPU for tests that read the depth attachment back.
#[cfg(test)]
pub(crate) fn depth_test_gpu() -> Option<GpuContext> {
    test_gpu_with(wgpu::DownlevelFlags::DEPTH_TEXTURE_AND_BUFFER_COPIES)
}
