//! Device, queue and window surface.
//!
//! [`GpuContext`] holds the wgpu surface, device, queue and surface configuration. It is
//! created once from the winit window and passed by reference to everything that creates
//! or submits GPU work.

use std::sync::Arc;

use thiserror::Error;
use winit::window::Window;

use crate::mesh::{GeometryId, TextureId};

/// Failures from the GPU backend. All of them are fatal at setup time.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to acquire frame: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("shader `{label}` failed to compile:\n{message}")]
    ShaderCompile { label: String, message: String },
    #[error("failed to create {label}: {message}")]
    Resource { label: String, message: String },
    #[error("cannot create {0} from empty contents")]
    EmptyBuffer(&'static str),
    #[error("unknown geometry {0:?}")]
    UnknownGeometry(GeometryId),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
}

/// The wgpu handles every renderer component shares. Fields are public for direct use.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Surface format and size. Kept in sync by [`GpuContext::resize`].
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Opens the default adapter for `window` and configures its surface, preferring an
    /// sRGB format, with vsync.
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        log::info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Vantage Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Zero sizes (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigures the surface at its current size, after it was lost or outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Runs `create` inside validation and out-of-memory error scopes, so a failed buffer
    /// or texture allocation comes back as [`RenderError::Resource`] instead of reaching
    /// the device's uncaptured-error handler.
    pub fn scoped<T>(&self, label: &str, create: impl FnOnce() -> T) -> Result<T, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        scope_result(label, value, validation.or(out_of_memory))
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

fn scope_result<T>(
    label: &str,
    value: T,
    error: Option<wgpu::Error>,
) -> Result<T, RenderError> {
    match error {
        Some(error) => {
            log::error!("creating {label} failed: {error}");
            Err(RenderError::Resource {
                label: label.to_string(),
                message: error.to_string(),
            })
        }
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_errors_become_resource_errors() {
        let error = wgpu::Error::OutOfMemory {
            source: Box::new(std::io::Error::other("heap exhausted")),
        };
        match scope_result("Cube Vertex Buffer", 7, Some(error)) {
            Err(RenderError::Resource { label, .. }) => assert_eq!(label, "Cube Vertex Buffer"),
            other => panic!("expected a resource error, got {other:?}"),
        }
    }

    #[test]
    fn clean_scopes_pass_the_value_through() {
        assert_eq!(scope_result("Depth Texture", 7, None).ok(), Some(7));
    }
}
