//! Sampled 2D textures.
//!
//! Images are decoded with `image`, optionally given a full mip chain built on the CPU,
//! and uploaded in one call. Sampling state (wrap and filter modes) is fixed at creation
//! through [`TextureOptions`].

use std::path::Path;

use image::RgbaImage;
use image::imageops::FilterType;
use thiserror::Error;

use crate::gpu::{GpuContext, RenderError};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("texture size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    DataLength { expected: usize, actual: usize },
    #[error(transparent)]
    Gpu(#[from] RenderError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureOptions {
    pub wrap_u: wgpu::AddressMode,
    pub wrap_v: wgpu::AddressMode,
    pub min_filter: wgpu::FilterMode,
    pub mag_filter: wgpu::FilterMode,
    pub generate_mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            wrap_u: wgpu::AddressMode::Repeat,
            wrap_v: wgpu::AddressMode::Repeat,
            min_filter: wgpu::FilterMode::Linear,
            mag_filter: wgpu::FilterMode::Linear,
            generate_mipmaps: true,
        }
    }
}

impl TextureOptions {
    /// Clamp-to-edge, nearest filtering, no mipmaps.
    pub fn pixelated() -> Self {
        Self {
            wrap_u: wgpu::AddressMode::ClampToEdge,
            wrap_v: wgpu::AddressMode::ClampToEdge,
            min_filter: wgpu::FilterMode::Nearest,
            mag_filter: wgpu::FilterMode::Nearest,
            generate_mipmaps: false,
        }
    }

    pub fn wrap(mut self, mode: wgpu::AddressMode) -> Self {
        self.wrap_u = mode;
        self.wrap_v = mode;
        self
    }

    pub fn mipmaps(mut self, enabled: bool) -> Self {
        self.generate_mipmaps = enabled;
        self
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Concatenates every mip level of `image`, largest first, each level half the previous
/// (rounded down, never below 1).
fn mip_chain(image: &RgbaImage, levels: u32) -> Vec<u8> {
    let mut data = image.as_raw().clone();
    let mut level = image.clone();
    for _ in 1..levels {
        let width = (level.width() / 2).max(1);
        let height = (level.height() / 2).max(1);
        level = image::imageops::resize(&level, width, height, FilterType::Triangle);
        data.extend_from_slice(level.as_raw());
    }
    data
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
}

impl Texture {
    /// Create a texture from tightly packed RGBA8 data.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        let (data, mip_levels) = if options.generate_mipmaps && (width > 1 || height > 1) {
            let image = RgbaImage::from_raw(width, height, data.to_vec()).ok_or(
                TextureError::DataLength {
                    expected,
                    actual: data.len(),
                },
            )?;
            let levels = mip_level_count(width, height);
            (mip_chain(&image, levels), levels)
        } else {
            (data.to_vec(), 1)
        };

        Ok(Self::upload(gpu, &data, width, height, mip_levels, label, options)?)
    }

    fn upload(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        mip_levels: u32,
        label: &str,
        options: TextureOptions,
    ) -> Result<Self, RenderError> {
        use wgpu::util::DeviceExt;

        let mipmap_filter = if mip_levels > 1 {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        };

        let (texture, sampler) = gpu.scoped(&format!("texture `{label}`"), || {
            let texture = gpu.device.create_texture_with_data(
                &gpu.queue,
                &wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: mip_levels,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                data,
            );

            let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(&format!("{label} Sampler")),
                address_mode_u: options.wrap_u,
                address_mode_v: options.wrap_v,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: options.mag_filter,
                min_filter: options.min_filter,
                mipmap_filter,
                ..Default::default()
            });
            (texture, sampler)
        })?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("uploaded texture `{label}` {width}x{height}, {mip_levels} mip levels");

        Ok(Self {
            texture,
            view,
            sampler,
            width,
            height,
            mip_levels,
        })
    }

    /// Load a texture from an image file.
    pub fn from_file(
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(gpu, &img, width, height, &path.display().to_string(), options)
    }

    /// Load a texture from encoded image bytes (PNG, JPEG, ...).
    pub fn from_bytes(
        gpu: &GpuContext,
        bytes: &[u8],
        label: &str,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(gpu, &img, width, height, label, options)
    }

    /// A 1x1 texture of a single colour, used when nothing else is bound.
    pub fn solid_color(
        gpu: &GpuContext,
        rgba: [u8; 4],
        label: &str,
    ) -> Result<Self, RenderError> {
        Self::upload(gpu, &rgba, 1, 1, 1, label, TextureOptions::pixelated())
    }

    /// Releases the GPU memory now rather than on drop.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
