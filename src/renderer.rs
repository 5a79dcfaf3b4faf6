//! Frame-level device state: clear colour, viewport and scissor.
//!
//! [`Renderer`] acquires the surface texture, clears colour and depth, applies the
//! viewport and scissor and hands the open render pass to the [`MeshPass`].

use crate::gpu::{GpuContext, RenderError};
use crate::mesh_pass::{MeshFrame, MeshPass};

/// A rectangle in surface pixels, origin at the top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersects the rectangle with a `width` x `height` target.
    ///
    /// Returns `None` when nothing of it lies inside the target.
    pub fn clamp_to(self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clamped = Self {
            x: self.x,
            y: self.y,
            width: self.width.min(width - self.x),
            height: self.height.min(height - self.y),
        };
        (clamped.width > 0 && clamped.height > 0).then_some(clamped)
    }
}

pub struct Renderer {
    clear_color: [f32; 4],
    viewport: Option<PixelRect>,
    scissor: Option<PixelRect>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            viewport: None,
            scissor: None,
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = [r, g, b, a];
    }

    /// Restricts drawing to `rect`. Defaults to the whole surface.
    pub fn set_viewport(&mut self, rect: PixelRect) {
        self.viewport = Some(rect);
    }

    pub fn clear_viewport(&mut self) {
        self.viewport = None;
    }

    pub fn viewport(&self) -> Option<PixelRect> {
        self.viewport
    }

    pub fn set_scissor(&mut self, rect: PixelRect) {
        self.scissor = Some(rect);
    }

    pub fn clear_scissor(&mut self) {
        self.scissor = None;
    }

    pub fn scissor(&self) -> Option<PixelRect> {
        self.scissor
    }

    /// Width over height of the active viewport, or of the whole surface without one.
    pub fn aspect_ratio(&self, gpu: &GpuContext) -> f32 {
        match self.viewport.and_then(|v| v.clamp_to(gpu.width(), gpu.height())) {
            Some(v) => v.width as f32 / v.height as f32,
            None => gpu.aspect(),
        }
    }

    /// Clears the surface and draws everything recorded in `frame`.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(
        &self,
        gpu: &GpuContext,
        mesh_pass: &mut MeshPass,
        frame: &MeshFrame,
    ) -> Result<(), RenderError> {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        mesh_pass.ensure_depth_size(gpu);
        mesh_pass.prepare(gpu, frame)?;

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let [r, g, b, a] = self.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: mesh_pass.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let (width, height) = (gpu.width(), gpu.height());
            if let Some(v) = self.viewport {
                match v.clamp_to(width, height) {
                    Some(v) => render_pass.set_viewport(
                        v.x as f32,
                        v.y as f32,
                        v.width as f32,
                        v.height as f32,
                        0.0,
                        1.0,
                    ),
                    None => log::trace!("viewport {v:?} lies outside the surface"),
                }
            }
            if let Some(s) = self.scissor {
                // an empty scissor draws nothing
                let s = s.clamp_to(width, height).unwrap_or(PixelRect::new(0, 0, 0, 0));
                render_pass.set_scissor_rect(s.x, s.y, s.width, s.height);
            }

            mesh_pass.render(&mut render_pass, frame)?;
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clear_colour_is_opaque_black() {
        let renderer = Renderer::new();
        assert_eq!(renderer.clear_color(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(renderer.viewport(), None);
        assert_eq!(renderer.scissor(), None);
    }

    #[test]
    fn rect_inside_target_is_unchanged() {
        let rect = PixelRect::new(10, 20, 100, 50);
        assert_eq!(rect.clamp_to(800, 600), Some(rect));
    }

    #[test]
    fn rect_overhanging_target_is_cut() {
        let rect = PixelRect::new(700, 500, 300, 300);
        assert_eq!(rect.clamp_to(800, 600), Some(PixelRect::new(700, 500, 100, 100)));
    }

    #[test]
    fn rect_outside_or_empty_is_dropped() {
        assert_eq!(PixelRect::new(800, 0, 10, 10).clamp_to(800, 600), None);
        assert_eq!(PixelRect::new(0, 0, 0, 10).clamp_to(800, 600), None);
    }

    #[test]
    fn viewport_and_scissor_reset() {
        let mut renderer = Renderer::new();
        renderer.set_clear_color(0.1, 0.1, 0.1, 1.0);
        renderer.set_viewport(PixelRect::new(0, 0, 10, 10));
        renderer.set_scissor(PixelRect::new(0, 0, 5, 5));
        renderer.clear_viewport();
        renderer.clear_scissor();
        assert_eq!(renderer.viewport(), None);
        assert_eq!(renderer.scissor(), None);
        assert_eq!(renderer.clear_color(), [0.1, 0.1, 0.1, 1.0]);
    }
}
