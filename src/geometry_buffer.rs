//! GPU-resident vertex and index buffers for one [`GeometryData`].

use wgpu::util::DeviceExt;

use crate::geometry::{GeometryData, VertexLayout};
use crate::gpu::{GpuContext, RenderError};

pub struct GeometryBuffer {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    layout: VertexLayout,
}

impl GeometryBuffer {
    /// Uploads `geometry`. Empty geometry has nothing to bind and is rejected.
    pub fn new(gpu: &GpuContext, geometry: &GeometryData, label: &str) -> Result<Self, RenderError> {
        if geometry.vertices().is_empty() {
            return Err(RenderError::EmptyBuffer("vertex buffer"));
        }
        if geometry.indices().is_empty() {
            return Err(RenderError::EmptyBuffer("index buffer"));
        }

        // wgpu requires buffer sizes to be a multiple of 4 bytes
        let mut indices = geometry.indices().to_vec();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }

        let (vertex_buffer, index_buffer) = gpu.scoped(&format!("geometry `{label}`"), || {
            let vertex_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} Vertex Buffer")),
                    contents: bytemuck::cast_slice(geometry.vertices()),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} Index Buffer")),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            (vertex_buffer, index_buffer)
        })?;

        log::debug!(
            "uploaded geometry `{label}`: {} vertices, {} indices",
            geometry.vertex_count(),
            geometry.index_count()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.index_count() as u32,
            layout: geometry.layout(),
        })
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Binds both buffers and draws every triangle.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Releases the GPU memory now rather than on drop.
    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}
