//! CPU-side geometry: interleaved vertex data plus a 16-bit index list.
//!
//! Every generator and loader in the crate produces a [`GeometryData`]. The vertex buffer is a
//! flat `f32` array with one of two layouts, declared per instance through [`VertexLayout`]:
//!
//! | Attribute | Floats | Shader Location | Present in                 |
//! |-----------|--------|-----------------|----------------------------|
//! | position  | 3      | 0               | both layouts               |
//! | color     | 3      | 1               | both layouts               |
//! | normal    | 3      | 2               | both layouts               |
//! | uv        | 2      | 3               | `PositionColorNormalUv`    |
//!
//! Construction validates the buffer: the float count must divide evenly into vertices, every
//! index must address an existing vertex, and indices must form whole triangles. Triangles are
//! counter-clockwise when seen from outside the surface.

use glam::Vec3;
use thiserror::Error;

use crate::shader::attributes;

/// Largest vertex count addressable by `u16` indices.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("vertex data has {len} floats, not a multiple of the {stride}-float stride")]
    MisalignedVertices { len: usize, stride: usize },
    #[error("{0} vertices exceed the 16-bit index range")]
    TooManyVertices(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },
    #[error("index count {0} does not form whole triangles")]
    IncompleteTriangle(usize),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Interleaving of the vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    PositionColorNormal,
    PositionColorNormalUv,
}

const PCN_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: attributes::POSITION,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: attributes::COLOR,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 24,
        shader_location: attributes::NORMAL,
        format: wgpu::VertexFormat::Float32x3,
    },
];

const PCNU_ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
    PCN_ATTRIBUTES[0],
    PCN_ATTRIBUTES[1],
    PCN_ATTRIBUTES[2],
    wgpu::VertexAttribute {
        offset: 36,
        shader_location: attributes::UV,
        format: wgpu::VertexFormat::Float32x2,
    },
];

impl VertexLayout {
    pub const fn floats_per_vertex(self) -> usize {
        match self {
            VertexLayout::PositionColorNormal => 9,
            VertexLayout::PositionColorNormalUv => 11,
        }
    }

    pub const fn stride(self) -> u64 {
        (self.floats_per_vertex() * std::mem::size_of::<f32>()) as u64
    }

    pub const fn has_uv(self) -> bool {
        matches!(self, VertexLayout::PositionColorNormalUv)
    }

    /// The wgpu vertex buffer description for this layout.
    pub fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexLayout::PositionColorNormal => &PCN_ATTRIBUTES,
            VertexLayout::PositionColorNormalUv => &PCNU_ATTRIBUTES,
        };
        wgpu::VertexBufferLayout {
            array_stride: self.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// One fully specified vertex, used by generators before interleaving.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], color: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }
}

/// Validated, immutable vertex and index data.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryData {
    layout: VertexLayout,
    vertices: Vec<f32>,
    indices: Vec<u16>,
}

impl GeometryData {
    /// Wraps raw interleaved data after checking the buffer invariants.
    pub fn new(
        layout: VertexLayout,
        vertices: Vec<f32>,
        indices: Vec<u16>,
    ) -> Result<Self, GeometryError> {
        let stride = layout.floats_per_vertex();
        if vertices.len() % stride != 0 {
            return Err(GeometryError::MisalignedVertices {
                len: vertices.len(),
                stride,
            });
        }

        let vertex_count = vertices.len() / stride;
        if vertex_count > MAX_VERTICES {
            return Err(GeometryError::TooManyVertices(vertex_count));
        }
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IncompleteTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        Ok(Self {
            layout,
            vertices,
            indices,
        })
    }

    /// Interleaves full vertices, UVs included.
    pub fn from_vertices(vertices: &[Vertex], indices: Vec<u16>) -> Result<Self, GeometryError> {
        let floats: &[f32] = bytemuck::cast_slice(vertices);
        Self::new(VertexLayout::PositionColorNormalUv, floats.to_vec(), indices)
    }

    /// Interleaves vertices without their UVs.
    pub fn from_vertices_without_uv(
        vertices: &[Vertex],
        indices: Vec<u16>,
    ) -> Result<Self, GeometryError> {
        let floats = vertices
            .iter()
            .flat_map(|v| v.position.into_iter().chain(v.color).chain(v.normal))
            .collect();
        Self::new(VertexLayout::PositionColorNormal, floats, indices)
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.floats_per_vertex()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Reads one vertex back out of the interleaved buffer. UV is zero when absent.
    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        let stride = self.layout.floats_per_vertex();
        let f = self.vertices.get(index * stride..(index + 1) * stride)?;
        let uv = if self.layout.has_uv() {
            [f[9], f[10]]
        } else {
            [0.0, 0.0]
        };
        Some(Vertex::new(
            [f[0], f[1], f[2]],
            [f[3], f[4], f[5]],
            [f[6], f[7], f[8]],
            uv,
        ))
    }

    pub fn iter_vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        (0..self.vertex_count()).filter_map(|i| self.vertex(i))
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u16; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Axis-aligned bounds of all positions.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in self.iter_vertices() {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Replaces every normal with the area-weighted average of its adjacent face normals.
    pub fn with_smooth_normals(mut self) -> Self {
        let stride = self.layout.floats_per_vertex();
        let mut normals = vec![Vec3::ZERO; self.vertex_count()];
        let position = |v: &[f32], i: usize| Vec3::new(v[i * stride], v[i * stride + 1], v[i * stride + 2]);

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = position(&self.vertices, i0);
            let face = (position(&self.vertices, i1) - p0).cross(position(&self.vertices, i2) - p0);
            normals[i0] += face;
            normals[i1] += face;
            normals[i2] += face;
        }

        for (i, n) in normals.into_iter().enumerate() {
            let n = n.normalize_or_zero();
            self.vertices[i * stride + 6..i * stride + 9].copy_from_slice(&n.to_array());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ]
    }

    #[test]
    fn layouts_report_strides() {
        assert_eq!(VertexLayout::PositionColorNormal.stride(), 36);
        assert_eq!(VertexLayout::PositionColorNormalUv.stride(), 44);
        assert_eq!(VertexLayout::PositionColorNormalUv.buffer_layout().attributes.len(), 4);
        assert_eq!(
            VertexLayout::PositionColorNormal.buffer_layout().attributes[2].shader_location,
            2
        );
    }

    #[test]
    fn interleaves_with_and_without_uv() {
        let with_uv = GeometryData::from_vertices(&triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(with_uv.vertices().len(), 33);
        assert_eq!(with_uv.vertex(2).unwrap().uv, [0.0, 1.0]);

        let plain = GeometryData::from_vertices_without_uv(&triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(plain.vertices().len(), 27);
        assert_eq!(plain.vertex_count(), 3);
        assert_eq!(plain.vertex(1).unwrap().color, [0.0, 1.0, 0.0]);
        assert_eq!(plain.vertex(1).unwrap().uv, [0.0, 0.0]);
    }

    #[test]
    fn rejects_broken_buffers() {
        assert_eq!(
            GeometryData::new(VertexLayout::PositionColorNormal, vec![0.0; 10], vec![]),
            Err(GeometryError::MisalignedVertices { len: 10, stride: 9 })
        );
        assert_eq!(
            GeometryData::from_vertices(&triangle(), vec![0, 1, 3]),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
        assert_eq!(
            GeometryData::from_vertices(&triangle(), vec![0, 1]),
            Err(GeometryError::IncompleteTriangle(2))
        );
    }

    #[test]
    fn bounds_cover_all_positions() {
        let geometry = GeometryData::from_vertices(&triangle(), vec![0, 1, 2]).unwrap();
        let (min, max) = geometry.bounds();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn smooth_normals_follow_winding() {
        let mut vertices = triangle();
        for v in &mut vertices {
            v.normal = [0.0, 0.0, 0.0];
        }
        let geometry = GeometryData::from_vertices(&vertices, vec![0, 1, 2])
            .unwrap()
            .with_smooth_normals();

        for v in geometry.iter_vertices() {
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 0.001);
        }
    }
}
