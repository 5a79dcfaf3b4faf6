//! Phong mesh rendering on wgpu, with depth testing and texture support.
//!
//! Drawing happens in two steps. During traversal, scene code talks to a [`MeshFrame`], the
//! wgpu-side [`ShaderProgram`]: it tracks the current uniform state and snapshots it for
//! every draw. [`MeshPass`] then uploads all snapshots at once and encodes the draws into
//! a render pass.
//!
//! # Architecture
//!
//! The pass uses three bind groups:
//! - **Group 0**: Frame uniforms (camera matrices, eye position, lights), dynamic offset
//! - **Group 1**: Model uniforms (model matrix, normal matrix, texture flag), dynamic offset
//! - **Group 2**: Texture and sampler for the mesh surface
//!
//! Dynamic offsets give every draw its own uniform slot, so writes made between draws are
//! honoured even though all buffer writes land before the pass executes. A new frame slot is
//! only taken when a frame uniform changed since the previous draw.
//!
//! # Depth Buffer
//!
//! The pass owns a `Depth32Float` depth buffer. Call [`MeshPass::ensure_depth_size`] before
//! rendering if the window may have been resized.

use std::num::NonZeroU64;

use glam::{Mat3, Mat4, Vec3};

use crate::geometry::{GeometryData, VertexLayout};
use crate::geometry_buffer::GeometryBuffer;
use crate::gpu::{GpuContext, RenderError};
use crate::mesh::{GeometryId, TextureId};
use crate::shader::{ShaderProgram, uniforms};
use crate::texture::Texture;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Camera and light state, shared by every draw until changed.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub ambient_strength: f32,
    pub light_direction: [f32; 3],
    pub specular_strength: f32,
    pub light_color: [f32; 3],
    pub shininess: f32,
    pub point_light_pos: [f32; 3],
    pub point_light_constant: f32,
    pub point_light_color: [f32; 3],
    pub point_light_linear: f32,
    pub point_light_quadratic: f32,
    pub _pad: [f32; 3],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            point_light_constant: 1.0,
            ..bytemuck::Zeroable::zeroed()
        }
    }
}

/// Per-object state.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Columns padded to `vec4`, as WGSL lays out `mat3x3<f32>`.
    pub normal_matrix: [[f32; 4]; 3],
    pub use_texture: u32,
    pub _pad: [u32; 3],
}

impl Default for ModelUniforms {
    fn default() -> Self {
        let mut uniforms: Self = bytemuck::Zeroable::zeroed();
        uniforms.model = Mat4::IDENTITY.to_cols_array_2d();
        uniforms.normal_matrix = pad_mat3(&Mat3::IDENTITY);
        uniforms
    }
}

fn pad_mat3(m: &Mat3) -> [[f32; 4]; 3] {
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

/// Rounds `size` up to the next multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DrawCommand {
    geometry: GeometryId,
    texture: Option<TextureId>,
    frame_slot: u32,
    model_slot: u32,
}

/// Uniform state and draws recorded for one frame.
#[derive(Debug, Default)]
pub struct MeshFrame {
    frame: FrameUniforms,
    frame_dirty: bool,
    model: ModelUniforms,
    texture: Option<TextureId>,
    frame_slots: Vec<FrameUniforms>,
    model_slots: Vec<ModelUniforms>,
    draws: Vec<DrawCommand>,
}

impl MeshFrame {
    pub fn new() -> Self {
        Self {
            frame_dirty: true,
            ..Self::default()
        }
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    fn ignore(name: &str) {
        log::trace!("ignoring uniform `{name}`");
    }
}

impl ShaderProgram for MeshFrame {
    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        match name {
            uniforms::MODEL => self.model.model = value.to_cols_array_2d(),
            uniforms::VIEW => {
                self.frame.view = value.to_cols_array_2d();
                self.frame_dirty = true;
            }
            uniforms::PROJECTION => {
                self.frame.projection = value.to_cols_array_2d();
                self.frame_dirty = true;
            }
            _ => Self::ignore(name),
        }
    }

    fn set_mat3(&mut self, name: &str, value: &Mat3) {
        match name {
            uniforms::NORMAL_MATRIX => self.model.normal_matrix = pad_mat3(value),
            _ => Self::ignore(name),
        }
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        let slot = match name {
            uniforms::VIEW_POS => &mut self.frame.view_pos,
            uniforms::LIGHT_DIRECTION => &mut self.frame.light_direction,
            uniforms::LIGHT_COLOR => &mut self.frame.light_color,
            uniforms::POINT_LIGHT_POS => &mut self.frame.point_light_pos,
            uniforms::POINT_LIGHT_COLOR => &mut self.frame.point_light_color,
            _ => return Self::ignore(name),
        };
        *slot = value.to_array();
        self.frame_dirty = true;
    }

    fn set_float(&mut self, name: &str, value: f32) {
        let slot = match name {
            uniforms::AMBIENT_STRENGTH => &mut self.frame.ambient_strength,
            uniforms::SPECULAR_STRENGTH => &mut self.frame.specular_strength,
            uniforms::SHININESS => &mut self.frame.shininess,
            uniforms::POINT_LIGHT_CONSTANT => &mut self.frame.point_light_constant,
            uniforms::POINT_LIGHT_LINEAR => &mut self.frame.point_light_linear,
            uniforms::POINT_LIGHT_QUADRATIC => &mut self.frame.point_light_quadratic,
            _ => return Self::ignore(name),
        };
        *slot = value;
        self.frame_dirty = true;
    }

    fn set_int(&mut self, name: &str, value: i32) {
        match name {
            uniforms::USE_TEXTURE => self.model.use_texture = u32::from(value != 0),
            // the program has a single sampler, always on unit 0
            uniforms::TEXTURE => {
                if value != 0 {
                    log::warn!("only texture unit 0 is supported, got {value}");
                }
            }
            _ => Self::ignore(name),
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if unit == 0 {
            self.texture = Some(texture);
        } else {
            log::warn!("only texture unit 0 is supported, got {unit}");
        }
    }

    fn draw(&mut self, geometry: GeometryId) {
        if self.frame_dirty || self.frame_slots.is_empty() {
            self.frame_slots.push(self.frame);
            self.frame_dirty = false;
        }
        self.model_slots.push(self.model);
        self.draws.push(DrawCommand {
            geometry,
            texture: self.texture,
            frame_slot: (self.frame_slots.len() - 1) as u32,
            model_slot: (self.model_slots.len() - 1) as u32,
        });
    }
}

/// A uniform buffer split into equally sized, dynamically offset slots.
struct SlotBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u32,
    stride: u64,
    label: &'static str,
}

impl SlotBuffer {
    fn new(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        element_size: u64,
        capacity: u32,
    ) -> Self {
        let alignment = gpu.device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(element_size, alignment);
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(element_size),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            capacity,
            stride,
            label,
        }
    }

    /// Writes `items` into consecutive slots, growing the buffer when needed.
    fn write<T: bytemuck::Pod>(
        &mut self,
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        items: &[T],
    ) {
        if items.is_empty() {
            return;
        }
        let count = items.len() as u32;
        if count > self.capacity {
            let capacity = count.next_power_of_two();
            log::debug!("growing {} to {capacity} slots", self.label);
            *self = Self::new(
                gpu,
                layout,
                self.label,
                std::mem::size_of::<T>() as u64,
                capacity,
            );
        }

        let mut bytes = vec![0u8; self.stride as usize * items.len()];
        for (i, item) in items.iter().enumerate() {
            let start = i * self.stride as usize;
            let item = bytemuck::bytes_of(item);
            bytes[start..start + item.len()].copy_from_slice(item);
        }
        gpu.queue.write_buffer(&self.buffer, 0, &bytes);
    }

    fn offset(&self, slot: u32) -> u32 {
        (slot as u64 * self.stride) as u32
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str, size: u64) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(size),
            },
            count: None,
        }],
    })
}

struct TextureSlot {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Owns the Phong pipelines and every uploaded geometry and texture.
pub struct MeshPass {
    pipeline_uv: wgpu::RenderPipeline,
    pipeline_no_uv: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    frame_slots: SlotBuffer,
    model_slots: SlotBuffer,
    default_texture: TextureSlot,
    geometries: Vec<Option<GeometryBuffer>>,
    textures: Vec<Option<TextureSlot>>,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl MeshPass {
    /// Compiles the Phong program and creates its pipelines.
    ///
    /// Shader and pipeline creation run inside a validation error scope, so a compile
    /// failure comes back as [`RenderError::ShaderCompile`] with the diagnostic text.
    pub fn new(gpu: &GpuContext) -> Result<Self, RenderError> {
        let device = &gpu.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Phong Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/phong.wgsl").into()),
        });

        let frame_size = std::mem::size_of::<FrameUniforms>() as u64;
        let model_size = std::mem::size_of::<ModelUniforms>() as u64;
        let frame_layout = uniform_layout(device, "Frame Bind Group Layout", frame_size);
        let model_layout = uniform_layout(device, "Model Bind Group Layout", model_size);

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Phong Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &model_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline_uv = Self::create_pipeline(
            gpu,
            &pipeline_layout,
            &shader,
            VertexLayout::PositionColorNormalUv,
        );
        let pipeline_no_uv = Self::create_pipeline(
            gpu,
            &pipeline_layout,
            &shader,
            VertexLayout::PositionColorNormal,
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                label: "Phong Shader".to_string(),
                message: error.to_string(),
            });
        }

        let frame_slots = SlotBuffer::new(gpu, &frame_layout, "Frame Uniforms", frame_size, 4);
        let model_slots = SlotBuffer::new(gpu, &model_layout, "Model Uniforms", model_size, 64);

        let white = Texture::solid_color(gpu, [255, 255, 255, 255], "Default White Texture")?;
        let default_texture = Self::texture_slot(gpu, &texture_layout, white);

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu);

        log::debug!("mesh pass ready");

        Ok(Self {
            pipeline_uv,
            pipeline_no_uv,
            frame_layout,
            model_layout,
            texture_layout,
            frame_slots,
            model_slots,
            default_texture,
            geometries: Vec::new(),
            textures: Vec::new(),
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        })
    }

    fn create_pipeline(
        gpu: &GpuContext,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        vertex_layout: VertexLayout,
    ) -> wgpu::RenderPipeline {
        let (label, entry_point) = if vertex_layout.has_uv() {
            ("Phong Pipeline", "vs_main")
        } else {
            ("Phong Pipeline (no uv)", "vs_no_uv")
        };

        gpu.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(entry_point),
                    buffers: &[vertex_layout.buffer_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn texture_slot(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        texture: Texture,
    ) -> TextureSlot {
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        TextureSlot {
            texture,
            bind_group,
        }
    }

    fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu);
            self.depth_texture.destroy();
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn upload_geometry(
        &mut self,
        gpu: &GpuContext,
        geometry: &GeometryData,
        label: &str,
    ) -> Result<GeometryId, RenderError> {
        let buffer = GeometryBuffer::new(gpu, geometry, label)?;
        self.geometries.push(Some(buffer));
        Ok(GeometryId(self.geometries.len() - 1))
    }

    /// Destroys the buffers behind `id`. Meshes still referring to it fail to render.
    pub fn remove_geometry(&mut self, id: GeometryId) -> Result<(), RenderError> {
        let buffer = self
            .geometries
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(RenderError::UnknownGeometry(id))?;
        buffer.destroy();
        Ok(())
    }

    pub fn add_texture(&mut self, gpu: &GpuContext, texture: Texture) -> TextureId {
        let slot = Self::texture_slot(gpu, &self.texture_layout, texture);
        self.textures.push(Some(slot));
        TextureId(self.textures.len() - 1)
    }

    pub fn remove_texture(&mut self, id: TextureId) -> Result<(), RenderError> {
        let slot = self
            .textures
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(RenderError::UnknownTexture(id))?;
        slot.texture.destroy();
        Ok(())
    }

    fn geometry(&self, id: GeometryId) -> Result<&GeometryBuffer, RenderError> {
        self.geometries
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(RenderError::UnknownGeometry(id))
    }

    fn texture_bind_group(&self, id: Option<TextureId>) -> Result<&wgpu::BindGroup, RenderError> {
        match id {
            None => Ok(&self.default_texture.bind_group),
            Some(id) => self
                .textures
                .get(id.0)
                .and_then(Option::as_ref)
                .map(|slot| &slot.bind_group)
                .ok_or(RenderError::UnknownTexture(id)),
        }
    }

    /// Uploads the frame's uniform slots. Must run before the render pass is begun.
    pub fn prepare(&mut self, gpu: &GpuContext, frame: &MeshFrame) -> Result<(), RenderError> {
        for draw in &frame.draws {
            self.geometry(draw.geometry)?;
            self.texture_bind_group(draw.texture)?;
        }
        self.frame_slots
            .write(gpu, &self.frame_layout, &frame.frame_slots);
        self.model_slots
            .write(gpu, &self.model_layout, &frame.model_slots);
        Ok(())
    }

    /// Encodes every recorded draw. `prepare` must have been called with the same frame.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass,
        frame: &MeshFrame,
    ) -> Result<(), RenderError> {
        let mut current_layout = None;
        for draw in &frame.draws {
            let geometry = self.geometry(draw.geometry)?;

            if current_layout != Some(geometry.layout()) {
                let pipeline = if geometry.layout().has_uv() {
                    &self.pipeline_uv
                } else {
                    &self.pipeline_no_uv
                };
                render_pass.set_pipeline(pipeline);
                current_layout = Some(geometry.layout());
            }

            render_pass.set_bind_group(
                0,
                &self.frame_slots.bind_group,
                &[self.frame_slots.offset(draw.frame_slot)],
            );
            render_pass.set_bind_group(
                1,
                &self.model_slots.bind_group,
                &[self.model_slots.offset(draw.model_slot)],
            );
            render_pass.set_bind_group(2, self.texture_bind_group(draw.texture)?, &[]);
            geometry.draw(render_pass);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::light::Lighting;
    use crate::scene::Scene;
    use crate::transform::Transform;

    #[test]
    fn uniform_structs_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 224);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 128);
    }

    #[test]
    fn strides_respect_alignment() {
        assert_eq!(aligned_stride(224, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(128, 0), 128);
    }

    #[test]
    fn each_draw_gets_its_own_model_slot() {
        let mut frame = MeshFrame::new();
        frame.set_mat4(uniforms::VIEW, &Mat4::IDENTITY);
        frame.set_mat4(uniforms::MODEL, &Mat4::from_translation(Vec3::X));
        frame.draw(GeometryId(0));
        frame.set_mat4(uniforms::MODEL, &Mat4::from_translation(Vec3::Y));
        frame.draw(GeometryId(1));

        assert_eq!(frame.draw_count(), 2);
        assert_eq!(frame.frame_slots.len(), 1);
        assert_eq!(frame.model_slots.len(), 2);
        assert_eq!(frame.model_slots[1].model[3], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(frame.draws[1].frame_slot, 0);
        assert_eq!(frame.draws[1].model_slot, 1);
    }

    #[test]
    fn frame_changes_between_draws_take_a_new_slot() {
        let mut frame = MeshFrame::new();
        frame.draw(GeometryId(0));
        frame.set_float(uniforms::SHININESS, 8.0);
        frame.draw(GeometryId(0));
        frame.draw(GeometryId(0));

        assert_eq!(frame.frame_slots.len(), 2);
        assert_eq!(frame.frame_slots[1].shininess, 8.0);
        assert_eq!(frame.draws[2].frame_slot, 1);
    }

    #[test]
    fn texture_state_follows_binds() {
        let mut frame = MeshFrame::new();
        frame.set_int(uniforms::USE_TEXTURE, 1);
        frame.bind_texture(0, TextureId(3));
        frame.draw(GeometryId(0));
        frame.set_int(uniforms::USE_TEXTURE, 0);
        frame.draw(GeometryId(1));

        assert_eq!(frame.model_slots[0].use_texture, 1);
        assert_eq!(frame.model_slots[1].use_texture, 0);
        assert_eq!(frame.draws[0].texture, Some(TextureId(3)));
    }

    #[test]
    fn normal_matrix_columns_are_padded() {
        let mut frame = MeshFrame::new();
        let m = Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::Z * 3.0);
        frame.set_mat3(uniforms::NORMAL_MATRIX, &m);
        frame.draw(GeometryId(0));
        assert_eq!(
            frame.model_slots[0].normal_matrix,
            [[1.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0], [0.0, 0.0, 3.0, 0.0]]
        );
    }

    #[test]
    fn scene_traversal_fills_frame_uniforms() {
        let mut scene = Scene::new();
        scene
            .spawn("a", GeometryId(0), Transform::from_position(Vec3::X))
            .unwrap();
        scene.spawn("b", GeometryId(0), Transform::new()).unwrap();
        let camera = Camera::new();
        let lighting = Lighting::default();

        let mut frame = MeshFrame::new();
        scene.render(&mut frame, &camera, &lighting).unwrap();

        assert_eq!(frame.draw_count(), 2);
        assert_eq!(frame.frame_slots.len(), 1);
        let uniforms = frame.frame_slots[0];
        assert_eq!(uniforms.view, camera.view_matrix().to_cols_array_2d());
        assert_eq!(uniforms.view_pos, camera.position().to_array());
        assert_eq!(uniforms.shininess, lighting.shininess);
        assert_eq!(uniforms.point_light_linear, 0.09);
    }
}
