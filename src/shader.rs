//! The boundary between scene traversal and the shading stage.
//!
//! Scene and light code never talk to the GPU directly. They push named uniforms and draw
//! requests into a [`ShaderProgram`], which the wgpu backend in [`crate::MeshPass`]
//! implements. The names below and the vertex attribute locations are a fixed contract
//! shared with the WGSL source in `shaders/phong.wgsl`.

use glam::{Mat3, Mat4, Vec3};

use crate::mesh::{GeometryId, TextureId};

/// Uniform names understood by the Phong program.
pub mod uniforms {
    pub const MODEL: &str = "u_model";
    pub const VIEW: &str = "u_view";
    pub const PROJECTION: &str = "u_projection";
    pub const NORMAL_MATRIX: &str = "u_normalMatrix";

    pub const LIGHT_DIRECTION: &str = "u_lightDirection";
    pub const LIGHT_COLOR: &str = "u_lightColor";
    pub const AMBIENT_STRENGTH: &str = "u_ambientStrength";
    pub const SPECULAR_STRENGTH: &str = "u_specularStrength";
    pub const SHININESS: &str = "u_shininess";
    pub const VIEW_POS: &str = "u_viewPos";

    pub const POINT_LIGHT_POS: &str = "u_pointLightPos";
    pub const POINT_LIGHT_COLOR: &str = "u_pointLightColor";
    pub const POINT_LIGHT_CONSTANT: &str = "u_pointLightConstant";
    pub const POINT_LIGHT_LINEAR: &str = "u_pointLightLinear";
    pub const POINT_LIGHT_QUADRATIC: &str = "u_pointLightQuadratic";

    pub const USE_TEXTURE: &str = "u_useTexture";
    pub const TEXTURE: &str = "u_texture";
}

/// Vertex attribute locations.
pub mod attributes {
    pub const POSITION: u32 = 0;
    pub const COLOR: u32 = 1;
    pub const NORMAL: u32 = 2;
    pub const UV: u32 = 3;
}

/// A compiled program that accepts named uniforms and indexed draws.
///
/// Uniform writes apply to every subsequent draw until overwritten. Names outside the
/// contract are ignored, the way an inactive uniform location is.
pub trait ShaderProgram {
    fn set_mat4(&mut self, name: &str, value: &Mat4);
    fn set_mat3(&mut self, name: &str, value: &Mat3);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_int(&mut self, name: &str, value: i32);
    /// Binds a texture to a sampler unit.
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    /// Draws the whole index range of a geometry with the current uniform state.
    fn draw(&mut self, geometry: GeometryId);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        Mat4(String, Mat4),
        Mat3(String, Mat3),
        Vec3(String, Vec3),
        Float(String, f32),
        Int(String, i32),
        BindTexture(u32, TextureId),
        Draw(GeometryId),
    }

    /// Test double that logs every call in order.
    #[derive(Default)]
    pub struct RecordingProgram {
        pub calls: Vec<Call>,
    }

    impl RecordingProgram {
        pub fn draws(&self) -> Vec<GeometryId> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Draw(g) => Some(*g),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, name: &str) -> usize {
            self.calls.iter().filter(|c| c.name() == Some(name)).count()
        }

        pub fn position_of(&self, call: &Call) -> Option<usize> {
            self.calls.iter().position(|c| c == call)
        }
    }

    impl Call {
        pub fn name(&self) -> Option<&str> {
            match self {
                Call::Mat4(n, _)
                | Call::Mat3(n, _)
                | Call::Vec3(n, _)
                | Call::Float(n, _)
                | Call::Int(n, _) => Some(n),
                Call::BindTexture(..) | Call::Draw(_) => None,
            }
        }
    }

    impl ShaderProgram for RecordingProgram {
        fn set_mat4(&mut self, name: &str, value: &Mat4) {
            self.calls.push(Call::Mat4(name.to_string(), *value));
        }

        fn set_mat3(&mut self, name: &str, value: &Mat3) {
            self.calls.push(Call::Mat3(name.to_string(), *value));
        }

        fn set_vec3(&mut self, name: &str, value: Vec3) {
            self.calls.push(Call::Vec3(name.to_string(), value));
        }

        fn set_float(&mut self, name: &str, value: f32) {
            self.calls.push(Call::Float(name.to_string(), value));
        }

        fn set_int(&mut self, name: &str, value: i32) {
            self.calls.push(Call::Int(name.to_string(), value));
        }

        fn bind_texture(&mut self, unit: u32, texture: TextureId) {
            self.calls.push(Call::BindTexture(unit, texture));
        }

        fn draw(&mut self, geometry: GeometryId) {
            self.calls.push(Call::Draw(geometry));
        }
    }
}
