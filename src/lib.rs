//! # Vantage
//!
//! **A small real-time 3D scene engine on wgpu.**
//!
//! Named mesh objects hang off a transform hierarchy and are drawn with Blinn-Phong
//! lighting (one directional light, one point light) through a camera that can be driven
//! by first-person or orbit controls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vantage::*;
//!
//! fn main() -> Result<(), AppError> {
//!     run_with_config(AppConfig::new().title("Shapes"), |ctx| {
//!         let sphere = ctx.state.library().get(GeometryKind::Sphere)?;
//!         ctx.state
//!             .scene_mut()
//!             .spawn("ball", sphere, Transform::from_position(Vec3::new(3.0, 0.0, 0.0)))?;
//!
//!         Ok(move |_frame: &mut Frame| {})
//!     })
//! }
//! ```
//!
//! ## Layers
//!
//! - **Scene data**: [`TransformTree`], [`GeometryData`] and its generators, [`Mesh`],
//!   [`Scene`], [`Camera`], [`Lighting`]. None of these touch the GPU and all of them
//!   are testable headless.
//! - **Shading boundary**: [`ShaderProgram`] receives uniforms by name. [`MeshFrame`] is
//!   the wgpu implementation, [`MeshPass`] turns it into draw calls.
//! - **Interaction**: [`InputRouter`] fans out [`InputEvent`]s to the
//!   [`FirstPersonController`] or [`OrbitController`].
//! - **Application**: [`AppState`] owns the scene and reacts to [`Command`]s, the
//!   windowed runtime in [`run_with_config`] drives it.

mod app;
mod assets;
mod camera;
mod config;
mod first_person;
mod geometry;
mod geometry_buffer;
mod gpu;
mod input;
mod light;
mod logging;
mod mesh;
mod mesh_pass;
pub mod obj;
mod orbit;
pub mod primitives;
mod renderer;
mod scene;
pub mod shader;
mod state;
mod texture;
mod transform;

pub use app::{AppConfig, AppError, Frame, SetupContext, run, run_with_config};
pub use assets::{AssetData, AssetError, AssetLoader, LoadedAsset};
pub use camera::{Camera, CameraError, ProjectionMode};
pub use config::{
    AnimationConfig, CameraConfig, CameraMode, ControlsConfig, LightingConfig, ObjectConfig,
    PointLightConfig, SceneConfig,
};
pub use first_person::FirstPersonController;
pub use geometry::{GeometryData, GeometryError, MAX_VERTICES, Vertex, VertexLayout};
pub use geometry_buffer::GeometryBuffer;
pub use gpu::{GpuContext, RenderError};
pub use input::{
    InputChannel, InputEvent, InputListener, InputRouter, InputTranslator, ListenerId,
};
pub use light::{DirectionalLight, LightError, Lighting, PointLight};
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{GeometryId, Mesh, TextureId};
pub use mesh_pass::{FrameUniforms, MeshFrame, MeshPass, ModelUniforms};
pub use obj::ObjError;
pub use orbit::OrbitController;
pub use primitives::GeometryKind;
pub use renderer::{PixelRect, Renderer};
pub use scene::{Scene, SceneError, SceneObject};
pub use shader::ShaderProgram;
pub use state::{AppState, Clock, Command, GeometryLibrary, PRIMARY_OBJECT, StateError};
pub use texture::{Texture, TextureError, TextureOptions};
pub use transform::{HierarchyError, Transform, TransformId, TransformTree};

// Re-export math types
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
