//! Scene-level mesh records and the typed handles they hold.

use glam::{Mat3, Mat4};

use crate::shader::ShaderProgram;
use crate::transform::{HierarchyError, TransformId, TransformTree};

/// Handle to uploaded geometry. Many meshes may share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub(crate) usize);

/// Handle to an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

impl GeometryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A drawable: shared geometry placed by its own transform, optionally textured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mesh {
    pub geometry: GeometryId,
    pub transform: TransformId,
    pub texture: Option<TextureId>,
}

impl Mesh {
    pub fn new(geometry: GeometryId, transform: TransformId) -> Self {
        Self {
            geometry,
            transform,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn set_texture(&mut self, texture: Option<TextureId>) {
        self.texture = texture;
    }

    /// World matrix of the mesh's transform. Equals the local matrix for roots.
    pub fn model_matrix(&self, transforms: &TransformTree) -> Result<Mat4, HierarchyError> {
        transforms.world_matrix(self.transform)
    }

    pub fn normal_matrix(&self, transforms: &TransformTree) -> Result<Mat3, HierarchyError> {
        transforms.normal_matrix(self.transform)
    }

    pub fn draw(&self, program: &mut dyn ShaderProgram) {
        program.draw(self.geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::recording::{Call, RecordingProgram};
    use crate::transform::Transform;
    use glam::Vec3;

    #[test]
    fn model_matrix_follows_parent() {
        let mut tree = TransformTree::new();
        let parent = tree.insert(Transform::from_position(Vec3::new(0.0, 4.0, 0.0)));
        let own = tree.insert(Transform::from_position(Vec3::X));
        tree.add_child(parent, own).unwrap();

        let mesh = Mesh::new(GeometryId(0), own);
        let model = mesh.model_matrix(&tree).unwrap();
        assert_eq!(model.w_axis.truncate(), Vec3::new(1.0, 4.0, 0.0));
    }

    #[test]
    fn draw_forwards_geometry() {
        let mut tree = TransformTree::new();
        let mesh = Mesh::new(GeometryId(7), tree.create()).with_texture(TextureId(2));
        let mut program = RecordingProgram::default();

        mesh.draw(&mut program);
        assert_eq!(program.calls, vec![Call::Draw(GeometryId(7))]);
        assert_eq!(mesh.texture, Some(TextureId(2)));
    }
}
