//! Ordered registry of named meshes and the per-frame render traversal.
//!
//! A [`Scene`] owns the [`TransformTree`] its meshes are placed with. Objects are drawn in the
//! order they were added. Names are unique: adding an object under a name already in use is
//! rejected with [`SceneError::DuplicateName`] and the existing entry stays as it was.

use thiserror::Error;

use crate::camera::Camera;
use crate::light::Lighting;
use crate::mesh::{GeometryId, Mesh, TextureId};
use crate::shader::{ShaderProgram, uniforms};
use crate::transform::{HierarchyError, Transform, TransformId, TransformTree};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("an object named `{0}` already exists")]
    DuplicateName(String),
    #[error("no object named `{0}`")]
    UnknownObject(String),
    #[error("transform {transform:?} already places `{owner}`")]
    TransformInUse {
        transform: TransformId,
        owner: String,
    },
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// A named entry in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Mesh,
}

#[derive(Default)]
pub struct Scene {
    transforms: TransformTree,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transforms(&self) -> &TransformTree {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut TransformTree {
        &mut self.transforms
    }

    /// Registers a mesh whose transform already lives in this scene's tree.
    pub fn add_object(&mut self, name: impl Into<String>, mesh: Mesh) -> Result<(), SceneError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(SceneError::DuplicateName(name));
        }
        if !self.transforms.contains(mesh.transform) {
            return Err(HierarchyError::UnknownTransform(mesh.transform).into());
        }
        if let Some(owner) = self
            .objects
            .iter()
            .find(|o| o.mesh.transform == mesh.transform)
        {
            return Err(SceneError::TransformInUse {
                transform: mesh.transform,
                owner: owner.name.clone(),
            });
        }

        log::debug!("scene: added `{name}`");
        self.objects.push(SceneObject { name, mesh });
        Ok(())
    }

    /// Creates a transform and registers an untextured mesh placed by it.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        geometry: GeometryId,
        transform: Transform,
    ) -> Result<TransformId, SceneError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(SceneError::DuplicateName(name));
        }

        let id = self.transforms.insert(transform);
        self.add_object(name, Mesh::new(geometry, id))?;
        Ok(id)
    }

    /// Removes an object and its transform. Child transforms become roots.
    pub fn remove_object(&mut self, name: &str) -> Result<Mesh, SceneError> {
        let index = self
            .objects
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| SceneError::UnknownObject(name.to_string()))?;

        let object = self.objects.remove(index);
        if self.transforms.contains(object.mesh.transform) {
            self.transforms.remove(object.mesh.transform)?;
        }

        log::debug!("scene: removed `{name}`");
        Ok(object.mesh)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.iter().any(|o| o.name == name)
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    /// Objects in draw order.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn set_texture(
        &mut self,
        name: &str,
        texture: Option<TextureId>,
    ) -> Result<(), SceneError> {
        let object = self
            .object_mut(name)
            .ok_or_else(|| SceneError::UnknownObject(name.to_string()))?;
        object.mesh.set_texture(texture);
        Ok(())
    }

    /// Drops every object and transform.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.transforms.clear();
    }

    /// Returns `base` if unused, otherwise the first free `base (n)`.
    pub fn unique_name(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 0;
        while self.contains(&candidate) {
            counter += 1;
            candidate = format!("{base} ({counter})");
        }
        candidate
    }

    /// Draws every object through `program`.
    ///
    /// Camera and light uniforms are written once up front. Each object then gets its world
    /// matrix, normal matrix and texture state, in that order, immediately before its draw.
    /// Objects whose transform was removed from the tree behind the scene's back are
    /// skipped with a warning.
    pub fn render(
        &self,
        program: &mut dyn ShaderProgram,
        camera: &Camera,
        lighting: &Lighting,
    ) -> Result<(), SceneError> {
        program.set_mat4(uniforms::VIEW, &camera.view_matrix());
        program.set_mat4(uniforms::PROJECTION, &camera.projection_matrix());
        program.set_vec3(uniforms::VIEW_POS, camera.position());
        lighting.bind(program);

        for object in &self.objects {
            let mesh = &object.mesh;
            let matrices = mesh
                .model_matrix(&self.transforms)
                .and_then(|model| Ok((model, mesh.normal_matrix(&self.transforms)?)));
            let (model, normal) = match matrices {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("skipping `{}`: {e}", object.name);
                    continue;
                }
            };
            program.set_mat4(uniforms::MODEL, &model);
            program.set_mat3(uniforms::NORMAL_MATRIX, &normal);

            match mesh.texture {
                Some(texture) => {
                    program.set_int(uniforms::USE_TEXTURE, 1);
                    program.set_int(uniforms::TEXTURE, 0);
                    program.bind_texture(0, texture);
                }
                None => program.set_int(uniforms::USE_TEXTURE, 0),
            }

            mesh.draw(program);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::recording::{Call, RecordingProgram};
    use glam::{Mat4, Vec3};

    #[test]
    fn duplicate_names_are_rejected() {
        let mut scene = Scene::new();
        let first = scene.spawn("cube", GeometryId(0), Transform::new()).unwrap();

        let other = scene.transforms_mut().create();
        assert_eq!(
            scene.add_object("cube", Mesh::new(GeometryId(1), other)),
            Err(SceneError::DuplicateName("cube".into()))
        );
        assert_eq!(
            scene.spawn("cube", GeometryId(2), Transform::new()),
            Err(SceneError::DuplicateName("cube".into()))
        );

        assert_eq!(scene.len(), 1);
        let object = scene.object("cube").unwrap();
        assert_eq!(object.mesh.geometry, GeometryId(0));
        assert_eq!(object.mesh.transform, first);
    }

    #[test]
    fn add_requires_a_known_transform() {
        let mut scene = Scene::new();
        let mut foreign = TransformTree::new();
        let id = foreign.create();
        assert_eq!(
            scene.add_object("ghost", Mesh::new(GeometryId(0), id)),
            Err(SceneError::Hierarchy(HierarchyError::UnknownTransform(id)))
        );
        assert!(scene.is_empty());
    }

    #[test]
    fn transforms_place_a_single_object() {
        let mut scene = Scene::new();
        let shared = scene.spawn("a", GeometryId(0), Transform::new()).unwrap();

        assert_eq!(
            scene.add_object("b", Mesh::new(GeometryId(1), shared)),
            Err(SceneError::TransformInUse {
                transform: shared,
                owner: "a".into(),
            })
        );
        assert_eq!(scene.len(), 1);

        scene.remove_object("a").unwrap();
        let mut program = RecordingProgram::default();
        scene
            .render(&mut program, &Camera::new(), &Lighting::default())
            .unwrap();
        assert!(program.draws().is_empty());
    }

    #[test]
    fn render_skips_objects_with_removed_transforms() {
        let mut scene = Scene::new();
        let gone = scene.spawn("gone", GeometryId(0), Transform::new()).unwrap();
        scene.spawn("kept", GeometryId(1), Transform::new()).unwrap();
        scene.transforms_mut().remove(gone).unwrap();

        let mut program = RecordingProgram::default();
        scene
            .render(&mut program, &Camera::new(), &Lighting::default())
            .unwrap();

        assert_eq!(program.draws(), vec![GeometryId(1)]);
        assert_eq!(program.count(uniforms::MODEL), 1);
    }

    #[test]
    fn remove_keeps_order_and_frees_transform() {
        let mut scene = Scene::new();
        scene.spawn("a", GeometryId(0), Transform::new()).unwrap();
        let b = scene.spawn("b", GeometryId(1), Transform::new()).unwrap();
        scene.spawn("c", GeometryId(2), Transform::new()).unwrap();

        let removed = scene.remove_object("b").unwrap();
        assert_eq!(removed.geometry, GeometryId(1));
        assert!(!scene.transforms().contains(b));
        assert_eq!(scene.names().collect::<Vec<_>>(), vec!["a", "c"]);

        assert_eq!(
            scene.remove_object("b"),
            Err(SceneError::UnknownObject("b".into()))
        );
    }

    #[test]
    fn unique_name_counts_up() {
        let mut scene = Scene::new();
        assert_eq!(scene.unique_name("sphere"), "sphere");
        scene.spawn("sphere", GeometryId(0), Transform::new()).unwrap();
        scene.spawn("sphere (1)", GeometryId(0), Transform::new()).unwrap();
        assert_eq!(scene.unique_name("sphere"), "sphere (2)");
    }

    #[test]
    fn clear_empties_everything() {
        let mut scene = Scene::new();
        scene.spawn("a", GeometryId(0), Transform::new()).unwrap();
        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.transforms().is_empty());
    }

    #[test]
    fn render_binds_globals_once_then_each_object() {
        let mut scene = Scene::new();
        let parent = scene
            .spawn("parent", GeometryId(0), Transform::from_position(Vec3::X))
            .unwrap();
        let child = scene
            .spawn("child", GeometryId(1), Transform::from_position(Vec3::Y))
            .unwrap();
        scene.transforms_mut().add_child(parent, child).unwrap();
        scene.set_texture("child", Some(TextureId(4))).unwrap();

        let camera = Camera::new();
        let mut program = RecordingProgram::default();
        scene.render(&mut program, &camera, &Lighting::default()).unwrap();

        assert_eq!(program.count(uniforms::VIEW), 1);
        assert_eq!(program.count(uniforms::PROJECTION), 1);
        assert_eq!(program.count(uniforms::VIEW_POS), 1);
        assert_eq!(program.count(uniforms::LIGHT_DIRECTION), 1);
        assert_eq!(program.count(uniforms::MODEL), 2);
        assert_eq!(program.count(uniforms::NORMAL_MATRIX), 2);
        assert_eq!(program.draws(), vec![GeometryId(0), GeometryId(1)]);

        let child_model = Call::Mat4(
            uniforms::MODEL.into(),
            Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0)),
        );
        let child_model_at = program.position_of(&child_model).unwrap();
        let child_texture_at = program.position_of(&Call::BindTexture(0, TextureId(4))).unwrap();
        let child_draw_at = program.position_of(&Call::Draw(GeometryId(1))).unwrap();
        let parent_draw_at = program.position_of(&Call::Draw(GeometryId(0))).unwrap();

        assert!(parent_draw_at < child_model_at);
        assert!(child_model_at < child_texture_at);
        assert!(child_texture_at < child_draw_at);
    }

    #[test]
    fn untextured_objects_disable_sampling() {
        let mut scene = Scene::new();
        scene.spawn("plain", GeometryId(3), Transform::new()).unwrap();

        let mut program = RecordingProgram::default();
        scene
            .render(&mut program, &Camera::new(), &Lighting::default())
            .unwrap();

        let use_texture = Call::Int(uniforms::USE_TEXTURE.into(), 0);
        assert!(program.position_of(&use_texture).unwrap() < program.position_of(&Call::Draw(GeometryId(3))).unwrap());
        assert_eq!(program.count(uniforms::TEXTURE), 0);
        assert!(!program.calls.iter().any(|c| matches!(c, Call::BindTexture(..))));
    }
}
