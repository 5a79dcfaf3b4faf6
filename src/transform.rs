//! Spatial transforms and the parent/child hierarchy.
//!
//! A [`Transform`] is a plain position / Euler rotation / scale triple. Transforms live in a
//! [`TransformTree`], an arena backed by a [`hecs::World`], and are addressed through
//! [`TransformId`] handles. The tree owns the parent/child links, so a transform can never be
//! listed under two parents and the hierarchy can never contain a cycle.
//!
//! # Matrix conventions
//!
//! | Matrix  | Definition                                   |
//! |---------|----------------------------------------------|
//! | local   | `T * Rx * Ry * Rz * S`                       |
//! | world   | `parent.world * local` (local for roots)     |
//! | normal  | `transpose(inverse(mat3(world)))`            |
//!
//! World and normal matrices are derived on every call. Nothing is cached, so a change to
//! any ancestor is visible to its descendants immediately.
//!
//! ```
//! use vantage::{TransformTree, Vec3};
//!
//! let mut tree = TransformTree::new();
//! let parent = tree.create();
//! let child = tree.create();
//! tree.set_position(parent, Vec3::new(2.0, 0.0, 0.0)).unwrap();
//! tree.set_position(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();
//! tree.set_parent(child, Some(parent)).unwrap();
//!
//! let world = tree.world_matrix(child).unwrap();
//! assert_eq!(world.w_axis.truncate(), Vec3::new(3.0, 0.0, 0.0));
//! ```

use glam::{Mat3, Mat4, Vec3};
use thiserror::Error;

/// Handle to a transform stored in a [`TransformTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransformId(pub(crate) hecs::Entity);

/// Errors raised by hierarchy edits and lookups.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("transform {0:?} does not exist")]
    UnknownTransform(TransformId),
    #[error("a transform cannot be its own parent")]
    SelfParent,
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    Cycle {
        child: TransformId,
        parent: TransformId,
    },
}

/// Local position, rotation and scale of a node.
///
/// `rotation` holds Euler angles in radians, applied X then Y then Z in the local matrix.
/// The builder and the tree setters that take degrees convert on the way in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the rotation from Euler angles in degrees.
    pub fn rotation_degrees(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees_to_radians(degrees);
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Local matrix, `T * Rx * Ry * Rz * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_scale(self.scale)
    }
}

fn degrees_to_radians(degrees: Vec3) -> Vec3 {
    Vec3::new(
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Derives the normal matrix of an arbitrary world matrix.
pub fn normal_matrix(world: &Mat4) -> Mat3 {
    Mat3::from_mat4(*world).inverse().transpose()
}

#[derive(Debug, Default)]
struct Hierarchy {
    parent: Option<hecs::Entity>,
    children: Vec<hecs::Entity>,
}

/// Arena of transforms and their parent/child links.
#[derive(Default)]
pub struct TransformTree {
    world: hecs::World,
}

impl TransformTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an identity transform with no parent.
    pub fn create(&mut self) -> TransformId {
        self.insert(Transform::default())
    }

    pub fn insert(&mut self, transform: Transform) -> TransformId {
        TransformId(self.world.spawn((transform, Hierarchy::default())))
    }

    pub fn contains(&self, id: TransformId) -> bool {
        self.world.contains(id.0)
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.len() == 0
    }

    /// Returns a copy of the local transform.
    pub fn get(&self, id: TransformId) -> Result<Transform, HierarchyError> {
        self.world
            .get::<&Transform>(id.0)
            .map(|t| *t)
            .map_err(|_| HierarchyError::UnknownTransform(id))
    }

    /// Replaces the local transform wholesale. Links are untouched.
    pub fn set(&mut self, id: TransformId, transform: Transform) -> Result<(), HierarchyError> {
        self.update(id, |t| *t = transform)
    }

    pub fn set_position(&mut self, id: TransformId, position: Vec3) -> Result<(), HierarchyError> {
        self.update(id, |t| t.position = position)
    }

    /// Sets the rotation from Euler angles in degrees. Stored as radians.
    pub fn set_rotation(&mut self, id: TransformId, degrees: Vec3) -> Result<(), HierarchyError> {
        let radians = degrees_to_radians(degrees);
        self.update(id, |t| t.rotation = radians)
    }

    pub fn set_rotation_radians(
        &mut self,
        id: TransformId,
        radians: Vec3,
    ) -> Result<(), HierarchyError> {
        self.update(id, |t| t.rotation = radians)
    }

    pub fn set_scale(&mut self, id: TransformId, scale: Vec3) -> Result<(), HierarchyError> {
        self.update(id, |t| t.scale = scale)
    }

    fn update(
        &mut self,
        id: TransformId,
        f: impl FnOnce(&mut Transform),
    ) -> Result<(), HierarchyError> {
        let mut transform = self
            .world
            .get::<&mut Transform>(id.0)
            .map_err(|_| HierarchyError::UnknownTransform(id))?;
        f(&mut transform);
        Ok(())
    }

    pub fn parent(&self, id: TransformId) -> Result<Option<TransformId>, HierarchyError> {
        Ok(self.hierarchy(id)?.parent.map(TransformId))
    }

    /// Children in the order they were attached.
    pub fn children(&self, id: TransformId) -> Result<Vec<TransformId>, HierarchyError> {
        Ok(self
            .hierarchy(id)?
            .children
            .iter()
            .copied()
            .map(TransformId)
            .collect())
    }

    fn hierarchy(&self, id: TransformId) -> Result<hecs::Ref<'_, Hierarchy>, HierarchyError> {
        self.world
            .get::<&Hierarchy>(id.0)
            .map_err(|_| HierarchyError::UnknownTransform(id))
    }

    fn hierarchy_mut(
        &self,
        id: TransformId,
    ) -> Result<hecs::RefMut<'_, Hierarchy>, HierarchyError> {
        self.world
            .get::<&mut Hierarchy>(id.0)
            .map_err(|_| HierarchyError::UnknownTransform(id))
    }

    /// Attaches `id` under `parent`, or detaches it when `parent` is `None`.
    ///
    /// The node is first removed from its current parent's child list, so it is never listed
    /// twice. Fails with [`HierarchyError::Cycle`] if `parent` is `id` itself or one of its
    /// descendants; the tree is left unchanged in that case.
    pub fn set_parent(
        &mut self,
        id: TransformId,
        parent: Option<TransformId>,
    ) -> Result<(), HierarchyError> {
        let current = self.parent(id)?;

        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(HierarchyError::UnknownTransform(parent));
            }
            if parent == id {
                return Err(HierarchyError::SelfParent);
            }
            if self.is_ancestor(id, parent) {
                return Err(HierarchyError::Cycle { child: id, parent });
            }
        }

        if current == parent {
            return Ok(());
        }

        if let Some(old) = current {
            self.hierarchy_mut(old)?.children.retain(|&c| c != id.0);
        }

        self.hierarchy_mut(id)?.parent = parent.map(|p| p.0);

        if let Some(parent) = parent {
            let mut links = self.hierarchy_mut(parent)?;
            if !links.children.contains(&id.0) {
                links.children.push(id.0);
            }
        }

        Ok(())
    }

    pub fn add_child(&mut self, parent: TransformId, child: TransformId) -> Result<(), HierarchyError> {
        self.set_parent(child, Some(parent))
    }

    /// Detaches `child` if it is currently attached to `parent`; otherwise does nothing.
    pub fn remove_child(
        &mut self,
        parent: TransformId,
        child: TransformId,
    ) -> Result<(), HierarchyError> {
        if self.parent(child)? == Some(parent) {
            self.set_parent(child, None)?;
        }
        Ok(())
    }

    /// True if `ancestor` is `node` or appears on `node`'s parent chain.
    pub fn is_ancestor(&self, ancestor: TransformId, node: TransformId) -> bool {
        let mut current = Some(node.0);
        // the chain can never be longer than the arena
        for _ in 0..=self.len() {
            match current {
                Some(entity) if entity == ancestor.0 => return true,
                Some(entity) => {
                    current = self
                        .world
                        .get::<&Hierarchy>(entity)
                        .ok()
                        .and_then(|h| h.parent);
                }
                None => return false,
            }
        }
        false
    }

    /// The local matrix of a single node.
    pub fn model_matrix(&self, id: TransformId) -> Result<Mat4, HierarchyError> {
        Ok(self.get(id)?.matrix())
    }

    /// Composes the local matrices from the root down to `id`.
    pub fn world_matrix(&self, id: TransformId) -> Result<Mat4, HierarchyError> {
        let local = self.model_matrix(id)?;
        match self.parent(id)? {
            Some(parent) => Ok(self.world_matrix(parent)? * local),
            None => Ok(local),
        }
    }

    pub fn world_position(&self, id: TransformId) -> Result<Vec3, HierarchyError> {
        Ok(self.world_matrix(id)?.w_axis.truncate())
    }

    pub fn normal_matrix(&self, id: TransformId) -> Result<Mat3, HierarchyError> {
        Ok(normal_matrix(&self.world_matrix(id)?))
    }

    /// Removes a transform. Its children are detached and become roots.
    pub fn remove(&mut self, id: TransformId) -> Result<Transform, HierarchyError> {
        let transform = self.get(id)?;
        self.set_parent(id, None)?;

        for child in self.children(id)? {
            self.hierarchy_mut(child)?.parent = None;
        }

        // despawn cannot fail, the entity was just read
        let _ = self.world.despawn(id.0);
        Ok(transform)
    }

    pub fn clear(&mut self) {
        self.world.clear();
    }

    pub fn ids(&self) -> Vec<TransformId> {
        self.world.iter().map(|e| TransformId(e.entity())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.001
    }

    #[test]
    fn unparented_world_equals_model() {
        let mut tree = TransformTree::new();
        let id = tree.insert(
            Transform::new()
                .position(Vec3::new(1.0, 2.0, 3.0))
                .rotation_degrees(Vec3::new(10.0, 20.0, 30.0))
                .scale(Vec3::new(1.0, 2.0, 0.5)),
        );

        assert_eq!(tree.world_matrix(id).unwrap(), tree.model_matrix(id).unwrap());
    }

    #[test]
    fn child_inherits_parent_translation() {
        let mut tree = TransformTree::new();
        let parent = tree.insert(Transform::from_position(Vec3::new(2.0, 0.0, 0.0)));
        let child = tree.insert(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        tree.add_child(parent, child).unwrap();

        assert!(approx(tree.world_position(child).unwrap(), Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn three_level_chain_composes() {
        let mut tree = TransformTree::new();
        let root = tree.insert(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)).uniform_scale(2.0));
        let mid = tree.insert(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let leaf = tree.insert(Transform::from_position(Vec3::new(0.0, 0.0, 1.0)));
        tree.set_parent(mid, Some(root)).unwrap();
        tree.set_parent(leaf, Some(mid)).unwrap();

        let expected = tree.model_matrix(root).unwrap()
            * tree.model_matrix(mid).unwrap()
            * tree.model_matrix(leaf).unwrap();
        assert_eq!(tree.world_matrix(leaf).unwrap(), expected);
        assert!(approx(tree.world_position(leaf).unwrap(), Vec3::new(2.0, 1.0, 2.0)));
    }

    #[test]
    fn parent_changes_are_seen_by_children() {
        let mut tree = TransformTree::new();
        let parent = tree.create();
        let child = tree.insert(Transform::from_position(Vec3::X));
        tree.add_child(parent, child).unwrap();

        tree.set_rotation(parent, Vec3::new(0.0, 90.0, 0.0)).unwrap();
        assert!(approx(tree.world_position(child).unwrap(), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn rotation_is_stored_in_radians() {
        let mut tree = TransformTree::new();
        let id = tree.create();
        tree.set_rotation(id, Vec3::new(180.0, 90.0, 0.0)).unwrap();

        let rotation = tree.get(id).unwrap().rotation;
        assert!((rotation.x - std::f32::consts::PI).abs() < 0.001);
        assert!((rotation.y - std::f32::consts::FRAC_PI_2).abs() < 0.001);
    }

    #[test]
    fn reparenting_moves_child_exactly_once() {
        let mut tree = TransformTree::new();
        let a = tree.create();
        let b = tree.create();
        let child = tree.create();

        tree.set_parent(child, Some(a)).unwrap();
        tree.set_parent(child, Some(a)).unwrap();
        assert_eq!(tree.children(a).unwrap(), vec![child]);

        tree.set_parent(child, Some(b)).unwrap();
        assert!(tree.children(a).unwrap().is_empty());
        assert_eq!(tree.children(b).unwrap(), vec![child]);
        assert_eq!(tree.parent(child).unwrap(), Some(b));

        tree.set_parent(child, None).unwrap();
        assert!(tree.children(b).unwrap().is_empty());
        assert_eq!(tree.parent(child).unwrap(), None);
    }

    #[test]
    fn remove_child_ignores_non_children() {
        let mut tree = TransformTree::new();
        let a = tree.create();
        let b = tree.create();
        let child = tree.create();
        tree.add_child(a, child).unwrap();

        tree.remove_child(b, child).unwrap();
        assert_eq!(tree.parent(child).unwrap(), Some(a));

        tree.remove_child(a, child).unwrap();
        assert_eq!(tree.parent(child).unwrap(), None);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = TransformTree::new();
        let a = tree.create();
        let b = tree.create();
        let c = tree.create();
        tree.add_child(a, b).unwrap();
        tree.add_child(b, c).unwrap();

        assert_eq!(
            tree.set_parent(a, Some(c)),
            Err(HierarchyError::Cycle { child: a, parent: c })
        );
        assert_eq!(tree.set_parent(a, Some(a)), Err(HierarchyError::SelfParent));
        assert_eq!(tree.parent(a).unwrap(), None);
        assert_eq!(tree.children(c).unwrap(), Vec::new());
    }

    #[test]
    fn removing_a_parent_orphans_children() {
        let mut tree = TransformTree::new();
        let parent = tree.insert(Transform::from_position(Vec3::new(5.0, 0.0, 0.0)));
        let child = tree.insert(Transform::from_position(Vec3::X));
        tree.add_child(parent, child).unwrap();

        tree.remove(parent).unwrap();
        assert!(!tree.contains(parent));
        assert_eq!(tree.parent(child).unwrap(), None);
        assert!(approx(tree.world_position(child).unwrap(), Vec3::X));
        assert!(matches!(
            tree.world_matrix(parent),
            Err(HierarchyError::UnknownTransform(_))
        ));
    }

    #[test]
    fn uniform_scale_keeps_normal_direction() {
        let mut tree = TransformTree::new();
        let id = tree.insert(
            Transform::new()
                .rotation_degrees(Vec3::new(0.0, 45.0, 0.0))
                .uniform_scale(3.0),
        );

        let normal = (tree.normal_matrix(id).unwrap() * Vec3::X).normalize();
        let rotated = Mat3::from_rotation_y(45f32.to_radians()) * Vec3::X;
        assert!(approx(normal, rotated));
    }

    #[test]
    fn non_uniform_scale_differs_from_upper_3x3() {
        let mut tree = TransformTree::new();
        let id = tree.insert(Transform::new().scale(Vec3::new(2.0, 1.0, 1.0)));

        let naive = Mat3::from_mat4(tree.world_matrix(id).unwrap());
        let normal = tree.normal_matrix(id).unwrap();
        assert_ne!(naive, normal);
        assert!((normal.x_axis.x - 0.5).abs() < 0.001);

        // a 45 degree surface normal must tilt away from the stretched axis
        let n = (normal * Vec3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.y > n.x);
    }
}
