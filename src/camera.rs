//! Perspective and orthographic cameras.
//!
//! [`Camera`] keeps its view and projection matrices up to date eagerly: every setter that
//! touches a parameter recomputes both before returning, so the getters are plain reads.
//! Projection parameters are validated (`near > 0`, `far > near`, `aspect > 0`,
//! `0 < fov < 180`, `ortho_size > 0`); a rejected setter leaves the camera untouched.
//!
//! A degenerate look-at (position on the target, or `up` parallel to the view direction)
//! has no view matrix. The camera stores the new vectors and keeps its previous view until
//! they describe a valid look-at again.
//!
//! Matrices target wgpu clip space (right-handed view, depth in `[0, 1]`).

use glam::{Mat4, Vec3};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CameraError {
    #[error("near plane must be positive, got {0}")]
    NonPositiveNear(f32),
    #[error("far plane {far} must lie beyond near plane {near}")]
    FarBeforeNear { near: f32, far: f32 },
    #[error("aspect ratio must be positive, got {0}")]
    NonPositiveAspect(f32),
    #[error("field of view must be between 0 and 180 degrees, got {0}")]
    FovOutOfRange(f32),
    #[error("orthographic size must be positive, got {0}")]
    NonPositiveOrthoSize(f32),
}

/// A look-at camera with a switchable projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    /// Vertical field of view in degrees.
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    /// Half-height of the orthographic view volume.
    ortho_size: f32,
    mode: ProjectionMode,
    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            ortho_size: 5.0,
            mode: ProjectionMode::Perspective,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }
}

fn check_clip(near: f32, far: f32) -> Result<(), CameraError> {
    if !(near > 0.0) {
        return Err(CameraError::NonPositiveNear(near));
    }
    if !(far > near) {
        return Err(CameraError::FarBeforeNear { near, far });
    }
    Ok(())
}

fn check_aspect(aspect: f32) -> Result<(), CameraError> {
    if aspect > 0.0 && aspect.is_finite() {
        Ok(())
    } else {
        Err(CameraError::NonPositiveAspect(aspect))
    }
}

fn check_fov(fov: f32) -> Result<(), CameraError> {
    if fov > 0.0 && fov < 180.0 {
        Ok(())
    } else {
        Err(CameraError::FovOutOfRange(fov))
    }
}

fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Option<Mat4> {
    let direction = target - position;
    if direction.length_squared() <= f32::EPSILON
        || direction.normalize().cross(up.normalize_or_zero()).length_squared() <= f32::EPSILON
    {
        return None;
    }
    Some(Mat4::look_at_rh(position, target, up))
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A perspective camera at the default position, looking at the origin.
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Result<Self, CameraError> {
        check_fov(fov)?;
        check_aspect(aspect)?;
        check_clip(near, far)?;

        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            ..Self::default()
        };
        camera.update_matrices();
        Ok(camera)
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.set_target(target);
        self
    }

    fn update_matrices(&mut self) {
        match look_at(self.position, self.target, self.up) {
            Some(view) => self.view = view,
            None => log::debug!(
                "degenerate look-at from {} to {} (up {}), keeping previous view",
                self.position,
                self.target,
                self.up
            ),
        }
        self.projection = match self.mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_size;
                let half_width = half_height * self.aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        };
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn ortho_size(&self) -> f32 {
        self.ortho_size
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Unit vector from the position towards the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_matrices();
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.update_matrices();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.update_matrices();
    }

    pub fn set_aspect(&mut self, aspect: f32) -> Result<(), CameraError> {
        check_aspect(aspect)?;
        self.aspect = aspect;
        self.update_matrices();
        Ok(())
    }

    /// Sets the vertical field of view in degrees.
    pub fn set_fov(&mut self, fov: f32) -> Result<(), CameraError> {
        check_fov(fov)?;
        self.fov = fov;
        self.update_matrices();
        Ok(())
    }

    pub fn set_ortho_size(&mut self, size: f32) -> Result<(), CameraError> {
        if !(size > 0.0) {
            return Err(CameraError::NonPositiveOrthoSize(size));
        }
        self.ortho_size = size;
        self.update_matrices();
        Ok(())
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) -> Result<(), CameraError> {
        check_clip(near, far)?;
        self.near = near;
        self.far = far;
        self.update_matrices();
        Ok(())
    }

    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
        self.update_matrices();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn defaults() {
        let camera = Camera::new();
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.fov(), 75.0);
        assert_eq!(camera.ortho_size(), 5.0);
        assert_eq!(camera.projection_mode(), ProjectionMode::Perspective);
        assert_eq!(
            camera.view_matrix(),
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
        );
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::new();
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 0.001 && ndc.y.abs() < 0.001);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn setters_recompute_eagerly() {
        let mut camera = Camera::new();
        let before = camera.projection_matrix();

        camera.set_fov(45.0).unwrap();
        assert_ne!(camera.projection_matrix(), before);
        assert_eq!(
            camera.projection_matrix(),
            Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 1000.0)
        );

        camera.set_position(Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(
            camera.view_matrix(),
            Mat4::look_at_rh(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y)
        );
        assert!((camera.forward() - Vec3::NEG_X).length() < 0.001);
    }

    #[test]
    fn degenerate_look_at_keeps_previous_view() {
        let mut camera = Camera::new();
        let view = camera.view_matrix();

        camera.set_position(Vec3::ZERO);
        assert_eq!(camera.position(), Vec3::ZERO);
        assert_eq!(camera.view_matrix(), view);

        camera.set_position(Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(camera.view_matrix(), view);
        assert!(camera.view_projection().is_finite());

        camera.set_up(Vec3::Z);
        assert_eq!(
            camera.view_matrix(),
            Mat4::look_at_rh(Vec3::new(0.0, 4.0, 0.0), Vec3::ZERO, Vec3::Z)
        );
    }

    #[test]
    fn orthographic_uses_half_height_and_aspect() {
        let mut camera = Camera::new();
        camera.set_aspect(2.0).unwrap();
        camera.set_ortho_size(3.0).unwrap();
        camera.set_projection_mode(ProjectionMode::Orthographic);

        assert_eq!(
            camera.projection_matrix(),
            Mat4::orthographic_rh(-6.0, 6.0, -3.0, 3.0, 0.1, 1000.0)
        );

        camera.set_projection_mode(ProjectionMode::Perspective);
        assert_eq!(
            camera.projection_matrix(),
            Mat4::perspective_rh(75f32.to_radians(), 2.0, 0.1, 1000.0)
        );
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut camera = Camera::new();
        let snapshot = camera.clone();

        assert_eq!(camera.set_aspect(0.0), Err(CameraError::NonPositiveAspect(0.0)));
        assert_eq!(
            camera.set_clip_planes(1.0, 0.5),
            Err(CameraError::FarBeforeNear { near: 1.0, far: 0.5 })
        );
        assert_eq!(camera.set_clip_planes(0.0, 10.0), Err(CameraError::NonPositiveNear(0.0)));
        assert_eq!(camera.set_fov(180.0), Err(CameraError::FovOutOfRange(180.0)));
        assert!(camera.set_ortho_size(-1.0).is_err());
        assert_eq!(camera, snapshot);

        assert!(Camera::perspective(60.0, 1.5, 0.1, 0.05).is_err());
    }
}
