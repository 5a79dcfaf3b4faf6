//! Tunable scene parameters.
//!
//! [`SceneConfig`] mirrors the knobs an interactive control panel exposes: lighting,
//! camera, animation, geometry choice, controller settings and the primary object's
//! transform. Angles are in degrees, colours are linear RGB in `[0, 1]`.

use glam::Vec3;

use crate::camera::{Camera, CameraError, ProjectionMode};
use crate::light::{DirectionalLight, LightError, Lighting, PointLight};
use crate::primitives::GeometryKind;
use crate::transform::Transform;

/// Which controller, if any, drives the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CameraMode {
    #[default]
    None,
    FirstPerson,
    Orbit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLightConfig {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        let light = PointLight::default();
        Self {
            position: light.position,
            color: light.color,
            intensity: light.intensity,
            constant: light.constant,
            linear: light.linear,
            quadratic: light.quadratic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingConfig {
    pub ambient_strength: f32,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub specular_strength: f32,
    pub shininess: f32,
    pub point_light: PointLightConfig,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let lighting = Lighting::default();
        Self {
            ambient_strength: lighting.ambient_strength,
            direction: lighting.directional.direction(),
            color: lighting.directional.color,
            intensity: lighting.directional.intensity,
            specular_strength: lighting.specular_strength,
            shininess: lighting.shininess,
            point_light: PointLightConfig::default(),
        }
    }
}

impl LightingConfig {
    /// Builds frame lighting. Fails only for a zero light direction.
    pub fn to_lighting(&self) -> Result<Lighting, LightError> {
        let p = &self.point_light;
        Ok(Lighting {
            directional: DirectionalLight::new(self.direction, self.color, self.intensity)?,
            point: PointLight::new(p.position, p.color, p.intensity)
                .attenuation_factors(p.constant, p.linear, p.quadratic),
            ambient_strength: self.ambient_strength,
            specular_strength: self.specular_strength,
            shininess: self.shininess,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Orbit distance from the target.
    pub distance: f32,
    pub projection_mode: ProjectionMode,
    pub ortho_size: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            distance: 10.0,
            projection_mode: ProjectionMode::Perspective,
            ortho_size: 5.0,
        }
    }
}

impl CameraConfig {
    /// Validates everything before touching the camera, so a bad value changes nothing.
    pub fn apply(&self, camera: &mut Camera) -> Result<(), CameraError> {
        let mut next = camera.clone();
        next.set_fov(self.fov)?;
        next.set_ortho_size(self.ortho_size)?;
        next.set_projection_mode(self.projection_mode);
        *camera = next;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Multiplier on every rotation speed.
    pub speed: f32,
    pub auto_rotate: bool,
    /// Degrees per second around X.
    pub rotation_speed_x: f32,
    /// Degrees per second around Y.
    pub rotation_speed_y: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            auto_rotate: true,
            rotation_speed_x: 30.0,
            rotation_speed_y: 45.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlsConfig {
    pub camera_mode: CameraMode,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub orbit_sensitivity: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            camera_mode: CameraMode::None,
            movement_speed: 5.0,
            mouse_sensitivity: 0.002,
            orbit_sensitivity: 0.005,
        }
    }
}

/// Placement of the primary object. Rotation is ignored while auto-rotate is on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectConfig {
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl ObjectConfig {
    pub fn transform(&self) -> Transform {
        Transform::new()
            .position(self.position)
            .rotation_degrees(self.rotation)
            .scale(self.scale)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SceneConfig {
    pub lighting: LightingConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub geometry: GeometryKind,
    pub controls: ControlsConfig,
    pub object: ObjectConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_runtime_types() {
        let config = SceneConfig::default();
        let lighting = config.lighting.to_lighting().unwrap();
        let expected = Lighting::default();
        assert!(
            (lighting.directional.direction() - expected.directional.direction()).length() < 1e-6
        );
        assert_eq!(lighting.point, expected.point);
        assert_eq!(lighting.shininess, expected.shininess);
        assert_eq!(config.geometry, GeometryKind::Cube);
        assert_eq!(config.controls.camera_mode, CameraMode::None);

        let mut camera = Camera::new();
        config.camera.apply(&mut camera).unwrap();
        assert_eq!(camera, Camera::new());
    }

    #[test]
    fn zero_light_direction_is_rejected() {
        let mut lighting = LightingConfig::default();
        lighting.direction = Vec3::ZERO;
        assert_eq!(lighting.to_lighting(), Err(LightError::ZeroDirection));
    }

    #[test]
    fn camera_apply_is_all_or_nothing() {
        let mut camera = Camera::new();
        let config = CameraConfig {
            fov: 60.0,
            ortho_size: -1.0,
            projection_mode: ProjectionMode::Orthographic,
            ..CameraConfig::default()
        };
        assert!(config.apply(&mut camera).is_err());
        assert_eq!(camera, Camera::new());

        let config = CameraConfig {
            ortho_size: 8.0,
            ..config
        };
        config.apply(&mut camera).unwrap();
        assert_eq!(camera.fov(), 60.0);
        assert_eq!(camera.projection_mode(), ProjectionMode::Orthographic);
    }

    #[test]
    fn object_transform_converts_degrees() {
        let object = ObjectConfig {
            rotation: Vec3::new(0.0, 90.0, 0.0),
            ..ObjectConfig::default()
        };
        let transform = object.transform();
        assert!((transform.rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
