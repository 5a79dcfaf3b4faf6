//! Light sources and per-frame lighting state.
//!
//! Lights are plain data. [`Lighting::bind`] packs them into the uniform contract of the
//! Phong program; colours are premultiplied by intensity on the way out.

use glam::Vec3;
use thiserror::Error;

use crate::shader::{ShaderProgram, uniforms};

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LightError {
    #[error("light direction must be non-zero")]
    ZeroDirection,
}

/// Infinitely distant light shining along `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, -1.0, -1.0).normalize(),
            color: Vec3::ONE,
            intensity: 0.8,
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Result<Self, LightError> {
        let mut light = Self {
            color,
            intensity,
            ..Self::default()
        };
        light.set_direction(direction)?;
        Ok(light)
    }

    /// Unit direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Stores the normalised direction. A zero vector is rejected and the old direction kept.
    pub fn set_direction(&mut self, direction: Vec3) -> Result<(), LightError> {
        self.direction = direction
            .try_normalize()
            .ok_or(LightError::ZeroDirection)?;
        Ok(())
    }

    /// Colour scaled by intensity, as sent to the shader.
    pub fn uniform_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Positional light with distance attenuation `1 / (c + l*d + q*d^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 3.0, 2.0),
            color: Vec3::ONE,
            intensity: 1.0,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            ..Self::default()
        }
    }

    pub fn attenuation_factors(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }

    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    pub fn uniform_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Everything the shading stage needs to light a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub directional: DirectionalLight,
    pub point: PointLight,
    pub ambient_strength: f32,
    pub specular_strength: f32,
    pub shininess: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            directional: DirectionalLight::default(),
            point: PointLight::default(),
            ambient_strength: 0.2,
            specular_strength: 0.5,
            shininess: 32.0,
        }
    }
}

impl Lighting {
    /// Writes every light uniform. Called once per frame, before any object is drawn.
    pub fn bind(&self, program: &mut dyn ShaderProgram) {
        program.set_vec3(uniforms::LIGHT_DIRECTION, self.directional.direction());
        program.set_vec3(uniforms::LIGHT_COLOR, self.directional.uniform_color());
        program.set_float(uniforms::AMBIENT_STRENGTH, self.ambient_strength);
        program.set_float(uniforms::SPECULAR_STRENGTH, self.specular_strength);
        program.set_float(uniforms::SHININESS, self.shininess);

        program.set_vec3(uniforms::POINT_LIGHT_POS, self.point.position);
        program.set_vec3(uniforms::POINT_LIGHT_COLOR, self.point.uniform_color());
        program.set_float(uniforms::POINT_LIGHT_CONSTANT, self.point.constant);
        program.set_float(uniforms::POINT_LIGHT_LINEAR, self.point.linear);
        program.set_float(uniforms::POINT_LIGHT_QUADRATIC, self.point.quadratic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::recording::{Call, RecordingProgram};

    #[test]
    fn direction_is_normalised_on_every_set() {
        let mut light = DirectionalLight::new(Vec3::new(0.0, -4.0, 0.0), Vec3::ONE, 1.0).unwrap();
        assert_eq!(light.direction(), Vec3::NEG_Y);

        light.set_direction(Vec3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((light.direction() - Vec3::new(0.6, 0.0, 0.8)).length() < 0.0001);

        assert_eq!(light.set_direction(Vec3::ZERO), Err(LightError::ZeroDirection));
        assert!((light.direction() - Vec3::new(0.6, 0.0, 0.8)).length() < 0.0001);
    }

    #[test]
    fn colors_are_premultiplied() {
        let light = DirectionalLight::new(Vec3::X, Vec3::new(1.0, 0.5, 0.0), 2.0).unwrap();
        assert_eq!(light.uniform_color(), Vec3::new(2.0, 1.0, 0.0));

        let point = PointLight::new(Vec3::ZERO, Vec3::splat(0.5), 0.5);
        assert_eq!(point.uniform_color(), Vec3::splat(0.25));
    }

    #[test]
    fn attenuation_falls_off() {
        let point = PointLight::default();
        assert_eq!(point.attenuation(0.0), 1.0);
        let expected = 1.0 / (1.0 + 0.09 * 10.0 + 0.032 * 100.0);
        assert!((point.attenuation(10.0) - expected).abs() < 1e-6);
        assert!(point.attenuation(20.0) < point.attenuation(10.0));

        let flat = point.attenuation_factors(1.0, 0.0, 0.0);
        assert_eq!(flat.attenuation(100.0), 1.0);
    }

    #[test]
    fn bind_writes_the_full_contract() {
        let lighting = Lighting::default();
        let mut program = RecordingProgram::default();
        lighting.bind(&mut program);

        for name in [
            uniforms::LIGHT_DIRECTION,
            uniforms::LIGHT_COLOR,
            uniforms::AMBIENT_STRENGTH,
            uniforms::SPECULAR_STRENGTH,
            uniforms::SHININESS,
            uniforms::POINT_LIGHT_POS,
            uniforms::POINT_LIGHT_COLOR,
            uniforms::POINT_LIGHT_CONSTANT,
            uniforms::POINT_LIGHT_LINEAR,
            uniforms::POINT_LIGHT_QUADRATIC,
        ] {
            assert_eq!(program.count(name), 1, "{name} not bound exactly once");
        }
        assert!(program.calls.contains(&Call::Float(uniforms::SHININESS.into(), 32.0)));
    }
}
