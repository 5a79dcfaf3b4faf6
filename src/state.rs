//! Application state and the commands that change it.
//!
//! Everything the frame loop mutates lives in one [`AppState`]: the scene, the shared
//! camera, frame lighting, the active controller and an explicit [`Clock`]. Outside code
//! never pokes at these directly; it sends a [`Command`] through [`AppState::apply`] and
//! advances time with [`AppState::update`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;
use rand::Rng;
use thiserror::Error;

use crate::camera::{Camera, CameraError, ProjectionMode};
use crate::config::{CameraMode, SceneConfig};
use crate::first_person::FirstPersonController;
use crate::input::InputRouter;
use crate::light::{LightError, Lighting};
use crate::mesh::GeometryId;
use crate::orbit::OrbitController;
use crate::primitives::GeometryKind;
use crate::scene::{Scene, SceneError};
use crate::shader::ShaderProgram;
use crate::transform::{HierarchyError, Transform};

/// Name of the object that geometry switching and auto-rotation act on.
pub const PRIMARY_OBJECT: &str = "primary";

/// Half-extent of the square on the ground plane that added objects are scattered over.
const SCATTER_RADIUS: f32 = 5.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("no geometry uploaded for {0}")]
    MissingGeometry(GeometryKind),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Light(#[from] LightError),
}

/// Per-application time, advanced once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Clock {
    elapsed: f32,
    delta: f32,
    frame: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances by `dt` seconds. Negative steps count as zero.
    pub fn tick(&mut self, dt: f32) {
        self.delta = dt.max(0.0);
        self.elapsed += self.delta;
        self.frame += 1;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Uploaded geometry for each built-in shape.
#[derive(Clone, Debug, Default)]
pub struct GeometryLibrary {
    handles: HashMap<GeometryKind, GeometryId>,
}

impl GeometryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: GeometryKind, geometry: GeometryId) {
        self.handles.insert(kind, geometry);
    }

    pub fn get(&self, kind: GeometryKind) -> Result<GeometryId, StateError> {
        self.handles
            .get(&kind)
            .copied()
            .ok_or(StateError::MissingGeometry(kind))
    }

    pub fn contains(&self, kind: GeometryKind) -> bool {
        self.handles.contains_key(&kind)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the primary object's geometry, keeping its transform and texture.
    SwitchGeometry(GeometryKind),
    SetCameraMode(CameraMode),
    SetProjectionMode(ProjectionMode),
    /// Adds a shape at a random spot on the ground plane under a generated name.
    AddObject(GeometryKind),
    RemoveObject(String),
    ApplyConfig(SceneConfig),
}

enum ActiveController {
    None,
    FirstPerson(Rc<RefCell<FirstPersonController>>),
    Orbit(Rc<RefCell<OrbitController>>),
}

pub struct AppState {
    config: SceneConfig,
    scene: Scene,
    camera: Rc<RefCell<Camera>>,
    lighting: Lighting,
    library: GeometryLibrary,
    controller: ActiveController,
    clock: Clock,
}

impl AppState {
    /// Builds a scene holding the primary object, with the camera at `(0, 3, 10)` looking
    /// at the origin, and attaches the controller named in `config`.
    pub fn new(
        config: SceneConfig,
        library: GeometryLibrary,
        router: &mut InputRouter,
    ) -> Result<Self, StateError> {
        let lighting = config.lighting.to_lighting()?;

        let mut camera = Camera::new()
            .at(Vec3::new(0.0, 3.0, 10.0))
            .looking_at(Vec3::ZERO);
        config.camera.apply(&mut camera)?;

        let mut scene = Scene::new();
        scene.spawn(
            PRIMARY_OBJECT,
            library.get(config.geometry)?,
            config.object.transform(),
        )?;

        let mut state = Self {
            config,
            scene,
            camera: Rc::new(RefCell::new(camera)),
            lighting,
            library,
            controller: ActiveController::None,
            clock: Clock::new(),
        };
        state.config.controls.camera_mode = CameraMode::None;
        state.set_camera_mode(config.controls.camera_mode, router);
        Ok(state)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> Rc<RefCell<Camera>> {
        self.camera.clone()
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn library(&self) -> &GeometryLibrary {
        &self.library
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn camera_mode(&self) -> CameraMode {
        match self.controller {
            ActiveController::None => CameraMode::None,
            ActiveController::FirstPerson(_) => CameraMode::FirstPerson,
            ActiveController::Orbit(_) => CameraMode::Orbit,
        }
    }

    pub fn first_person(&self) -> Option<Rc<RefCell<FirstPersonController>>> {
        match &self.controller {
            ActiveController::FirstPerson(c) => Some(c.clone()),
            _ => None,
        }
    }

    pub fn orbit(&self) -> Option<Rc<RefCell<OrbitController>>> {
        match &self.controller {
            ActiveController::Orbit(c) => Some(c.clone()),
            _ => None,
        }
    }

    pub fn apply(&mut self, command: Command, router: &mut InputRouter) -> Result<(), StateError> {
        log::debug!("applying {command:?}");
        match command {
            Command::SwitchGeometry(kind) => self.switch_geometry(kind),
            Command::SetCameraMode(mode) => {
                self.set_camera_mode(mode, router);
                Ok(())
            }
            Command::SetProjectionMode(mode) => {
                self.camera.borrow_mut().set_projection_mode(mode);
                self.config.camera.projection_mode = mode;
                Ok(())
            }
            Command::AddObject(kind) => self.add_object(kind).map(|_| ()),
            Command::RemoveObject(name) => {
                self.scene.remove_object(&name)?;
                Ok(())
            }
            Command::ApplyConfig(config) => self.apply_config(config, router),
        }
    }

    /// Advances the clock, moves the first-person camera and spins the primary object.
    pub fn update(&mut self, dt: f32) {
        self.clock.tick(dt);
        let dt = self.clock.delta();

        if let ActiveController::FirstPerson(controller) = &self.controller {
            controller.borrow_mut().update(dt);
        }

        let animation = self.config.animation;
        if !animation.auto_rotate {
            return;
        }
        let Some(id) = self.scene.object(PRIMARY_OBJECT).map(|o| o.mesh.transform) else {
            return;
        };
        let step = Vec3::new(animation.rotation_speed_x, animation.rotation_speed_y, 0.0)
            * animation.speed
            * dt;
        let transforms = self.scene.transforms_mut();
        let rotation = match transforms.get(id) {
            Ok(current) => current.rotation + Vec3::new(step.x.to_radians(), step.y.to_radians(), 0.0),
            Err(e) => {
                log::warn!("auto-rotation skipped: {e}");
                return;
            }
        };
        if let Err(e) = transforms.set_rotation_radians(id, rotation) {
            log::warn!("auto-rotation skipped: {e}");
        }
    }

    pub fn render(&self, program: &mut dyn ShaderProgram) -> Result<(), StateError> {
        self.scene
            .render(program, &self.camera.borrow(), &self.lighting)?;
        Ok(())
    }

    fn switch_geometry(&mut self, kind: GeometryKind) -> Result<(), StateError> {
        let geometry = self.library.get(kind)?;
        let object = self
            .scene
            .object_mut(PRIMARY_OBJECT)
            .ok_or_else(|| SceneError::UnknownObject(PRIMARY_OBJECT.to_string()))?;
        object.mesh.geometry = geometry;
        self.config.geometry = kind;
        log::info!("geometry switched to {kind}");
        Ok(())
    }

    /// Adds `kind` under a fresh name and returns that name.
    pub fn add_object(&mut self, kind: GeometryKind) -> Result<String, StateError> {
        let geometry = self.library.get(kind)?;
        let name = self.scene.unique_name(kind.slug());

        let mut rng = rand::rng();
        let position = Vec3::new(
            rng.random_range(-SCATTER_RADIUS..SCATTER_RADIUS),
            0.0,
            rng.random_range(-SCATTER_RADIUS..SCATTER_RADIUS),
        );
        self.scene
            .spawn(name.clone(), geometry, Transform::from_position(position))?;
        Ok(name)
    }

    fn set_camera_mode(&mut self, mode: CameraMode, router: &mut InputRouter) {
        if mode == self.camera_mode() {
            return;
        }

        match std::mem::replace(&mut self.controller, ActiveController::None) {
            ActiveController::None => {}
            ActiveController::FirstPerson(c) => c.borrow_mut().destroy(router),
            ActiveController::Orbit(c) => c.borrow_mut().destroy(router),
        }

        let controls = self.config.controls;
        self.controller = match mode {
            CameraMode::None => ActiveController::None,
            CameraMode::FirstPerson => {
                let controller = FirstPersonController::attach(self.camera.clone(), router);
                {
                    let mut c = controller.borrow_mut();
                    c.set_movement_speed(controls.movement_speed);
                    c.set_mouse_sensitivity(controls.mouse_sensitivity);
                }
                ActiveController::FirstPerson(controller)
            }
            CameraMode::Orbit => {
                let controller = OrbitController::attach(self.camera.clone(), Vec3::ZERO, router);
                controller.borrow_mut().set_sensitivity(controls.orbit_sensitivity);
                ActiveController::Orbit(controller)
            }
        };
        self.config.controls.camera_mode = mode;
        log::info!("camera mode: {mode:?}");
    }

    /// Validates the fallible parts first so a rejected config leaves the state unchanged.
    fn apply_config(
        &mut self,
        config: SceneConfig,
        router: &mut InputRouter,
    ) -> Result<(), StateError> {
        let lighting = config.lighting.to_lighting()?;
        let mut camera = self.camera.borrow().clone();
        config.camera.apply(&mut camera)?;
        self.library.get(config.geometry)?;

        self.lighting = lighting;
        *self.camera.borrow_mut() = camera;
        if config.geometry != self.config.geometry {
            self.switch_geometry(config.geometry)?;
        }

        if let Some(id) = self.scene.object(PRIMARY_OBJECT).map(|o| o.mesh.transform) {
            let transforms = self.scene.transforms_mut();
            transforms.set_position(id, config.object.position)?;
            transforms.set_scale(id, config.object.scale)?;
            if !config.animation.auto_rotate {
                transforms.set_rotation(id, config.object.rotation)?;
            }
        }

        let previous_mode = self.camera_mode();
        self.config = config;
        self.config.controls.camera_mode = previous_mode;
        self.set_camera_mode(config.controls.camera_mode, router);

        match &self.controller {
            ActiveController::None => {}
            ActiveController::FirstPerson(c) => {
                let mut c = c.borrow_mut();
                c.set_movement_speed(config.controls.movement_speed);
                c.set_mouse_sensitivity(config.controls.mouse_sensitivity);
            }
            ActiveController::Orbit(c) => {
                let mut c = c.borrow_mut();
                c.set_sensitivity(config.controls.orbit_sensitivity);
                c.set_distance(config.camera.distance);
            }
        }
        Ok(())
    }
}
