//! Mouse-drag camera controller that orbits a target point.
//!
//! Distance and angles are taken from the camera's position when the controller is
//! attached. Dragging updates the angles and repositions the camera immediately; distance
//! and target changes are held until the next drag move.

use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::input::{InputChannel, InputEvent, InputListener, InputRouter, ListenerId};

const MAX_ELEVATION: f32 = FRAC_PI_2 - 0.1;

pub struct OrbitController {
    camera: Rc<RefCell<Camera>>,
    target: Vec3,
    distance: f32,
    /// Horizontal angle in radians around +Y, 0 on the +Z side of the target.
    azimuth: f32,
    /// Vertical angle in radians above the target's horizontal plane.
    elevation: f32,
    sensitivity: f32,
    /// Last cursor position while a drag is in progress.
    drag: Option<Vec2>,
    subscription: Option<ListenerId>,
}

impl OrbitController {
    fn new(camera: Rc<RefCell<Camera>>, target: Vec3) -> Self {
        let offset = camera.borrow().position() - target;
        let horizontal = Vec2::new(offset.x, offset.z).length();
        Self {
            camera,
            target,
            distance: offset.length(),
            azimuth: offset.x.atan2(offset.z),
            elevation: offset.y.atan2(horizontal),
            sensitivity: 0.005,
            drag: None,
            subscription: None,
        }
    }

    /// Creates a controller orbiting `target` and subscribes it to `router`.
    pub fn attach(
        camera: Rc<RefCell<Camera>>,
        target: Vec3,
        router: &mut InputRouter,
    ) -> Rc<RefCell<Self>> {
        let controller = Rc::new(RefCell::new(Self::new(camera, target)));
        let id = router.subscribe(&[InputChannel::Drag], controller.clone());
        controller.borrow_mut().subscription = Some(id);
        log::debug!("orbit controller attached");
        controller
    }

    /// Removes every listener this controller registered.
    pub fn destroy(&mut self, router: &mut InputRouter) {
        if let Some(id) = self.subscription.take() {
            router.unsubscribe(id);
            log::debug!("orbit controller detached");
        }
        self.drag = None;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Takes effect on the next drag move; the camera is not moved here.
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    fn drag_to(&mut self, cursor: Vec2) {
        let Some(last) = self.drag else {
            return;
        };
        let delta = cursor - last;
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation =
            (self.elevation + delta.y * self.sensitivity).clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.drag = Some(cursor);
        self.update_camera();
    }

    fn update_camera(&self) {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let offset = Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az) * self.distance;

        let mut camera = self.camera.borrow_mut();
        camera.set_position(self.target + offset);
        camera.set_target(self.target);
    }
}

impl InputListener for OrbitController {
    fn on_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::MouseDown { x, y } => self.drag = Some(Vec2::new(x, y)),
            InputEvent::MouseMove { x, y } => self.drag_to(Vec2::new(x, y)),
            InputEvent::MouseUp | InputEvent::MouseLeave => self.drag = None,
            _ => {}
        }
    }
}
