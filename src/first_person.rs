//! WASD + mouse-look camera controller.
//!
//! Looking only happens while the pointer is locked. Movement keys are latched on
//! key down/up and applied in [`FirstPersonController::update`], which also re-aims the
//! camera along the current view direction.
//!
//! # Controls
//!
//! - **W/S**: Move forward/backward along the view direction
//! - **A/D**: Strafe left/right
//! - **Space**: Move up
//! - **Left Shift**: Move down
//! - **Mouse** (pointer locked): Look around

use std::cell::RefCell;
use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::camera::Camera;
use crate::input::{InputChannel, InputEvent, InputListener, InputRouter, ListenerId};

const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;
/// Distance of the look-at point in front of the camera.
const TARGET_DISTANCE: f32 = 10.0;

const MOVEMENT_KEYS: [KeyCode; 6] = [
    KeyCode::KeyW,
    KeyCode::KeyS,
    KeyCode::KeyA,
    KeyCode::KeyD,
    KeyCode::Space,
    KeyCode::ShiftLeft,
];

pub struct FirstPersonController {
    camera: Rc<RefCell<Camera>>,
    /// Horizontal angle in radians. 0 looks toward -Z.
    yaw: f32,
    /// Vertical angle in radians, positive looks up.
    pitch: f32,
    movement_speed: f32,
    mouse_sensitivity: f32,
    locked: bool,
    held: HashSet<KeyCode>,
    subscription: Option<ListenerId>,
}

impl FirstPersonController {
    fn new(camera: Rc<RefCell<Camera>>) -> Self {
        Self {
            camera,
            yaw: 0.0,
            pitch: 0.0,
            movement_speed: 5.0,
            mouse_sensitivity: 0.002,
            locked: false,
            held: HashSet::new(),
            subscription: None,
        }
    }

    /// Creates a controller driving `camera` and subscribes it to `router`.
    pub fn attach(camera: Rc<RefCell<Camera>>, router: &mut InputRouter) -> Rc<RefCell<Self>> {
        let controller = Rc::new(RefCell::new(Self::new(camera)));
        let id = router.subscribe(
            &[
                InputChannel::Keyboard,
                InputChannel::PointerMotion,
                InputChannel::PointerLock,
            ],
            controller.clone(),
        );
        controller.borrow_mut().subscription = Some(id);
        log::debug!("first-person controller attached");
        controller
    }

    /// Removes every listener this controller registered.
    pub fn destroy(&mut self, router: &mut InputRouter) {
        if let Some(id) = self.subscription.take() {
            router.unsubscribe(id);
            log::debug!("first-person controller detached");
        }
        self.held.clear();
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed;
    }

    pub fn set_mouse_sensitivity(&mut self, sensitivity: f32) {
        self.mouse_sensitivity = sensitivity;
    }

    fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    fn look(&mut self, dx: f32, dy: f32) {
        if !self.locked {
            return;
        }
        self.yaw -= dx * self.mouse_sensitivity;
        self.pitch = (self.pitch - dy * self.mouse_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Moves the camera by the held keys and points it along the view direction.
    pub fn update(&mut self, dt: f32) {
        let forward = self.forward();
        let right = self.right();

        let mut direction = Vec3::ZERO;
        if self.held.contains(&KeyCode::KeyW) {
            direction += forward;
        }
        if self.held.contains(&KeyCode::KeyS) {
            direction -= forward;
        }
        if self.held.contains(&KeyCode::KeyD) {
            direction += right;
        }
        if self.held.contains(&KeyCode::KeyA) {
            direction -= right;
        }
        if self.held.contains(&KeyCode::Space) {
            direction += Vec3::Y;
        }
        if self.held.contains(&KeyCode::ShiftLeft) {
            direction -= Vec3::Y;
        }

        let mut camera = self.camera.borrow_mut();
        let mut position = camera.position();
        if direction.length_squared() > 0.0 {
            position += direction.normalize() * self.movement_speed * dt;
            camera.set_position(position);
        }
        camera.set_target(position + forward * TARGET_DISTANCE);
    }
}

impl InputListener for FirstPersonController {
    fn on_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) if MOVEMENT_KEYS.contains(&key) => {
                self.held.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(&key);
            }
            InputEvent::PointerMotion { dx, dy } => self.look(dx, dy),
            InputEvent::PointerLockChanged(locked) => self.locked = locked,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Rc<RefCell<Camera>>, InputRouter, Rc<RefCell<FirstPersonController>>) {
        let camera = Rc::new(RefCell::new(Camera::new()));
        let mut router = InputRouter::new();
        let controller = FirstPersonController::attach(camera.clone(), &mut router);
        (camera, router, controller)
    }

    #[test]
    fn forward_moves_along_negative_z() {
        let (camera, router, controller) = setup();
        let start = camera.borrow().position();

        router.dispatch(&InputEvent::KeyDown(KeyCode::KeyW));
        controller.borrow_mut().update(1.0);

        let moved = camera.borrow().position() - start;
        assert!((moved - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5);
        assert!((camera.borrow().target() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);

        router.dispatch(&InputEvent::KeyUp(KeyCode::KeyW));
        controller.borrow_mut().update(1.0);
        assert!((camera.borrow().position() - Vec3::ZERO).length() < 1e-5);
    }

    #[test]
    fn diagonal_movement_is_normalised() {
        let (camera, router, controller) = setup();
        let start = camera.borrow().position();

        router.dispatch(&InputEvent::KeyDown(KeyCode::KeyW));
        router.dispatch(&InputEvent::KeyDown(KeyCode::KeyD));
        router.dispatch(&InputEvent::KeyDown(KeyCode::Space));
        controller.borrow_mut().update(0.5);

        let moved = camera.borrow().position() - start;
        assert!((moved.length() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn mouse_look_requires_pointer_lock() {
        let (_camera, router, controller) = setup();

        router.dispatch(&InputEvent::PointerMotion { dx: 100.0, dy: 0.0 });
        assert_eq!(controller.borrow().yaw(), 0.0);

        router.dispatch(&InputEvent::PointerLockChanged(true));
        assert!(controller.borrow().is_locked());
        router.dispatch(&InputEvent::PointerMotion { dx: 100.0, dy: 0.0 });
        assert!((controller.borrow().yaw() + 0.2).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let (_camera, router, controller) = setup();
        router.dispatch(&InputEvent::PointerLockChanged(true));
        router.dispatch(&InputEvent::PointerMotion { dx: 0.0, dy: -10_000.0 });
        assert!((controller.borrow().pitch() - MAX_PITCH).abs() < 1e-6);
        router.dispatch(&InputEvent::PointerMotion { dx: 0.0, dy: 20_000.0 });
        assert!((controller.borrow().pitch() + MAX_PITCH).abs() < 1e-6);
    }

    #[test]
    fn settings_apply() {
        let (camera, router, controller) = setup();
        controller.borrow_mut().set_movement_speed(2.0);
        router.dispatch(&InputEvent::KeyDown(KeyCode::ShiftLeft));
        controller.borrow_mut().update(1.0);
        assert!((camera.borrow().position().y + 2.0).abs() < 1e-5);
    }

    #[test]
    fn destroy_removes_listeners() {
        let (_camera, mut router, controller) = setup();
        assert_eq!(router.listener_count(), 1);
        controller.borrow_mut().destroy(&mut router);
        assert_eq!(router.listener_count(), 0);
    }
}
