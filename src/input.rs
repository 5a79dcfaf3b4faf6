//! Platform-neutral input events and the listener registry controllers subscribe to.
//!
//! winit events are translated into [`InputEvent`]s by an [`InputTranslator`] and fanned
//! out by an [`InputRouter`]. Listeners subscribe to one or more [`InputChannel`]s and get
//! back a [`ListenerId`], which is all that is needed to unsubscribe again.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Raw relative motion, independent of the cursor position.
    PointerMotion { dx: f32, dy: f32 },
    PointerLockChanged(bool),
    MouseDown { x: f32, y: f32 },
    MouseMove { x: f32, y: f32 },
    MouseUp,
    MouseLeave,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputChannel {
    Keyboard,
    PointerMotion,
    PointerLock,
    /// Button presses, cursor moves and leaves inside the window.
    Drag,
}

impl InputEvent {
    pub fn channel(&self) -> InputChannel {
        match self {
            InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => InputChannel::Keyboard,
            InputEvent::PointerMotion { .. } => InputChannel::PointerMotion,
            InputEvent::PointerLockChanged(_) => InputChannel::PointerLock,
            InputEvent::MouseDown { .. }
            | InputEvent::MouseMove { .. }
            | InputEvent::MouseUp
            | InputEvent::MouseLeave => InputChannel::Drag,
        }
    }
}

pub trait InputListener {
    fn on_event(&mut self, event: &InputEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Subscription {
    id: ListenerId,
    channels: Vec<InputChannel>,
    listener: Rc<RefCell<dyn InputListener>>,
}

/// Routes events to subscribed listeners in subscription order.
#[derive(Default)]
pub struct InputRouter {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        channels: &[InputChannel],
        listener: Rc<RefCell<dyn InputListener>>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            channels: channels.to_vec(),
            listener,
        });
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn dispatch(&self, event: &InputEvent) {
        let channel = event.channel();
        for subscription in &self.subscriptions {
            if subscription.channels.contains(&channel) {
                subscription.listener.borrow_mut().on_event(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }
}

/// Turns winit events into [`InputEvent`]s, tracking the cursor for button events.
#[derive(Debug, Default)]
pub struct InputTranslator {
    cursor: Vec2,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn translate_window_event(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return None;
                };
                Some(match event.state {
                    ElementState::Pressed => InputEvent::KeyDown(key),
                    ElementState::Released => InputEvent::KeyUp(key),
                })
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(match state {
                ElementState::Pressed => InputEvent::MouseDown {
                    x: self.cursor.x,
                    y: self.cursor.y,
                },
                ElementState::Released => InputEvent::MouseUp,
            }),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InputEvent::MouseMove {
                    x: self.cursor.x,
                    y: self.cursor.y,
                })
            }
            WindowEvent::CursorLeft { .. } => Some(InputEvent::MouseLeave),
            _ => None,
        }
    }

    pub fn translate_device_event(&self, event: &DeviceEvent) -> Option<InputEvent> {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::PointerMotion {
                dx: *dx as f32,
                dy: *dy as f32,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<InputEvent>);

    impl InputListener for Log {
        fn on_event(&mut self, event: &InputEvent) {
            self.0.push(*event);
        }
    }

    #[test]
    fn dispatch_respects_channels() {
        let mut router = InputRouter::new();
        let keys = Rc::new(RefCell::new(Log::default()));
        let drag = Rc::new(RefCell::new(Log::default()));
        router.subscribe(&[InputChannel::Keyboard], keys.clone());
        router.subscribe(&[InputChannel::Drag, InputChannel::Keyboard], drag.clone());

        router.dispatch(&InputEvent::KeyDown(KeyCode::KeyW));
        router.dispatch(&InputEvent::MouseUp);
        router.dispatch(&InputEvent::PointerMotion { dx: 1.0, dy: 0.0 });

        assert_eq!(keys.borrow().0, vec![InputEvent::KeyDown(KeyCode::KeyW)]);
        assert_eq!(
            drag.borrow().0,
            vec![InputEvent::KeyDown(KeyCode::KeyW), InputEvent::MouseUp]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut router = InputRouter::new();
        let log = Rc::new(RefCell::new(Log::default()));
        let id = router.subscribe(&[InputChannel::PointerLock], log.clone());
        assert_eq!(router.listener_count(), 1);

        assert!(router.unsubscribe(id));
        assert!(!router.unsubscribe(id));
        assert_eq!(router.listener_count(), 0);

        router.dispatch(&InputEvent::PointerLockChanged(true));
        assert!(log.borrow().0.is_empty());
    }

    #[test]
    fn device_motion_becomes_pointer_motion() {
        let translator = InputTranslator::new();
        let event = DeviceEvent::MouseMotion { delta: (3.0, -2.0) };
        assert_eq!(
            translator.translate_device_event(&event),
            Some(InputEvent::PointerMotion { dx: 3.0, dy: -2.0 })
        );
    }

    #[test]
    fn channels_cover_every_event() {
        assert_eq!(InputEvent::KeyUp(KeyCode::Space).channel(), InputChannel::Keyboard);
        assert_eq!(InputEvent::MouseLeave.channel(), InputChannel::Drag);
        assert_eq!(
            InputEvent::MouseMove { x: 0.0, y: 0.0 }.channel(),
            InputChannel::Drag
        );
        assert_eq!(
            InputEvent::PointerLockChanged(false).channel(),
            InputChannel::PointerLock
        );
    }
}
