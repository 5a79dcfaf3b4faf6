//! Windowed runtime: event loop, per-frame update and rendering.
//!
//! [`run_with_config`] opens a window, creates the GPU context and renderer, uploads the
//! built-in geometry library and builds an [`AppState`]. The setup closure runs once to
//! populate the scene and returns a frame closure that runs every frame before drawing.
//!
//! Built-in controls:
//! - `1`..`5` switch the primary object's geometry
//! - `C` cycles the camera mode (none, first-person, orbit)
//! - `P` toggles perspective and orthographic projection
//! - `N` adds an object of the current geometry, `Backspace` removes the newest one
//! - click locks the pointer in first-person mode, `Escape` releases it

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::assets::{AssetError, AssetLoader, LoadedAsset};
use crate::camera::ProjectionMode;
use crate::config::{CameraMode, SceneConfig};
use crate::geometry::{GeometryData, GeometryError};
use crate::gpu::{GpuContext, RenderError};
use crate::input::{InputEvent, InputRouter, InputTranslator};
use crate::mesh::{GeometryId, TextureId};
use crate::mesh_pass::{MeshFrame, MeshPass};
use crate::primitives::GeometryKind;
use crate::renderer::Renderer;
use crate::scene::SceneError;
use crate::state::{AppState, Command, GeometryLibrary, StateError};
use crate::texture::{Texture, TextureError, TextureOptions};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Window and startup settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub scene: SceneConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vantage".to_string(),
            width: 1280,
            height: 720,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            scene: SceneConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.clear_color = [r, g, b, a];
        self
    }

    pub fn scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }
}

fn upload_geometry(
    gpu: &GpuContext,
    mesh_pass: &mut MeshPass,
    geometry: &GeometryData,
    label: &str,
) -> Result<GeometryId, RenderError> {
    mesh_pass.upload_geometry(gpu, geometry, label)
}

fn upload_texture(
    gpu: &GpuContext,
    mesh_pass: &mut MeshPass,
    image: &RgbaImage,
    label: &str,
) -> Result<TextureId, TextureError> {
    let (width, height) = image.dimensions();
    let texture = Texture::from_rgba(gpu, image, width, height, label, TextureOptions::default())?;
    Ok(mesh_pass.add_texture(gpu, texture))
}

/// Context handed to the setup closure.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    pub state: &'a mut AppState,
    pub renderer: &'a mut Renderer,
    pub loader: &'a mut AssetLoader,
    mesh_pass: &'a mut MeshPass,
}

impl SetupContext<'_> {
    pub fn upload_geometry(
        &mut self,
        geometry: &GeometryData,
        label: &str,
    ) -> Result<GeometryId, RenderError> {
        upload_geometry(self.gpu, self.mesh_pass, geometry, label)
    }

    pub fn upload_texture(
        &mut self,
        image: &RgbaImage,
        label: &str,
    ) -> Result<TextureId, TextureError> {
        upload_texture(self.gpu, self.mesh_pass, image, label)
    }
}

/// Per-frame context handed to the frame closure, after the state has been updated.
pub struct Frame<'a> {
    pub gpu: &'a GpuContext,
    pub state: &'a mut AppState,
    pub renderer: &'a mut Renderer,
    /// Assets that finished loading since the previous frame.
    pub loaded: Vec<LoadedAsset>,
    /// Seconds since startup.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    mesh_pass: &'a mut MeshPass,
    router: &'a mut InputRouter,
}

impl Frame<'_> {
    pub fn upload_geometry(
        &mut self,
        geometry: &GeometryData,
        label: &str,
    ) -> Result<GeometryId, RenderError> {
        upload_geometry(self.gpu, self.mesh_pass, geometry, label)
    }

    pub fn upload_texture(
        &mut self,
        image: &RgbaImage,
        label: &str,
    ) -> Result<TextureId, TextureError> {
        upload_texture(self.gpu, self.mesh_pass, image, label)
    }

    pub fn apply(&mut self, command: Command) -> Result<(), StateError> {
        self.state.apply(command, self.router)
    }
}

type FrameFn = Box<dyn FnMut(&mut Frame)>;
type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<FrameFn, AppError>>;

/// Runs the application with default settings.
pub fn run<S, F>(setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, AppError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Runs the application until the window closes or a fatal error occurs.
///
/// # Example
/// ```ignore
/// vantage::run_with_config(AppConfig::new().title("Scene"), |ctx| {
///     ctx.state.add_object(GeometryKind::Sphere)?;
///     Ok(move |frame: &mut Frame| {})
/// })?;
/// ```
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, AppError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = VantageApp::Pending {
        config,
        setup: Some(Box::new(move |ctx: &mut SetupContext| {
            let frame_fn = setup(ctx)?;
            Ok(Box::new(frame_fn) as FrameFn)
        })),
    };

    event_loop.run_app(&mut app)?;

    match app {
        VantageApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    mesh_pass: MeshPass,
    renderer: Renderer,
    router: InputRouter,
    translator: InputTranslator,
    loader: AssetLoader,
    state: AppState,
    frame_fn: FrameFn,
    added: Vec<String>,
    pointer_locked: bool,
    start_time: Instant,
    last_frame: Instant,
}

enum VantageApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    Failed(AppError),
}

impl VantageApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        *self = VantageApp::Failed(error);
        event_loop.exit();
    }
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        setup: SetupFn,
    ) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let mut mesh_pass = MeshPass::new(&gpu)?;

        let mut renderer = Renderer::new();
        let [r, g, b, a] = config.clear_color;
        renderer.set_clear_color(r, g, b, a);

        let mut library = GeometryLibrary::new();
        for kind in GeometryKind::ALL {
            let id = mesh_pass.upload_geometry(&gpu, &kind.build()?, kind.label())?;
            library.insert(kind, id);
        }

        let mut router = InputRouter::new();
        let mut state = AppState::new(config.scene, library, &mut router)?;
        state
            .camera()
            .borrow_mut()
            .set_aspect(renderer.aspect_ratio(&gpu))
            .map_err(StateError::from)?;

        let mut loader = AssetLoader::new();
        let frame_fn = setup(&mut SetupContext {
            gpu: &gpu,
            state: &mut state,
            renderer: &mut renderer,
            loader: &mut loader,
            mesh_pass: &mut mesh_pass,
        })?;

        log::info!(
            "started {}x{} with {} objects",
            gpu.width(),
            gpu.height(),
            state.scene().len()
        );

        Ok(Self {
            window,
            gpu,
            mesh_pass,
            renderer,
            router,
            translator: InputTranslator::new(),
            loader,
            state,
            frame_fn,
            added: Vec::new(),
            pointer_locked: false,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), AppError> {
        self.gpu.resize(width, height);
        if width > 0 && height > 0 {
            self.state
                .camera()
                .borrow_mut()
                .set_aspect(self.renderer.aspect_ratio(&self.gpu))
                .map_err(StateError::from)?;
        }
        Ok(())
    }

    fn set_pointer_lock(&mut self, locked: bool) {
        if locked == self.pointer_locked {
            return;
        }
        if locked {
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("pointer lock unavailable: {e}");
                return;
            }
        } else if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("failed to release pointer: {e}");
        }
        self.window.set_cursor_visible(!locked);
        self.pointer_locked = locked;
        self.router.dispatch(&InputEvent::PointerLockChanged(locked));
    }

    fn handle_shortcut(&mut self, key: KeyCode) -> Result<(), StateError> {
        let command = match key {
            KeyCode::Digit1 => Command::SwitchGeometry(GeometryKind::ALL[0]),
            KeyCode::Digit2 => Command::SwitchGeometry(GeometryKind::ALL[1]),
            KeyCode::Digit3 => Command::SwitchGeometry(GeometryKind::ALL[2]),
            KeyCode::Digit4 => Command::SwitchGeometry(GeometryKind::ALL[3]),
            KeyCode::Digit5 => Command::SwitchGeometry(GeometryKind::ALL[4]),
            KeyCode::KeyC => {
                let next = match self.state.camera_mode() {
                    CameraMode::None => CameraMode::FirstPerson,
                    CameraMode::FirstPerson => CameraMode::Orbit,
                    CameraMode::Orbit => CameraMode::None,
                };
                if next != CameraMode::FirstPerson {
                    self.set_pointer_lock(false);
                }
                Command::SetCameraMode(next)
            }
            KeyCode::KeyP => {
                let next = match self.state.camera().borrow().projection_mode() {
                    ProjectionMode::Perspective => ProjectionMode::Orthographic,
                    ProjectionMode::Orthographic => ProjectionMode::Perspective,
                };
                Command::SetProjectionMode(next)
            }
            KeyCode::KeyN => {
                let name = self.state.add_object(self.state.config().geometry)?;
                self.added.push(name);
                return Ok(());
            }
            KeyCode::Backspace => match self.added.pop() {
                Some(name) => Command::RemoveObject(name),
                None => return Ok(()),
            },
            KeyCode::Escape => {
                self.set_pointer_lock(false);
                return Ok(());
            }
            _ => return Ok(()),
        };
        self.state.apply(command, &mut self.router)
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if let Err(e) = self.handle_shortcut(key) {
                    log::warn!("{key:?} ignored: {e}");
                }
            }
            InputEvent::MouseDown { .. } if self.state.camera_mode() == CameraMode::FirstPerson => {
                self.set_pointer_lock(true);
            }
            _ => {}
        }
        self.router.dispatch(&event);
    }

    fn redraw(&mut self) -> Result<(), AppError> {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.state.update(dt);

        let mut frame = Frame {
            gpu: &self.gpu,
            state: &mut self.state,
            renderer: &mut self.renderer,
            loaded: self.loader.poll(),
            time,
            dt,
            mesh_pass: &mut self.mesh_pass,
            router: &mut self.router,
        };
        (self.frame_fn)(&mut frame);

        let mut mesh_frame = MeshFrame::new();
        self.state.render(&mut mesh_frame)?;
        self.renderer
            .render(&self.gpu, &mut self.mesh_pass, &mesh_frame)?;

        self.window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for VantageApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let VantageApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };
        match Running::start(event_loop, config, setup) {
            Ok(running) => {
                running.window.request_redraw();
                *self = VantageApp::Running(Box::new(running));
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let VantageApp::Running(app) = self else {
            return;
        };

        if let Some(input) = app.translator.translate_window_event(&event) {
            app.handle_input(input);
        }

        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => app.resize(size.width, size.height),
            WindowEvent::Focused(false) => {
                app.set_pointer_lock(false);
                Ok(())
            }
            WindowEvent::RedrawRequested => app.redraw(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let VantageApp::Running(app) = self else {
            return;
        };
        if let Some(input) = app.translator.translate_device_event(&event) {
            app.router.dispatch(&input);
        }
    }
}
