//! Demo scene: two spheres, a spinning cube and an OBJ model, all lit by the default
//! lights and explored with first-person controls.
//!
//! Usage: `vantage [TEXTURE] [MODEL]`. Missing assets are logged and skipped.

use anyhow::Context;
use vantage::{
    AppConfig, AssetData, CameraMode, Frame, GeometryKind, LoggingConfig, SceneConfig,
    SetupContext, TextureId, Transform, TransformId, Vec3, init_logging, run_with_config,
};

const DEFAULT_TEXTURE: &str = "assets/texture.png";
const DEFAULT_MODEL: &str = "assets/model.obj";

/// Objects that pick up the texture once it arrives.
const TEXTURED: [&str; 3] = ["sphere2", "cube", "hat"];

#[derive(Default)]
struct Demo {
    sphere2: Option<TransformId>,
    cube: Option<TransformId>,
    hat: Option<TransformId>,
    texture: Option<TextureId>,
    cube_rotation: f32,
    hat_rotation: f32,
}

impl Demo {
    fn receive(&mut self, frame: &mut Frame) {
        for asset in std::mem::take(&mut frame.loaded) {
            match asset.data {
                AssetData::Image(image) => match frame.upload_texture(&image, &asset.key) {
                    Ok(id) => {
                        self.texture = Some(id);
                        for name in TEXTURED {
                            if frame.state.scene().contains(name)
                                && let Err(e) = frame.state.scene_mut().set_texture(name, Some(id))
                            {
                                log::warn!("texture not applied to `{name}`: {e}");
                            }
                        }
                    }
                    Err(e) => log::warn!("texture `{}` not uploaded: {e}", asset.key),
                },
                AssetData::Model(geometry) => {
                    let id = match frame.upload_geometry(&geometry, &asset.key) {
                        Ok(id) => id,
                        Err(e) => {
                            log::warn!("model `{}` not uploaded: {e}", asset.key);
                            continue;
                        }
                    };
                    let transform = Transform::from_position(Vec3::new(0.0, -1.0, 0.0))
                        .uniform_scale(0.15);
                    match frame.state.scene_mut().spawn("hat", id, transform) {
                        Ok(hat) => {
                            self.hat = Some(hat);
                            if let Some(texture) = self.texture
                                && let Err(e) =
                                    frame.state.scene_mut().set_texture("hat", Some(texture))
                            {
                                log::warn!("texture not applied to `hat`: {e}");
                            }
                        }
                        Err(e) => log::warn!("model `{}` not added: {e}", asset.key),
                    }
                }
            }
        }
    }

    fn animate(&mut self, frame: &mut Frame) {
        self.cube_rotation += frame.dt;
        self.hat_rotation += 0.5 * frame.dt;

        let transforms = frame.state.scene_mut().transforms_mut();
        let spins = [
            (self.cube, Vec3::new(self.cube_rotation, self.cube_rotation, 0.0)),
            (self.sphere2, Vec3::new(0.0, self.cube_rotation, 0.0)),
            (self.hat, Vec3::new(0.0, self.hat_rotation, 0.0)),
        ];
        for (id, rotation) in spins {
            if let Some(id) = id
                && let Err(e) = transforms.set_rotation_radians(id, rotation)
            {
                log::warn!("animation skipped: {e}");
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let texture_path = args.next().unwrap_or_else(|| DEFAULT_TEXTURE.to_string());
    let model_path = args.next().unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut scene = SceneConfig::default();
    scene.controls.camera_mode = CameraMode::FirstPerson;
    scene.object.position = Vec3::new(0.0, 0.0, -4.0);

    let config = AppConfig::new()
        .title("Vantage")
        .clear_color(0.1, 0.1, 0.1, 1.0)
        .scene(scene);

    log::info!("click to look around, WASD to move, space/shift to fly");

    run_with_config(config, move |ctx: &mut SetupContext| {
        let sphere = ctx.state.library().get(GeometryKind::Sphere)?;
        let cube = ctx.state.library().get(GeometryKind::Cube)?;

        let mut demo = Demo::default();
        let scene = ctx.state.scene_mut();
        scene.spawn(
            "sphere1",
            sphere,
            Transform::from_position(Vec3::new(-3.0, 0.0, 0.0)),
        )?;
        demo.sphere2 = Some(scene.spawn(
            "sphere2",
            sphere,
            Transform::from_position(Vec3::new(3.0, 0.0, 0.0)),
        )?);
        demo.cube = Some(scene.spawn(
            "cube",
            cube,
            Transform::from_position(Vec3::new(0.0, 2.0, 0.0)),
        )?);

        ctx.loader.load_image("texture", &texture_path)?;
        ctx.loader.load_model("hat", &model_path)?;

        Ok(move |frame: &mut Frame| {
            demo.receive(frame);
            demo.animate(frame);
        })
    })
    .context("vantage exited with an error")
}
