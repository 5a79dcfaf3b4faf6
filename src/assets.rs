//! Background asset loading.
//!
//! Decoding images and parsing OBJ files happens on worker threads. Results come back over
//! a channel and are collected on the main thread with [`AssetLoader::poll`], which is
//! where GPU uploads and scene changes belong.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use image::RgbaImage;
use thiserror::Error;

use crate::geometry::GeometryData;
use crate::obj::{self, ObjError};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to load model {path}: {source}")]
    Model { path: PathBuf, source: ObjError },
    #[error("failed to start loader thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Decoded asset data, ready for upload.
#[derive(Debug)]
pub enum AssetData {
    Image(RgbaImage),
    Model(GeometryData),
}

/// A finished load, tagged with the key it was requested under.
#[derive(Debug)]
pub struct LoadedAsset {
    pub key: String,
    pub data: AssetData,
}

type Completion = (String, Result<AssetData, AssetError>);

pub struct AssetLoader {
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    in_flight: usize,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Decodes an image file to RGBA8 in the background.
    pub fn load_image(
        &mut self,
        key: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), AssetError> {
        let path = path.as_ref().to_path_buf();
        self.spawn(key.into(), move || {
            image::open(&path)
                .map(|img| AssetData::Image(img.to_rgba8()))
                .map_err(|source| AssetError::Image { path, source })
        })
    }

    /// Parses an OBJ file in the background.
    pub fn load_model(
        &mut self,
        key: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), AssetError> {
        let path = path.as_ref().to_path_buf();
        self.spawn(key.into(), move || {
            obj::load(&path)
                .map(AssetData::Model)
                .map_err(|source| AssetError::Model { path, source })
        })
    }

    fn spawn<F>(&mut self, key: String, load: F) -> Result<(), AssetError>
    where
        F: FnOnce() -> Result<AssetData, AssetError> + Send + 'static,
    {
        let sender = self.sender.clone();
        log::debug!("loading asset `{key}`");
        std::thread::Builder::new()
            .name(format!("asset-{key}"))
            .spawn(move || {
                let result = load();
                // the loader was dropped, nobody is waiting for this result
                let _ = sender.send((key, result));
            })?;
        self.in_flight += 1;
        Ok(())
    }

    /// Collects every load that finished since the last call. Failures are logged and
    /// dropped.
    pub fn poll(&mut self) -> Vec<LoadedAsset> {
        let mut loaded = Vec::new();
        while let Ok((key, result)) = self.receiver.try_recv() {
            self.in_flight -= 1;
            match result {
                Ok(data) => {
                    log::debug!("asset `{key}` ready");
                    loaded.push(LoadedAsset { key, data });
                }
                Err(e) => log::warn!("asset `{key}` failed: {e}"),
            }
        }
        loaded
    }

    /// Number of loads still running or not yet polled.
    pub fn pending(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn drain(loader: &mut AssetLoader) -> Vec<LoadedAsset> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut loaded = Vec::new();
        while loader.pending() > 0 && Instant::now() < deadline {
            loaded.extend(loader.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        loaded
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vantage-{}-{name}", std::process::id()))
    }

    #[test]
    fn model_loads_in_background() {
        let path = temp_path("triangle.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut loader = AssetLoader::new();
        loader.load_model("triangle", &path).unwrap();
        assert_eq!(loader.pending(), 1);

        let loaded = drain(&mut loader);
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].key, "triangle");
        match &loaded[0].data {
            AssetData::Model(geometry) => {
                assert_eq!(geometry.vertex_count(), 3);
                assert_eq!(geometry.indices(), &[0, 1, 2]);
            }
            other => panic!("expected a model, got {other:?}"),
        }
    }

    #[test]
    fn image_loads_in_background() {
        let path = temp_path("pixel.png");
        RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut loader = AssetLoader::new();
        loader.load_image("pixel", &path).unwrap();
        let loaded = drain(&mut loader);
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        match &loaded[0].data {
            AssetData::Image(img) => {
                assert_eq!(img.dimensions(), (2, 2));
                assert_eq!(img.get_pixel(1, 1).0, [10, 20, 30, 255]);
            }
            other => panic!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn missing_files_are_dropped() {
        let mut loader = AssetLoader::new();
        loader.load_model("hat", temp_path("missing.obj")).unwrap();
        loader.load_image("tex", temp_path("missing.png")).unwrap();

        assert!(drain(&mut loader).is_empty());
        assert_eq!(loader.pending(), 0);
    }
}
