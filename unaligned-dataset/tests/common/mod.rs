#![allow(dead_code)]

use anyhow::Result;
use image::{ImageBuffer, Luma, Rgb, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tch::{kind::FLOAT_CPU, Tensor};
use tempfile::TempDir;
use unaligned_dataset::{
    depth::DepthImage,
    transform::{AugmentParams, ImageTransform, TransformFactory, TransformOptions},
};

/// A temporary dataroot populated with generated images.
#[derive(Debug)]
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn mkdir(&self, split: &str) -> PathBuf {
        let dir = self.root().join(split);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write `count` RGB images whose red channel holds the image index.
    pub fn add_rgb(&self, split: &str, count: usize, size: (u32, u32)) -> Vec<PathBuf> {
        let dir = self.mkdir(split);
        let (w, h) = size;

        (0..count)
            .map(|index| {
                let path = dir.join(format!("{:03}.png", index));
                RgbImage::from_pixel(w, h, Rgb([index as u8, 64, 128]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    /// Write `count` 16-bit depth maps filled with `raw(index)`.
    pub fn add_depth(
        &self,
        count: usize,
        size: (u32, u32),
        raw: impl Fn(usize) -> u16,
    ) -> Vec<PathBuf> {
        let dir = self.mkdir("depthA");
        let (w, h) = size;

        (0..count)
            .map(|index| {
                let path = dir.join(format!("{:03}.png", index));
                ImageBuffer::<Luma<u16>, Vec<u16>>::from_pixel(w, h, Luma([raw(index)]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }
}

/// One call observed by [RecordingFactory].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Build(TransformOptions),
    Rgb {
        size: (u32, u32),
        params: AugmentParams,
    },
    Depth {
        size: (u32, u32),
        params: AugmentParams,
    },
}

/// A transform factory that records every build and application.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    pub log: Arc<Mutex<Vec<Record>>>,
}

impl RecordingFactory {
    pub fn records(&self) -> Vec<Record> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl TransformFactory for RecordingFactory {
    type Transform = RecordingTransform;

    fn build(&self, options: &TransformOptions) -> Result<Self::Transform> {
        self.log.lock().unwrap().push(Record::Build(*options));
        Ok(RecordingTransform {
            options: *options,
            log: self.log.clone(),
        })
    }
}

#[derive(Debug)]
pub struct RecordingTransform {
    options: TransformOptions,
    log: Arc<Mutex<Vec<Record>>>,
}

impl ImageTransform for RecordingTransform {
    fn sample_params(&self, size: (u32, u32), rng: &mut dyn rand::RngCore) -> AugmentParams {
        AugmentParams::sample(&self.options, size, rng)
    }

    fn apply_rgb(&self, image: &RgbImage, params: &AugmentParams) -> Result<Tensor> {
        self.log.lock().unwrap().push(Record::Rgb {
            size: image.dimensions(),
            params: *params,
        });
        Ok(Tensor::zeros(&[3, 4, 4], FLOAT_CPU))
    }

    fn apply_depth(&self, depth: &DepthImage, params: &AugmentParams) -> Result<Tensor> {
        self.log.lock().unwrap().push(Record::Depth {
            size: depth.dimensions(),
            params: *params,
        });
        Ok(Tensor::zeros(&[1, 4, 4], FLOAT_CPU))
    }
}
