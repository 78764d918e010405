//! The resize, crop and flip transform of the translation pipeline.

use super::*;
use crate::{common::*, decode, depth::DepthImage};

/// Builds [StandardTransform].
#[derive(Debug, Clone, Default)]
pub struct StandardTransformFactory;

impl TransformFactory for StandardTransformFactory {
    type Transform = StandardTransform;

    fn build(&self, options: &TransformOptions) -> Result<Self::Transform> {
        ensure!(options.load_size > 0, "load_size must be positive");
        ensure!(options.crop_size > 0, "crop_size must be positive");
        Ok(StandardTransform { options: *options })
    }
}

/// Resizes, crops and flips images, then converts them to tensors.
///
/// Color images become `[3, H, W]` float tensors in `[-1, 1]`. Depth maps
/// become `[1, H, W]` float tensors and keep their `[0, 1]` range.
#[derive(Debug, Clone)]
pub struct StandardTransform {
    options: TransformOptions,
}

impl StandardTransform {
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    fn augment<P>(
        &self,
        image: &ImageBuffer<P, Vec<P::Subpixel>>,
        params: &AugmentParams,
        filter: FilterType,
    ) -> ImageBuffer<P, Vec<P::Subpixel>>
    where
        P: image::Pixel + 'static,
        P::Subpixel: 'static,
    {
        let (resized_w, resized_h) = params.resized_size;

        let image = if image.dimensions() == (resized_w, resized_h) {
            image.clone()
        } else {
            image::imageops::resize(image, resized_w, resized_h, filter)
        };

        let image = match params.crop_window(&self.options) {
            Some((x, y, w, h)) => image::imageops::crop_imm(&image, x, y, w, h).to_image(),
            None => image,
        };

        if params.flip {
            image::imageops::flip_horizontal(&image)
        } else {
            image
        }
    }
}

impl ImageTransform for StandardTransform {
    fn sample_params(&self, size: (u32, u32), rng: &mut dyn RngCore) -> AugmentParams {
        AugmentParams::sample(&self.options, size, rng)
    }

    fn apply_rgb(&self, image: &RgbImage, params: &AugmentParams) -> Result<Tensor> {
        let image = self.augment(image, params, FilterType::CatmullRom);
        decode::rgb_to_tensor(&image)
    }

    fn apply_depth(&self, depth: &DepthImage, params: &AugmentParams) -> Result<Tensor> {
        // bring the depth map onto the grid of the color image first
        let (source_w, source_h) = params.source_size;
        let aligned;
        let depth = if depth.dimensions() == params.source_size {
            depth
        } else {
            aligned = image::imageops::resize(depth, source_w, source_h, FilterType::Nearest);
            &aligned
        };

        let depth = self.augment(depth, params, FilterType::Nearest);
        decode::depth_to_tensor(&depth)
    }
}
