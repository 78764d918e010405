//! Image preprocessing building blocks.

mod params;
mod standard;

pub use params::*;
pub use standard::*;

use crate::{common::*, depth::DepthImage};

/// Builds preprocessing transforms from the options in effect.
pub trait TransformFactory
where
    Self: Debug + Send + Sync,
{
    type Transform: ImageTransform;

    fn build(&self, options: &TransformOptions) -> Result<Self::Transform>;
}

/// A preprocessing transform that maps decoded images to normalized tensors.
///
/// The random decisions are sampled once into [AugmentParams], so that a
/// color image and its depth map can receive the same spatial augmentation.
pub trait ImageTransform {
    /// Sample the crop and flip decisions for an image of `size` (width, height).
    fn sample_params(&self, size: (u32, u32), rng: &mut dyn RngCore) -> AugmentParams;

    fn apply_rgb(&self, image: &RgbImage, params: &AugmentParams) -> Result<Tensor>;

    fn apply_depth(&self, depth: &DepthImage, params: &AugmentParams) -> Result<Tensor>;

    fn transform_rgb(&self, image: &RgbImage, rng: &mut dyn RngCore) -> Result<Tensor> {
        let params = self.sample_params(image.dimensions(), rng);
        self.apply_rgb(image, &params)
    }

    /// Transform a color image and its depth map with identical crop and flip.
    fn transform_dual(
        &self,
        image: &RgbImage,
        depth: &DepthImage,
        rng: &mut dyn RngCore,
    ) -> Result<(Tensor, Tensor)> {
        let params = self.sample_params(image.dimensions(), rng);
        let image = self.apply_rgb(image, &params)?;
        let depth = self.apply_depth(depth, &params)?;
        Ok((image, depth))
    }
}
