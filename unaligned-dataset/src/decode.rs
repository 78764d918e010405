//! Image decoding and image-to-tensor conversion.

use crate::{common::*, depth::DepthImage};

/// Decode an image file into 3-channel RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let image = image::open(path)
        .with_context(|| format!("failed to decode image file '{}'", path.display()))?;
    Ok(image.to_rgb8())
}

/// Convert an RGB image to a `[3, H, W]` float tensor normalized to `[-1, 1]`.
pub fn rgb_to_tensor(image: &RgbImage) -> Result<Tensor> {
    let (w, h) = image.dimensions();

    let tensor = tch::no_grad(|| -> Result<_> {
        let tensor = Tensor::of_slice(image.as_raw())
            .f_view([h as i64, w as i64, 3])?
            .f_permute(&[2, 0, 1])?
            .f_to_kind(Kind::Float)?;
        let tensor = (tensor / 255.0 - 0.5) / 0.5;
        Ok(tensor.set_requires_grad(false))
    })?;

    Ok(tensor)
}

/// Convert a depth map to a `[1, H, W]` float tensor.
pub fn depth_to_tensor(depth: &DepthImage) -> Result<Tensor> {
    let (w, h) = depth.dimensions();

    let tensor = tch::no_grad(|| -> Result<_> {
        let tensor = Tensor::of_slice(depth.as_raw()).f_view([1, h as i64, w as i64])?;
        Ok(tensor.set_requires_grad(false))
    })?;

    Ok(tensor)
}
