//! Depth map decoding.

use crate::common::*;

/// A single-channel depth map with values in `[0, 1]`.
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// The largest raw depth value, mapped to 1.0.
pub const DEPTH_MAX: f32 = u16::MAX as f32;

/// Map a raw 16-bit-range depth value into `[0, 1]`.
pub fn normalize_depth(raw: u16) -> f32 {
    raw as f32 / DEPTH_MAX
}

/// Decodes depth image files into [DepthImage].
///
/// The raw stored value of the first channel is divided by 65535 whatever
/// the bit depth of the file, so an 8-bit file is not stretched to the
/// 16-bit range.
#[derive(Debug, Clone, Default)]
pub struct DepthLoader;

impl DepthLoader {
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DepthImage> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("failed to decode depth file '{}'", path.display()))?;
        Ok(self.convert(image))
    }

    pub fn convert(&self, image: DynamicImage) -> DepthImage {
        let from_u8 = |value: u8| normalize_depth(value as u16);
        let from_f32 = |value: f32| value / DEPTH_MAX;

        match image {
            DynamicImage::ImageLuma8(buf) => first_channel(&buf, from_u8),
            DynamicImage::ImageLumaA8(buf) => first_channel(&buf, from_u8),
            DynamicImage::ImageRgb8(buf) => first_channel(&buf, from_u8),
            DynamicImage::ImageRgba8(buf) => first_channel(&buf, from_u8),
            DynamicImage::ImageLuma16(buf) => first_channel(&buf, normalize_depth),
            DynamicImage::ImageLumaA16(buf) => first_channel(&buf, normalize_depth),
            DynamicImage::ImageRgb16(buf) => first_channel(&buf, normalize_depth),
            DynamicImage::ImageRgba16(buf) => first_channel(&buf, normalize_depth),
            DynamicImage::ImageRgb32F(buf) => first_channel(&buf, from_f32),
            DynamicImage::ImageRgba32F(buf) => first_channel(&buf, from_f32),
            // formats added by later image releases
            other => first_channel(&other.into_rgba16(), normalize_depth),
        }
    }
}

/// Map the first channel of every pixel through `scale`.
fn first_channel<P, F>(buf: &ImageBuffer<P, Vec<P::Subpixel>>, scale: F) -> DepthImage
where
    P: Pixel,
    F: Fn(P::Subpixel) -> f32,
{
    DepthImage::from_fn(buf.width(), buf.height(), |x, y| {
        Luma([scale(buf.get_pixel(x, y).channels()[0])])
    })
}
