use crate::{common::*, config::Preprocess};

/// The size a [Preprocess::None] image is rounded to a multiple of.
pub const SIZE_BASE: u32 = 4;

/// The preprocessing options of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformOptions {
    pub preprocess: Preprocess,
    pub load_size: u32,
    pub crop_size: u32,
    pub no_flip: bool,
}

impl TransformOptions {
    /// Compute the size (width, height) of an image of `size` after resizing.
    pub fn resized_size(&self, size: (u32, u32)) -> (u32, u32) {
        let Self {
            preprocess,
            load_size,
            crop_size,
            ..
        } = *self;
        let (w, h) = size;

        match preprocess {
            Preprocess::ResizeAndCrop => (load_size, load_size),
            Preprocess::ScaleWidth | Preprocess::ScaleWidthAndCrop => {
                if w == load_size && h >= crop_size {
                    (w, h)
                } else {
                    let scaled_h = load_size as u64 * h as u64 / w.max(1) as u64;
                    let scaled_h = u32::try_from(scaled_h).unwrap_or(u32::MAX);
                    (load_size, scaled_h.max(crop_size))
                }
            }
            Preprocess::Crop => (w, h),
            Preprocess::None => (round_to_base(w), round_to_base(h)),
        }
    }
}

fn round_to_base(len: u32) -> u32 {
    let rounded = (len + SIZE_BASE / 2) / SIZE_BASE * SIZE_BASE;
    rounded.max(SIZE_BASE)
}

/// The random decisions of one preprocessing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AugmentParams {
    /// The (width, height) of the sampled image.
    pub source_size: (u32, u32),
    /// The (width, height) after resizing.
    pub resized_size: (u32, u32),
    /// The top-left (x, y) of the crop window in the resized image.
    pub crop_origin: (u32, u32),
    pub flip: bool,
}

impl AugmentParams {
    pub fn sample(options: &TransformOptions, size: (u32, u32), rng: &mut dyn RngCore) -> Self {
        let resized_size = options.resized_size(size);
        let (resized_w, resized_h) = resized_size;
        let crop_size = options.crop_size;

        let x = rng.gen_range(0..=resized_w.saturating_sub(crop_size));
        let y = rng.gen_range(0..=resized_h.saturating_sub(crop_size));
        let flip = rng.gen_bool(0.5);

        Self {
            source_size: size,
            resized_size,
            crop_origin: (x, y),
            flip: flip && !options.no_flip,
        }
    }

    /// The (x, y, width, height) window cropped from the resized image, if any.
    pub fn crop_window(&self, options: &TransformOptions) -> Option<(u32, u32, u32, u32)> {
        if !options.preprocess.crops() {
            return None;
        }

        let (resized_w, resized_h) = self.resized_size;
        let (x, y) = self.crop_origin;
        let crop_size = options.crop_size;

        if resized_w <= crop_size && resized_h <= crop_size {
            return None;
        }

        let crop_w = crop_size.min(resized_w - x);
        let crop_h = crop_size.min(resized_h - y);
        Some((x, y, crop_w, crop_h))
    }

    /// The (width, height) of the transformed output.
    pub fn output_size(&self, options: &TransformOptions) -> (u32, u32) {
        match self.crop_window(options) {
            Some((_, _, w, h)) => (w, h),
            None => self.resized_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(preprocess: Preprocess) -> TransformOptions {
        TransformOptions {
            preprocess,
            load_size: 286,
            crop_size: 256,
            no_flip: false,
        }
    }

    #[test]
    fn resized_size_per_mode() {
        assert_eq!(
            options(Preprocess::ResizeAndCrop).resized_size((640, 480)),
            (286, 286)
        );
        assert_eq!(
            options(Preprocess::ScaleWidth).resized_size((572, 400)),
            (286, 256)
        );
        assert_eq!(
            options(Preprocess::ScaleWidthAndCrop).resized_size((286, 600)),
            (286, 600)
        );
        assert_eq!(options(Preprocess::Crop).resized_size((300, 200)), (300, 200));
        assert_eq!(options(Preprocess::None).resized_size((301, 198)), (300, 200));
        assert_eq!(options(Preprocess::None).resized_size((1, 1)), (4, 4));
    }

    #[test]
    fn scaled_height_saturates() {
        let options = TransformOptions {
            load_size: u32::MAX,
            ..options(Preprocess::ScaleWidth)
        };
        assert_eq!(options.resized_size((1, 4)), (u32::MAX, u32::MAX));
    }

    #[test]
    fn crop_origin_stays_in_bounds() {
        let options = options(Preprocess::ResizeAndCrop);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let params = AugmentParams::sample(&options, (500, 300), &mut rng);
            let (x, y) = params.crop_origin;
            assert!(x <= 30 && y <= 30);
            assert_eq!(params.output_size(&options), (256, 256));
        }
    }

    #[test]
    fn no_flip_disables_flipping() {
        let options = TransformOptions {
            no_flip: true,
            ..options(Preprocess::ResizeAndCrop)
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!((0..100).all(|_| !AugmentParams::sample(&options, (64, 64), &mut rng).flip));
    }

    #[test]
    fn small_image_is_not_cropped() {
        let options = options(Preprocess::Crop);
        let mut rng = StdRng::seed_from_u64(1);
        let params = AugmentParams::sample(&options, (100, 80), &mut rng);

        assert_eq!(params.crop_origin, (0, 0));
        assert_eq!(params.crop_window(&options), None);
        assert_eq!(params.output_size(&options), (100, 80));
    }
}
