// pickshot/src/transform/scaler.rs
use crate::core::ScalePolicy;
use image::imageops::FilterType;
use image::DynamicImage;

/// Computes the integer subsampling factor before the costly full decode
/// and performs the remaining exact-size adjustment afterwards.
///
/// A target size of 0 always means "no resizing", whatever the policy.
pub struct Scaler {
    policy: ScalePolicy,
    target_size: u32,
}

impl Scaler {
    pub fn new(policy: ScalePolicy, target_size: u32) -> Self {
        Self {
            policy,
            target_size,
        }
    }

    /// Subsampling factor for an image of the given encoded dimensions.
    /// Always a positive integer.
    pub fn sample_factor(&self, width: u32, height: u32) -> u32 {
        if self.target_size == 0 || width == 0 || height == 0 {
            return 1;
        }

        let bigger = width.max(height);
        let smaller = width.min(height);

        let factor = match self.policy {
            // Plain integer division: the result may slightly exceed the
            // target on the shorter side, which is accepted.
            ScalePolicy::KeepRatio => bigger / self.target_size,
            ScalePolicy::Crop => smaller.div_ceil(self.target_size),
            ScalePolicy::StretchXy => bigger.div_ceil(self.target_size),
        };

        factor.max(1)
    }

    /// Exact-size adjustment after decode and orientation correction.
    pub fn finish(&self, image: DynamicImage) -> DynamicImage {
        if self.target_size == 0 {
            return image;
        }

        match self.policy {
            ScalePolicy::KeepRatio => image,
            ScalePolicy::Crop => center_crop_square(image),
            ScalePolicy::StretchXy => {
                image.resize_exact(self.target_size, self.target_size, FilterType::Triangle)
            }
        }
    }
}

/// Center-crops a square whose side is the shorter dimension, offset to
/// center along whichever axis is longer.
fn center_crop_square(image: DynamicImage) -> DynamicImage {
    let width = image.width();
    let height = image.height();

    if width == height {
        return image;
    }

    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;

    log::debug!("center-cropping {}x{} to {}x{} at ({}, {})", width, height, side, side, x, y);

    image.crop_imm(x, y, side, side)
}
