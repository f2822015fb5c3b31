// pickshot/src/transform/mod.rs
mod decoder;
mod encoder;
mod orientation;
mod scaler;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use orientation::Orientation;
pub use scaler::Scaler;

use crate::core::{Result, ScalePolicy};
use image::DynamicImage;

/// The pure image pipeline: two-pass subsampled decode, EXIF orientation
/// correction, then the policy-specific crop or stretch.
///
/// Operates on an in-memory byte slice only; no host object is needed.
pub struct TransformEngine {
    scaler: Scaler,
}

impl TransformEngine {
    pub fn new(policy: ScalePolicy, target_size: u32) -> Self {
        Self {
            scaler: Scaler::new(policy, target_size),
        }
    }

    pub fn process(&self, bytes: &[u8]) -> Result<DynamicImage> {
        // Pass 1: encoded dimensions only, no pixel buffer.
        let (width, height) = Decoder::read_dimensions(bytes)?;
        let factor = self.scaler.sample_factor(width, height);

        log::debug!(
            "transforming {}x{} image, subsample factor {}",
            width,
            height,
            factor
        );

        // Pass 2: full decode bounded by the subsampling factor.
        let decoded = Decoder::decode_subsampled(bytes, factor)?;

        let upright = orientation::correct(bytes, decoded);

        Ok(self.scaler.finish(upright))
    }
}
