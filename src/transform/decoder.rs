// pickshot/src/transform/decoder.rs
use crate::core::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Two-pass decoder: a cheap bounds-only pass followed by a full decode
/// downsampled by an integer factor, keeping peak memory bounded.
pub struct Decoder;

impl Decoder {
    /// Reads only the encoded dimensions; no pixel buffer is allocated.
    pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let (width, height) = reader.into_dimensions()?;
        Ok((width, height))
    }

    /// Decodes the full image and reduces it by the given integer
    /// subsampling factor. A factor of 1 leaves the decoded size as is.
    pub fn decode_subsampled(bytes: &[u8], factor: u32) -> Result<DynamicImage> {
        let image = image::load_from_memory(bytes)?;

        if factor <= 1 {
            return Ok(image);
        }

        let width = (image.width() / factor).max(1);
        let height = (image.height() / factor).max(1);

        log::debug!(
            "subsampling {}x{} by {} to {}x{}",
            image.width(),
            image.height(),
            factor,
            width,
            height
        );

        Ok(image.resize_exact(width, height, FilterType::Triangle))
    }
}
