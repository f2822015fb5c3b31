// pickshot/src/transform/encoder.rs
use crate::core::{PickError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

/// Maximum quality: output fidelity is preferred over size for the byte
/// and file representations.
const JPEG_QUALITY: u8 = 100;

/// Encodes the processed picture into the lossy output format.
pub struct Encoder {
    quality: u8,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }

    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        image
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|err| PickError::Encode(err.to_string()))?;
        Ok(buffer.into_inner())
    }

    pub fn write(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|err| PickError::Encode(format!("{}: {}", path.display(), err)))?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
        image
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|err| PickError::Encode(err.to_string()))?;

        log::info!("saved picture to {}", path.display());
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use image::RgbImage;

    #[test]
    fn encoded_bytes_decode_back_to_the_same_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(50, 30));
        let bytes = Encoder::new().encode(&image).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 30));
    }

    #[test]
    fn write_overwrites_an_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jpg");
        std::fs::write(&path, b"stale").unwrap();

        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        Encoder::new().write(&image, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn write_to_a_missing_directory_fails_with_encode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.jpg");

        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let result = Encoder::new().write(&image, &path);
        assert!(matches!(result, Err(PickError::Encode(_))));
    }
}
