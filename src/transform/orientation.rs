// pickshot/src/transform/orientation.rs
use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

/// Rotation needed to bring the decoded pixels upright, derived from the
/// EXIF orientation tag. Mirrored orientations are not produced by
/// cameras and map to [`Orientation::Upright`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Upright,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// Maps the raw EXIF orientation tag value. Anything outside the
    /// three plain rotations, including absent or unknown values, means
    /// no rotation.
    pub fn from_exif_value(value: u32) -> Self {
        match value {
            3 => Orientation::Rotate180,
            6 => Orientation::Rotate90,
            8 => Orientation::Rotate270,
            _ => Orientation::Upright,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Orientation::Upright => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }
}

/// Reads the EXIF orientation from the encoded bytes. A missing or
/// unreadable tag is treated as upright, never as an error.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif_value)
            .unwrap_or(Orientation::Upright),
        Err(err) => {
            log::debug!("no usable EXIF orientation: {}", err);
            Orientation::Upright
        }
    }
}

/// Rotates the image clockwise by the given orientation.
pub fn apply(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Upright => image,
        Orientation::Rotate90 => image.rotate90(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate270 => image.rotate270(),
    }
}

/// Corrects the decoded image using the orientation embedded in the
/// original bytes.
pub fn correct(bytes: &[u8], image: DynamicImage) -> DynamicImage {
    let orientation = read_orientation(bytes);
    if orientation != Orientation::Upright {
        log::debug!("rotating image by {} degrees", orientation.degrees());
    }
    apply(image, orientation)
}
