//! Pure Rust image backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` (pure Rust decoders) |
//! | Orientation | EXIF tag via `kamadak-exif`, applied with `rotate*`/`flip*` |
//! | EXIF metadata | [`exif_reader`](super::exif_reader) (`kamadak-exif`) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::backend::{BackendError, ImageBackend};
use super::exif_reader;
use super::params::Quality;
use crate::metadata::MetadataRecord;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat, RgbImage, RgbaImage};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotate/flip so the image is displayed upright.
///
/// Codes outside 2–8 (including the normal `1`) leave the image untouched.
pub fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let img = match exif_reader::read_orientation(bytes) {
            Some(o) if o != 1 => {
                debug!(orientation = o, "applying EXIF orientation");
                apply_orientation(img, o)
            }
            _ => img,
        };
        Ok(img.into_rgba8())
    }

    fn read_metadata(&self, bytes: &[u8]) -> Result<MetadataRecord, BackendError> {
        match exif_reader::read_exif(bytes) {
            Ok(record) => Ok(record),
            Err(exif::Error::NotFound(_)) => {
                debug!("no EXIF block");
                Ok(MetadataRecord::default())
            }
            Err(e) => {
                warn!(error = %e, "unreadable EXIF, continuing without metadata");
                Ok(MetadataRecord::default())
            }
        }
    }

    fn encode_jpeg(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        // JPEG has no alpha channel
        let rgb: RgbImage = image.convert();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.as_u8())
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(out)
    }
}
