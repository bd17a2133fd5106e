//! Shared test utilities for the photo-frame test suite.
//!
//! Synthetic fixtures are generated in-process so tests never depend on files
//! checked into the repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_photo_dir(&[("dawn.jpg", 120, 80), ("dusk.jpg", 80, 120)]);
//! let bytes = jpeg_bytes(64, 48);
//! ```

use exif::Field;
use image::{ImageEncoder, RgbImage};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Image fixtures
// =========================================================================

/// Gradient test pattern, so blurs and crops produce visible differences.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a gradient as an in-memory JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

/// Temp directory holding one synthetic JPEG per `(name, width, height)`.
pub fn setup_photo_dir(photos: &[(&str, u32, u32)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, w, h) in photos {
        create_test_jpeg(&tmp.path().join(name), *w, *h);
    }
    tmp
}

// =========================================================================
// EXIF fixtures
// =========================================================================

/// Serialise EXIF fields into a bare TIFF container that `kamadak-exif` can
/// read back with `read_from_container`.
pub fn exif_tiff(fields: &[Field]) -> Vec<u8> {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}
