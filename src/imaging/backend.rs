//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the three collaborators the render
//! pipeline needs from the outside world: decode, read_metadata, and
//! encode_jpeg. Everything between (layout, compositing) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests swap in
//! [`tests::MockBackend`], which hands out synthetic images and records calls.

use super::params::Quality;
use crate::metadata::MetadataRecord;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image backends.
///
/// All methods take raw file bytes; reading and writing files is the
/// [`FileStore`](crate::process::FileStore)'s job.
pub trait ImageBackend: Sync {
    /// Decode to RGBA, upright (EXIF orientation already applied).
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Read embedded EXIF metadata.
    fn read_metadata(&self, bytes: &[u8]) -> Result<MetadataRecord, BackendError>;

    /// Encode a finished surface as baseline JPEG.
    fn encode_jpeg(&self, image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
