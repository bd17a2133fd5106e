//! High-level image operations.
//!
//! These functions combine the layout calculations, the compositor and the
//! backend into the per-photo unit of work the batch orchestrator runs.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{Layout, LayoutError, calculate_layout};
use super::compositor::{self, RenderError};
use super::params::Quality;
use super::raster::Canvas;
use super::text::CaptionFonts;
use crate::config::WatermarkConfig;
use crate::metadata::{self, Caption, MetadataRecord};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Why one photo could not be rendered. Never aborts a batch.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("no image data")]
    MissingSource,
    #[error(transparent)]
    Input(#[from] LayoutError),
    #[error("cannot decode image: {0}")]
    Decode(#[source] BackendError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("cannot encode JPEG: {0}")]
    Encode(#[source] BackendError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, UnitError>;

/// An encoded, framed photo.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub caption: Caption,
}

/// Decode, lay out, composite and encode one photo.
///
/// `canvas` is reset inside; pass the same one for every photo of a batch.
pub fn render_watermark(
    backend: &impl ImageBackend,
    canvas: &mut Canvas,
    bytes: &[u8],
    metadata: Option<&MetadataRecord>,
    config: &WatermarkConfig,
    fonts: Option<&CaptionFonts>,
) -> Result<Rendered> {
    let image = backend.decode(bytes).map_err(UnitError::Decode)?;
    let layout = calculate_layout(image.width(), image.height(), config)?;
    let caption = metadata::normalize(metadata, config);
    debug!(
        width = layout.canvas_width,
        height = layout.canvas_height,
        caption = %caption.camera_text(),
        "compositing"
    );

    compositor::render(canvas, &image, &layout, &caption, config, fonts)?;

    let jpeg = backend
        .encode_jpeg(canvas.surface(), Quality::new(config.output_quality))
        .map_err(UnitError::Encode)?;

    Ok(Rendered {
        jpeg,
        width: layout.canvas_width,
        height: layout.canvas_height,
        caption,
    })
}

/// What a render would produce, without drawing anything.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Inspection {
    pub source_width: u32,
    pub source_height: u32,
    pub caption: Caption,
    pub layout: Layout,
}

/// Decode for dimensions and compute caption and layout.
pub fn inspect_photo(
    backend: &impl ImageBackend,
    bytes: &[u8],
    metadata: Option<&MetadataRecord>,
    config: &WatermarkConfig,
) -> Result<Inspection> {
    let image = backend.decode(bytes).map_err(UnitError::Decode)?;
    let layout = calculate_layout(image.width(), image.height(), config)?;
    Ok(Inspection {
        source_width: image.width(),
        source_height: image.height(),
        caption: metadata::normalize(metadata, config),
        layout,
    })
}
