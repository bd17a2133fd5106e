//! Image processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` + EXIF orientation |
//! | **EXIF metadata** | `kamadak-exif` |
//! | **Blur / resample** | `image::imageops` (`blur`, `resize`, `thumbnail`) |
//! | **Caption text** | `fontdb` (font lookup) + `rusttype` (glyphs) |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure layout math (unit testable, no pixels)
//! - **Parameters**: Fixed visual constants and encode quality
//! - **Raster / Text**: Drawing primitives and glyph rasterisation
//! - **Compositor**: Paints a layout onto a reusable [`Canvas`]
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: One photo end to end, combining all of the above

pub mod backend;
mod calculations;
pub mod compositor;
pub mod exif_reader;
pub mod operations;
mod params;
pub mod raster;
pub mod rust_backend;
pub mod text;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    FontSizes, Layout, LayoutError, Rect, calculate_cover_crop, calculate_layout,
    calculate_output_dimensions, layout_on_canvas,
};
pub use compositor::RenderError;
pub use operations::{Inspection, Rendered, UnitError, inspect_photo, render_watermark};
pub use params::{Backdrop, Quality, ShadowStyle, TextStyle};
pub use raster::Canvas;
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use text::{CaptionFonts, FontError};
