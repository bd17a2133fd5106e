//! # Photo Frame
//!
//! Batch compositor that turns photographs into framed, captioned JPEGs: the
//! photo sits centred on a blurred (or flat) backdrop of itself, with rounded
//! corners, a drop shadow and a two-line camera caption underneath.
//!
//! # Architecture: One Unit, Many Times
//!
//! Every photo goes through the same pure pipeline:
//!
//! ```text
//! bytes ──decode──► pixels ─┐
//!                           ├─► Layout ──► Compositor ──► encode ──► file
//! EXIF ──normalize──► Caption ┘
//! ```
//!
//! The [`process`] module runs that unit over a list of photos, one at a time,
//! reporting progress over a channel and collecting per-photo failures without
//! aborting the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `watermark.toml` loading, stock defaults, validation, sizing mode |
//! | [`metadata`] | Raw EXIF fields → display caption (brand, model, exposure) |
//! | [`imaging`] | Layout math, raster primitives, fonts, compositor, JPEG backend |
//! | [`naming`] | `{stem}_watermark_{millis}.jpg` naming and directory joining |
//! | [`process`] | Batch orchestration: tasks, progress, cancellation, file store |
//! | [`types`] | Status and progress types shared with front ends |
//! | [`output`] | CLI output formatting for progress, summaries and inspection |
//!
//! # Design Decisions
//!
//! ## Layout Is Pure
//!
//! Everything geometric (output size, photo placement, corner radius, caption
//! baselines) is computed by [`imaging::calculate_layout`] from two integers
//! and the config. Drawing code never makes a sizing decision, so the layout
//! rules are unit tested without touching a pixel.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, blurring, resampling and JPEG encoding use the `image` crate;
//! glyphs come from `rusttype` with faces found through `fontdb`. There are no
//! system library dependencies beyond the fonts already installed.
//!
//! ## Sequential Rendering
//!
//! A full-size surface can be hundreds of megabytes at the 16384 px limit.
//! Photos are rendered one after another on a single reused
//! [`imaging::Canvas`]; only the cheap metadata pre-load runs in parallel.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
