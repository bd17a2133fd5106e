//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every photo is shown by its positional index and file name first; output
//! paths, captions and layout numbers follow as indented context lines.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! 001 DSC01234.jpg
//! 002 IMG_0042.png
//! 003 broken.jpg
//! Finished with 1 error
//!
//! Written
//!     out/DSC01234_watermark_1700000000123.jpg
//!     out/IMG_0042_watermark_1700000000124.jpg
//! Errors
//!     broken.jpg: cannot decode image: Decode failed: ...
//! Rendered 2 of 3 photos
//! ```
//!
//! ## Inspect
//!
//! ```text
//! 001 DSC01234.jpg
//!     Source: 6000x4000
//!     Canvas: 4000x3200
//!     Photo: 3600x2400 at (200, 180)
//!     Camera: Sony ILCE-7M4
//!     Settings: 35mm f/2.8 1/250s ISO100
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::Inspection;
use crate::process::BatchResult;
use crate::types::{BatchProgress, ProgressStatus};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `count` followed by `noun`, with a plural `s` unless `count` is 1.
pub fn count_noun(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Render output
// ============================================================================

/// Format a single batch progress event as display lines.
///
/// `Processing` events show the photo about to be rendered; terminal events
/// show the batch message.
pub fn format_progress_event(event: &BatchProgress) -> Vec<String> {
    match event.status {
        ProgressStatus::Processing => vec![format!(
            "{} {}",
            format_index(event.current),
            event.current_file_name
        )],
        _ => match &event.message {
            Some(message) => vec![message.clone()],
            None => Vec::new(),
        },
    }
}

/// Format the end-of-batch summary: written files, errors, totals.
pub fn format_batch_summary(result: &BatchResult) -> Vec<String> {
    let mut lines = Vec::new();

    if !result.output_paths.is_empty() {
        lines.push(String::new());
        lines.push("Written".to_string());
        for path in &result.output_paths {
            lines.push(format!("{}{}", indent(1), path.display()));
        }
    }

    if !result.errors.is_empty() {
        if result.output_paths.is_empty() {
            lines.push(String::new());
        }
        lines.push("Errors".to_string());
        for message in result.error_messages() {
            lines.push(format!("{}{}", indent(1), message));
        }
    }

    let verb = if result.cancelled {
        "Cancelled after rendering"
    } else {
        "Rendered"
    };
    lines.push(format!(
        "{} {} of {}",
        verb,
        result.processed_count,
        count_noun(result.total_count, "photo")
    ));
    lines
}

/// Print the batch summary to stdout.
pub fn print_batch_summary(result: &BatchResult) {
    for line in format_batch_summary(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspect output
// ============================================================================

/// Format what rendering one photo would produce.
pub fn format_inspection(index: usize, name: &str, inspection: &Inspection) -> Vec<String> {
    let layout = &inspection.layout;
    let rect = &layout.photo_rect;
    let mut lines = vec![
        format!("{} {}", format_index(index), name),
        format!(
            "{}Source: {}x{}",
            indent(1),
            inspection.source_width,
            inspection.source_height
        ),
        format!(
            "{}Canvas: {}x{}",
            indent(1),
            layout.canvas_width,
            layout.canvas_height
        ),
        format!(
            "{}Photo: {}x{} at ({}, {})",
            indent(1),
            rect.width.round(),
            rect.height.round(),
            rect.x.round(),
            rect.y.round()
        ),
    ];

    let camera = inspection.caption.camera_text();
    if !camera.is_empty() {
        lines.push(format!("{}Camera: {}", indent(1), camera));
    }
    if !inspection.caption.params_text.is_empty() {
        lines.push(format!(
            "{}Settings: {}",
            indent(1),
            inspection.caption.params_text
        ));
    }
    if inspection.caption.is_empty() {
        lines.push(format!("{}Caption: (none)", indent(1)));
    }
    lines
}

/// Print an inspection to stdout.
pub fn print_inspection(index: usize, name: &str, inspection: &Inspection) {
    for line in format_inspection(index, name, inspection) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
