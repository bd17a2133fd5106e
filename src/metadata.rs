//! Photo metadata and caption normalization.
//!
//! A [`MetadataRecord`] is what the EXIF collaborator
//! ([`imaging::exif_reader`](crate::imaging::exif_reader)) hands back for one
//! photo. Every field is optional: absence is a normal state and renders as an
//! omitted caption segment, never as an error.
//!
//! [`normalize`] turns a record into the two display lines drawn under the
//! photo:
//!
//! ```text
//! 50mm f/1.8 1/2000s ISO100      ← parameters line (smaller)
//! Sony A7 IV                     ← brand + model line (bold)
//! ```
//!
//! ## Brand normalization
//!
//! Manufacturers write `Make` inconsistently (`"SONY"`, `"NIKON CORPORATION"`,
//! `"OLYMPUS IMAGING CORP."`). The make is lower-cased and matched against a
//! fixed keyword table by substring containment; the first matching entry wins,
//! so table order is the tie-break. Unknown makes are capitalized.
//!
//! ## Model de-duplication
//!
//! Many bodies repeat the brand inside `Model` (`Make = "Canon"`,
//! `Model = "Canon EOS R5"`). A leading brand is stripped, repeatedly, so the
//! caption never reads "Canon Canon EOS R5".

use crate::config::WatermarkConfig;
use serde::{Deserialize, Serialize};

/// Raw, already-parsed metadata for one photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_description: Option<String>,
    pub f_number: Option<f64>,
    pub exposure_time_seconds: Option<f64>,
    pub iso: Option<u32>,
    pub focal_length_mm: Option<f64>,
    pub focal_length_35mm_mm: Option<f64>,
    pub capture_timestamp: Option<String>,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
    pub orientation: Option<u16>,
}

/// Display-ready caption text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Caption {
    /// Canonical brand, `None` when the photo has no `Make`.
    pub brand: Option<String>,
    /// Model with any leading brand removed.
    pub model_text: String,
    /// Focal length, aperture, shutter speed and ISO, space-separated.
    pub params_text: String,
}

impl Caption {
    /// The bold bottom line: brand and model joined by a space.
    pub fn camera_text(&self) -> String {
        match &self.brand {
            Some(brand) => format!("{} {}", brand, self.model_text).trim().to_string(),
            None => self.model_text.trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.camera_text().is_empty() && self.params_text.is_empty()
    }
}

/// Keyword → canonical brand, in match priority order.
const BRANDS: &[(&str, &str)] = &[
    ("canon", "Canon"),
    ("nikon", "Nikon"),
    ("sony", "Sony"),
    ("fujifilm", "Fujifilm"),
    ("olympus", "Olympus"),
    ("panasonic", "Panasonic"),
    ("leica", "Leica"),
    ("pentax", "Pentax"),
    ("ricoh", "Ricoh"),
    ("hasselblad", "Hasselblad"),
    ("phase one", "Phase One"),
];

/// Build the caption for one photo.
///
/// A missing record (`None`) yields an empty caption.
pub fn normalize(meta: Option<&MetadataRecord>, config: &WatermarkConfig) -> Caption {
    let Some(meta) = meta else {
        return Caption::default();
    };

    let brand = meta.make.as_deref().and_then(normalize_brand);
    let model_text = match (&brand, meta.model.as_deref()) {
        (Some(b), Some(m)) => strip_brand_prefix(m, b),
        (None, Some(m)) => m.trim().to_string(),
        (_, None) => String::new(),
    };

    let focal = if config.use_35mm_equivalent {
        positive(meta.focal_length_35mm_mm).or(positive(meta.focal_length_mm))
    } else {
        positive(meta.focal_length_mm)
    };

    let params_text = [
        focal.map(format_focal_length),
        positive(meta.f_number).map(format_aperture),
        meta.exposure_time_seconds.and_then(format_shutter_speed),
        meta.iso.filter(|&iso| iso > 0).map(|iso| format!("ISO{iso}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    Caption {
        brand,
        model_text,
        params_text,
    }
}

/// Canonicalize a camera `Make` string.
///
/// Returns `None` for a blank make.
pub fn normalize_brand(make: &str) -> Option<String> {
    let trimmed = make.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if let Some((_, canonical)) = BRANDS.iter().find(|(key, _)| lower.contains(key)) {
        return Some((*canonical).to_string());
    }

    let mut chars = trimmed.chars();
    chars.next().map(|first| {
        first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect()
    })
}

/// Remove every leading occurrence of `brand` from `model` (case-insensitive).
pub fn strip_brand_prefix(model: &str, brand: &str) -> String {
    let mut rest = model.trim();
    while !brand.is_empty() {
        match rest.get(..brand.len()) {
            Some(head) if head.eq_ignore_ascii_case(brand) => {
                rest = rest[brand.len()..].trim_start();
            }
            _ => break,
        }
    }
    rest.trim_end().to_string()
}

/// `"{t}s"` for one second or longer, `"1/{round(1/t)}s"` below; `None` for zero.
pub fn format_shutter_speed(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds >= 1.0 {
        Some(format!("{seconds}s"))
    } else {
        Some(format!("1/{}s", (1.0 / seconds).round()))
    }
}

pub fn format_aperture(f_number: f64) -> String {
    format!("f/{f_number}")
}

pub fn format_focal_length(mm: f64) -> String {
    format!("{}mm", mm.round())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
