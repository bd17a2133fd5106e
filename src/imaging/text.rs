//! Caption fonts: resolution and glyph rasterisation.
//!
//! ## Resolution
//!
//! `font_family` is a CSS-style family list, e.g.
//! `-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif`.
//! Each entry is tried in order against a `fontdb` database holding the
//! system fonts plus any `.ttf`/`.otf`/`.ttc` files in `./fonts`. The
//! platform UI aliases (`-apple-system`, `BlinkMacSystemFont`, `system-ui`)
//! map to the generic sans-serif family. An explicit `font_path` bypasses the
//! database entirely.
//!
//! A regular face is required; the bold face falls back to the regular one.
//!
//! ## Sizing
//!
//! Sizes are CSS pixels (the em box). `rusttype` scales by ascent-to-descent
//! height instead, so [`em_scale`] converts between the two.

use crate::config::WatermarkConfig;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use image::{GrayImage, Luma};
use rusttype::{Font, Scale, point};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directory scanned for bundled fonts, relative to the working directory.
pub const FONTS_DIR: &str = "fonts";

#[derive(Error, Debug)]
pub enum FontError {
    #[error("cannot read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a usable TrueType/OpenType font")]
    Invalid(String),
    #[error("no installed font matches \"{0}\"")]
    NotFound(String),
}

/// One entry of a CSS family list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyName {
    Named(String),
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

impl FamilyName {
    fn as_fontdb(&self) -> Family<'_> {
        match self {
            FamilyName::Named(name) => Family::Name(name),
            FamilyName::Serif => Family::Serif,
            FamilyName::SansSerif => Family::SansSerif,
            FamilyName::Monospace => Family::Monospace,
            FamilyName::Cursive => Family::Cursive,
            FamilyName::Fantasy => Family::Fantasy,
        }
    }
}

/// Split a CSS family list into entries, unquoting names and mapping generics.
pub fn parse_family_list(list: &str) -> Vec<FamilyName> {
    let mut families: Vec<FamilyName> = Vec::new();
    for raw in list.split(',') {
        let name = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        if name.is_empty() {
            continue;
        }
        let family = match name.to_ascii_lowercase().as_str() {
            "serif" => FamilyName::Serif,
            "sans-serif" | "system-ui" | "-apple-system" | "blinkmacsystemfont" => {
                FamilyName::SansSerif
            }
            "monospace" => FamilyName::Monospace,
            "cursive" => FamilyName::Cursive,
            "fantasy" => FamilyName::Fantasy,
            _ => FamilyName::Named(name.to_string()),
        };
        if !families.contains(&family) {
            families.push(family);
        }
    }
    families
}

/// Regular and bold faces for the two caption lines.
pub struct CaptionFonts {
    pub regular: Font<'static>,
    pub bold: Font<'static>,
}

impl std::fmt::Debug for CaptionFonts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFonts").finish_non_exhaustive()
    }
}

impl CaptionFonts {
    /// Resolve fonts for a config: `font_path` if set, else the family list
    /// against system fonts plus `./fonts`.
    pub fn resolve(config: &WatermarkConfig) -> Result<Self, FontError> {
        if let Some(path) = &config.font_path {
            return Self::from_file(path);
        }
        let mut db = Database::new();
        db.load_system_fonts();
        load_fonts_from_dir(&mut db, Path::new(FONTS_DIR));
        Self::from_database(&db, &config.font_family)
    }

    /// Use one font file for both lines.
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::try_from_vec(data)
            .ok_or_else(|| FontError::Invalid(path.display().to_string()))?;
        Ok(Self {
            regular: font.clone(),
            bold: font,
        })
    }

    /// Query `db` with a CSS family list, sans-serif as the last resort.
    pub fn from_database(db: &Database, family_list: &str) -> Result<Self, FontError> {
        let mut names = parse_family_list(family_list);
        if !names.contains(&FamilyName::SansSerif) {
            names.push(FamilyName::SansSerif);
        }
        let families: Vec<Family<'_>> = names.iter().map(FamilyName::as_fontdb).collect();

        let regular = load_face(db, &families, Weight::NORMAL)
            .ok_or_else(|| FontError::NotFound(family_list.to_string()))?;
        let bold = load_face(db, &families, Weight::BOLD).unwrap_or_else(|| regular.clone());
        Ok(Self { regular, bold })
    }
}

fn load_face(db: &Database, families: &[Family<'_>], weight: Weight) -> Option<Font<'static>> {
    let id = db.query(&Query {
        families,
        weight,
        stretch: Stretch::Normal,
        style: Style::Normal,
    })?;
    if let Some(face) = db.face(id) {
        debug!(family = ?face.families.first(), ?weight, "resolved caption font");
    }
    db.with_face_data(id, |data, index| {
        Font::try_from_vec_and_index(data.to_vec(), index)
    })
    .flatten()
}

fn load_fonts_from_dir(db: &mut Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            debug!(path = %path.display(), error = %e, "skipping font file");
        }
    }
}

// =========================================================================
// Measurement and rasterisation
// =========================================================================

/// `rusttype` scale whose em box is `px` pixels tall.
pub fn em_scale(font: &Font<'_>, px: f32) -> Scale {
    let units_per_em = f32::from(font.units_per_em().max(1));
    let vm = font.v_metrics_unscaled();
    let height_units = vm.ascent - vm.descent;
    if height_units <= 0.0 {
        return Scale::uniform(px);
    }
    Scale::uniform(px * height_units / units_per_em)
}

/// Advance width of `text` at `px`, kerning included.
pub fn measure_text(font: &Font<'_>, px: f32, text: &str) -> f32 {
    let scale = em_scale(font, px);
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Rasterise `text` into a coverage mask, horizontally centred on
/// `center_x` with its baseline at `baseline_y`.
///
/// Coverage is combined with `max` so overlapping glyphs don't over-darken.
pub fn draw_centered(
    mask: &mut GrayImage,
    font: &Font<'_>,
    px: f32,
    text: &str,
    center_x: f32,
    baseline_y: f32,
) {
    if text.is_empty() || px <= 0.0 {
        return;
    }
    let scale = em_scale(font, px);
    let start_x = center_x - measure_text(font, px, text) / 2.0;
    let (w, h) = (mask.width() as i32, mask.height() as i32);

    for glyph in font.layout(text, scale, point(start_x, baseline_y)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let x = gx as i32 + bb.min.x;
            let y = gy as i32 + bb.min.y;
            if x < 0 || y < 0 || x >= w || y >= h {
                return;
            }
            let coverage = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            let dst = mask.get_pixel_mut(x as u32, y as u32);
            if coverage > dst[0] {
                *dst = Luma([coverage]);
            }
        });
    }
}
