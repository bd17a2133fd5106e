//! Watermark configuration module.
//!
//! Handles loading, validating, and merging `watermark.toml`. The stock
//! defaults are the base layer; a user file only needs the keys it wants to
//! override, and CLI flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = ""               # Destination directory (required before a batch runs)
//! main_image_ratio = 90         # % of the photo-area the photo occupies (50-100)
//! corner_radius = 200           # Corner rounding in full-scale pixels (0-200)
//! shadow_size = 20              # Shadow blur/offset as % of photo height (0-100)
//! output_quality = 100          # JPEG quality (50-100); 100 also keeps original pixel size
//! output_width = 0              # Explicit canvas width (needs use_custom_output_size)
//! output_height = 0             # Explicit canvas height (needs use_custom_output_size)
//! use_custom_output_size = false
//! pure_background = false       # Solid average-colour backdrop instead of blurred photo
//! landscape_output = false      # Force a landscape canvas for portrait photos
//! font_family = "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif"
//! font_size_ratio = 100         # Caption size as % of the canvas-relative base (50-200)
//! use_35mm_equivalent = false   # Prefer the 35mm-equivalent focal length
//! background_blur = 30          # Backdrop blur strength (0-100, 30 = 1.5% of short side)
//! # font_path = "fonts/Inter.ttf"  # Explicit font file, overrides font_family
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Sizing mode
//!
//! `output_quality` is dual-purpose: it is the JPEG quality factor *and*, at
//! exactly 100, a switch that keeps the source's pixel dimensions. That
//! overload is kept for output compatibility but is resolved once, in
//! [`WatermarkConfig::sizing_mode`], so the layout code never inspects the
//! quality value directly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "watermark.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How the output canvas size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    /// Source pixel dimensions (swapped for portrait sources when forcing landscape).
    Original,
    /// `output_width` × `output_height` verbatim.
    Custom,
    /// 4:5 / 5:4 frame derived from the source's longest side.
    Auto,
}

/// Rendering options shared by every photo in a batch.
///
/// Read-only during a render; one instance is shared by reference across
/// all units of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Destination directory for encoded files.
    pub output_dir: PathBuf,
    /// Percentage of the photo-area occupied by the photo.
    pub main_image_ratio: f64,
    /// Corner radius in pixels at 100% photo scale.
    pub corner_radius: f64,
    /// Shadow size as a percentage of the rendered photo height.
    pub shadow_size: f64,
    /// JPEG quality percentage. 100 also selects [`SizingMode::Original`].
    pub output_quality: u32,
    /// Explicit canvas width, honoured only with `use_custom_output_size`.
    pub output_width: u32,
    /// Explicit canvas height, honoured only with `use_custom_output_size`.
    pub output_height: u32,
    /// Fill the canvas with the photo's average colour instead of a blurred backdrop.
    pub pure_background: bool,
    /// Use a landscape canvas even for portrait photos.
    pub landscape_output: bool,
    /// Gate for `output_width` / `output_height`.
    pub use_custom_output_size: bool,
    /// CSS-style font family list for the caption.
    pub font_family: String,
    /// Caption size as a percentage of the canvas-relative base size.
    pub font_size_ratio: f64,
    /// Prefer the 35mm-equivalent focal length when the photo records one.
    #[serde(rename = "use_35mm_equivalent")]
    pub use_35mm_equivalent: bool,
    /// Backdrop blur strength; 30 blurs by 1.5% of the canvas's shorter side.
    pub background_blur: f64,
    /// Font file that overrides `font_family` resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            main_image_ratio: 90.0,
            corner_radius: 200.0,
            shadow_size: 20.0,
            output_quality: 100,
            output_width: 0,
            output_height: 0,
            pure_background: false,
            landscape_output: false,
            use_custom_output_size: false,
            font_family: "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif"
                .to_string(),
            font_size_ratio: 100.0,
            use_35mm_equivalent: false,
            background_blur: 30.0,
            font_path: None,
        }
    }
}

impl WatermarkConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("main_image_ratio", self.main_image_ratio, 50.0, 100.0)?;
        check_range("corner_radius", self.corner_radius, 0.0, 200.0)?;
        check_range("shadow_size", self.shadow_size, 0.0, 100.0)?;
        check_range("font_size_ratio", self.font_size_ratio, 50.0, 200.0)?;
        check_range("background_blur", self.background_blur, 0.0, 100.0)?;
        if !(50..=100).contains(&self.output_quality) {
            return Err(ConfigError::Validation(
                "output_quality must be 50-100".into(),
            ));
        }
        if self.use_custom_output_size && (self.output_width == 0 || self.output_height == 0) {
            return Err(ConfigError::Validation(
                "use_custom_output_size requires output_width and output_height > 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolve which sizing rule the layout engine applies.
    ///
    /// Priority: original pixel size (quality sentinel) → custom size → automatic.
    pub fn sizing_mode(&self) -> SizingMode {
        if self.output_quality == 100 {
            SizingMode::Original
        } else if self.use_custom_output_size && self.output_width > 0 && self.output_height > 0 {
            SizingMode::Custom
        } else {
            SizingMode::Auto
        }
    }

    /// True when no output directory has been chosen.
    pub fn output_dir_missing(&self) -> bool {
        self.output_dir.as_os_str().is_empty()
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::Validation(format!(
            "{name} must be {min}-{max} (got {value})"
        )));
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(WatermarkConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize.
///
/// Validation is left to the caller so CLI overrides can be applied first.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<WatermarkConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: WatermarkConfig = merged.try_into()?;
    Ok(config)
}

/// Returns a fully-commented stock `watermark.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Frame Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory where framed JPEGs are written. Must be set (here or with
# --output) before a batch runs.
output_dir = ""

# ---------------------------------------------------------------------------
# Frame layout
# ---------------------------------------------------------------------------
# Percentage of the photo-area (top 90% x 90% of the canvas) the photo fills.
main_image_ratio = 90

# Corner rounding in pixels at full scale; shrinks with the photo.
corner_radius = 200

# Drop shadow strength as a percentage of the rendered photo height.
shadow_size = 20

# ---------------------------------------------------------------------------
# Output size and encoding
# ---------------------------------------------------------------------------
# JPEG quality (50-100). At exactly 100 the canvas keeps the source's pixel
# dimensions instead of adding a frame around it.
output_quality = 100

# Force a landscape canvas for portrait photos.
landscape_output = false

# Explicit canvas size; only used when use_custom_output_size = true and
# output_quality is below 100.
use_custom_output_size = false
output_width = 0
output_height = 0

# ---------------------------------------------------------------------------
# Background
# ---------------------------------------------------------------------------
# Solid average-colour background instead of the blurred photo backdrop.
pure_background = false

# Backdrop blur strength (0-100). 30 blurs by 1.5% of the canvas's shorter side.
background_blur = 30

# ---------------------------------------------------------------------------
# Caption
# ---------------------------------------------------------------------------
# CSS-style family list; the first installed face wins.
font_family = "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif"

# Explicit font file, overrides font_family.
# font_path = "fonts/Inter-Regular.ttf"

# Caption size as a percentage of canvas width / 45 (50-200).
font_size_ratio = 100

# Show the 35mm-equivalent focal length when the camera records one.
use_35mm_equivalent = false
"##
}
