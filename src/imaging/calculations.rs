//! Pure calculation functions for frame layout.
//!
//! All functions here are pure and testable without any I/O or images. The
//! compositor only ever draws what [`calculate_layout`] decided.
//!
//! ## Canvas geometry
//!
//! ```text
//! ┌──────────────────────────────┐ ─┐
//! │   ┌──────────────────────┐   │  │
//! │   │                      │   │  │ photo-area: 90% × 90%,
//! │   │        photo         │   │  │ anchored at the top
//! │   │                      │   │  │
//! │   └──────────────────────┘   │  │
//! │                              │ ─┘
//! │     50mm f/1.8 1/250s ISO100 │ ← caption band: photo bottom → canvas bottom,
//! │          Sony A7 IV          │   both lines centred as one block
//! └──────────────────────────────┘
//! ```

use crate::config::{SizingMode, WatermarkConfig};
use serde::Serialize;
use thiserror::Error;

/// Share of the canvas's longest side the photo's longest side should take in auto sizing.
const IMAGE_SHARE_OF_CANVAS: f64 = 0.75;
/// Width / height of an auto-sized landscape canvas.
const LANDSCAPE_ASPECT: f64 = 5.0 / 4.0;
/// Width / height of an auto-sized portrait canvas.
const PORTRAIT_ASPECT: f64 = 4.0 / 5.0;
/// The canvas short side never drops below this multiple of the photo's matching side.
const MIN_FRAME_MARGIN: f64 = 1.1;
/// Auto-sized canvases are scaled down to fit this bound.
pub const MAX_AUTO_DIMENSION: f64 = 4000.0;
/// Fraction of the canvas width and height reserved for the photo.
const PHOTO_AREA_FRACTION: f64 = 0.9;
/// Primary caption size is the canvas width divided by this.
const FONT_BASE_DIVISOR: f64 = 45.0;
const SECONDARY_FONT_FACTOR: f64 = 0.8;
const LINE_GAP_FACTOR: f64 = 0.4;
/// Floor for `main_image_ratio` so the photo rectangle never collapses.
const MIN_MAIN_IMAGE_RATIO: f64 = 1.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontSizes {
    /// Brand/model line, drawn bold.
    pub primary: f64,
    /// Parameters line.
    pub secondary: f64,
}

/// Everything the compositor needs to place pixels for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub photo_rect: Rect,
    pub photo_scale: f64,
    pub corner_radius: f64,
    pub shadow_blur: f64,
    pub shadow_offset_y: f64,
    /// Baseline of the parameters line.
    pub caption_line1_y: f64,
    /// Baseline of the brand/model line.
    pub caption_line2_y: f64,
    pub font_sizes: FontSizes,
}

/// Compute the full layout for a source image of `width` × `height`.
///
/// # Errors
/// [`LayoutError::EmptyImage`] when either dimension is zero.
pub fn calculate_layout(
    width: u32,
    height: u32,
    config: &WatermarkConfig,
) -> Result<Layout, LayoutError> {
    if width == 0 || height == 0 {
        return Err(LayoutError::EmptyImage { width, height });
    }
    let canvas = calculate_output_dimensions((width, height), config);
    Ok(layout_on_canvas((width, height), canvas, config))
}

/// Decide the output canvas size. See [`SizingMode`] for the priority order.
///
/// # Examples
/// ```
/// # use photo_frame::config::WatermarkConfig;
/// # use photo_frame::imaging::calculate_output_dimensions;
/// // Quality 100 keeps the source size
/// let config = WatermarkConfig::default();
/// assert_eq!(calculate_output_dimensions((4000, 3000), &config), (4000, 3000));
///
/// // Automatic sizing adds a 5:4 frame, capped at 4000px
/// let auto = WatermarkConfig { output_quality: 90, ..WatermarkConfig::default() };
/// assert_eq!(calculate_output_dimensions((4000, 3000), &auto), (4000, 3200));
/// ```
pub fn calculate_output_dimensions(source: (u32, u32), config: &WatermarkConfig) -> (u32, u32) {
    let (src_w, src_h) = source;
    match config.sizing_mode() {
        SizingMode::Original => {
            if config.landscape_output && src_h > src_w {
                (src_h, src_w)
            } else {
                (src_w, src_h)
            }
        }
        SizingMode::Custom => (config.output_width, config.output_height),
        SizingMode::Auto => calculate_auto_dimensions(source, config.landscape_output),
    }
}

/// Automatic 4:5 / 5:4 canvas around a source image.
fn calculate_auto_dimensions(source: (u32, u32), force_landscape: bool) -> (u32, u32) {
    let (img_w, img_h) = (source.0 as f64, source.1 as f64);
    let is_vertical = img_h > img_w;
    let longest_canvas_side = img_w.max(img_h) / IMAGE_SHARE_OF_CANVAS;

    let (mut width, mut height) = if force_landscape || !is_vertical {
        (longest_canvas_side, longest_canvas_side / LANDSCAPE_ASPECT)
    } else {
        (longest_canvas_side * PORTRAIT_ASPECT, longest_canvas_side)
    };

    // Leave room around the photo on its short side
    if is_vertical && width < img_w * MIN_FRAME_MARGIN {
        width = img_w * MIN_FRAME_MARGIN;
    } else if !is_vertical && height < img_h * MIN_FRAME_MARGIN {
        height = img_h * MIN_FRAME_MARGIN;
    }

    if width > MAX_AUTO_DIMENSION || height > MAX_AUTO_DIMENSION {
        let scale_down = (MAX_AUTO_DIMENSION / width).min(MAX_AUTO_DIMENSION / height);
        width *= scale_down;
        height *= scale_down;
    }

    (round_to_even(width), round_to_even(height))
}

/// Round to the nearest even integer, never below 2.
fn round_to_even(value: f64) -> u32 {
    (((value / 2.0).round() as u32) * 2).max(2)
}

/// Place the photo and caption on a canvas of known size.
///
/// Split from [`calculate_layout`] so previews can lay out on a scaled-down
/// canvas with the same proportions.
pub fn layout_on_canvas(
    image: (u32, u32),
    canvas: (u32, u32),
    config: &WatermarkConfig,
) -> Layout {
    let (img_w, img_h) = (image.0 as f64, image.1 as f64);
    let (canvas_w, canvas_h) = (canvas.0 as f64, canvas.1 as f64);

    let area_w = canvas_w * PHOTO_AREA_FRACTION;
    let area_h = canvas_h * PHOTO_AREA_FRACTION;
    let base_scale = (area_w / img_w).min(area_h / img_h);
    let photo_scale = base_scale * config.main_image_ratio.max(MIN_MAIN_IMAGE_RATIO) / 100.0;

    let photo_w = (img_w * photo_scale).max(1.0);
    let photo_h = (img_h * photo_scale).max(1.0);
    let photo_rect = Rect {
        x: (canvas_w - photo_w) / 2.0,
        // Centred inside the photo-area, not the whole canvas
        y: (area_h - photo_h) / 2.0,
        width: photo_w,
        height: photo_h,
    };

    let shadow_factor = config.shadow_size / 100.0;

    let primary = canvas_w / FONT_BASE_DIVISOR * config.font_size_ratio / 100.0;
    let secondary = primary * SECONDARY_FONT_FACTOR;
    let line_gap = primary * LINE_GAP_FACTOR;
    let band_top = photo_rect.bottom();
    let band_height = canvas_h - band_top;
    let block_height = secondary + line_gap + primary;
    let block_top = band_top + (band_height - block_height) / 2.0;
    let caption_line1_y = block_top + secondary;
    let caption_line2_y = caption_line1_y + line_gap + primary;

    Layout {
        canvas_width: canvas.0,
        canvas_height: canvas.1,
        photo_rect,
        photo_scale,
        corner_radius: config.corner_radius * photo_scale,
        shadow_blur: photo_h * shadow_factor * 0.5,
        shadow_offset_y: photo_h * shadow_factor * 0.25,
        caption_line1_y,
        caption_line2_y,
        font_sizes: FontSizes { primary, secondary },
    }
}

/// Centred source region with the target's aspect ratio (cover-fit crop).
///
/// Cropping this region and resizing it to `target` gives the same pixels as
/// scaling the whole source to cover the target and cropping afterwards, but
/// never allocates more than the target.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(x, y, width, height)` - Region inside the source, at least 1×1
pub fn calculate_cover_crop(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = (target.0.max(1), target.1.max(1));

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    let (w, h) = if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim the sides
        let w = ((src_h as f64 * tgt_aspect).round() as u32).clamp(1, src_w);
        (w, src_h)
    } else {
        // Source is taller: keep full width, trim top and bottom
        let h = ((src_w as f64 / tgt_aspect).round() as u32).clamp(1, src_h);
        (src_w, h)
    };
    ((src_w - w) / 2, (src_h - h) / 2, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_config() -> WatermarkConfig {
        WatermarkConfig {
            output_quality: 90,
            ..WatermarkConfig::default()
        }
    }

    // =========================================================================
    // calculate_output_dimensions tests
    // =========================================================================

    #[test]
    fn original_mode_keeps_landscape_source() {
        let config = WatermarkConfig::default();
        assert_eq!(calculate_output_dimensions((4000, 3000), &config), (4000, 3000));
    }

    #[test]
    fn original_mode_swaps_portrait_when_forcing_landscape() {
        let config = WatermarkConfig {
            landscape_output: true,
            ..WatermarkConfig::default()
        };
        assert_eq!(calculate_output_dimensions((3000, 4000), &config), (4000, 3000));
        // Already landscape: untouched
        assert_eq!(calculate_output_dimensions((4000, 3000), &config), (4000, 3000));
    }

    #[test]
    fn original_mode_wins_over_custom_size() {
        let config = WatermarkConfig {
            use_custom_output_size: true,
            output_width: 1200,
            output_height: 900,
            ..WatermarkConfig::default()
        };
        assert_eq!(calculate_output_dimensions((4000, 3000), &config), (4000, 3000));
    }

    #[test]
    fn custom_mode_is_verbatim() {
        let config = WatermarkConfig {
            use_custom_output_size: true,
            output_width: 1201,
            output_height: 333,
            ..auto_config()
        };
        assert_eq!(calculate_output_dimensions((4000, 3000), &config), (1201, 333));
    }

    #[test]
    fn auto_landscape_is_capped_at_4000() {
        // 4000 / 0.75 = 5333 → 5333 x 4267, scaled by 0.75
        assert_eq!(
            calculate_output_dimensions((4000, 3000), &auto_config()),
            (4000, 3200)
        );
    }

    #[test]
    fn auto_portrait_uses_4_5() {
        assert_eq!(
            calculate_output_dimensions((3000, 4000), &auto_config()),
            (3200, 4000)
        );
        // Small enough to skip the cap: 800 / 0.75 = 1066.7 → 853.3 x 1066.7
        assert_eq!(
            calculate_output_dimensions((600, 800), &auto_config()),
            (854, 1066)
        );
    }

    #[test]
    fn auto_forced_landscape_for_portrait_source() {
        let config = WatermarkConfig {
            landscape_output: true,
            ..auto_config()
        };
        let (w, h) = calculate_output_dimensions((600, 800), &config);
        assert!(w > h);
        // 800 / 0.75 = 1066.7 wide, 853.3 tall
        assert_eq!((w, h), (1066, 854));
    }

    #[test]
    fn auto_square_source_grows_short_side_to_margin() {
        // 1333.3 x 1066.7, but height must be >= 1000 * 1.1
        assert_eq!(
            calculate_output_dimensions((1000, 1000), &auto_config()),
            (1334, 1100)
        );
    }

    #[test]
    fn auto_wide_panorama_keeps_margin() {
        // 3000x1000: 4000 x 3200 → height >= 1100 already satisfied
        let (w, h) = calculate_output_dimensions((3000, 1000), &auto_config());
        assert_eq!((w, h), (4000, 3200));
    }

    #[test]
    fn auto_never_exceeds_4000_and_is_even() {
        let config = auto_config();
        let landscape = WatermarkConfig {
            landscape_output: true,
            ..auto_config()
        };
        for &(w, h) in &[
            (1, 1),
            (7, 3),
            (3, 7),
            (999, 1001),
            (1920, 1080),
            (1080, 1920),
            (6000, 4000),
            (4000, 6000),
            (12000, 800),
            (800, 12000),
            (5471, 3647),
        ] {
            for cfg in [&config, &landscape] {
                let (cw, ch) = calculate_output_dimensions((w, h), cfg);
                assert!(cw <= 4000 && ch <= 4000, "{w}x{h} → {cw}x{ch}");
                assert_eq!(cw % 2, 0, "{w}x{h} → odd width {cw}");
                assert_eq!(ch % 2, 0, "{w}x{h} → odd height {ch}");
                assert!(cw >= 2 && ch >= 2);
            }
        }
    }

    // =========================================================================
    // calculate_layout tests
    // =========================================================================

    #[test]
    fn zero_area_image_is_rejected() {
        let config = WatermarkConfig::default();
        assert_eq!(
            calculate_layout(0, 100, &config),
            Err(LayoutError::EmptyImage {
                width: 0,
                height: 100
            })
        );
        assert!(calculate_layout(100, 0, &config).is_err());
    }

    #[test]
    fn photo_is_centered_in_photo_area() {
        let config = WatermarkConfig {
            main_image_ratio: 100.0,
            ..auto_config()
        };
        let layout = calculate_layout(4000, 3000, &config).unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (4000, 3200));

        // area 3600 x 2880 → scale = min(0.9, 0.96) = 0.9
        assert!((layout.photo_scale - 0.9).abs() < 1e-9);
        let r = layout.photo_rect;
        assert!((r.width - 3600.0).abs() < 1e-9);
        assert!((r.height - 2700.0).abs() < 1e-9);
        assert!((r.x - 200.0).abs() < 1e-9);
        assert!((r.y - 90.0).abs() < 1e-9);
        assert!((r.x + r.width / 2.0 - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn main_image_ratio_scales_photo() {
        let full = calculate_layout(
            2000,
            1000,
            &WatermarkConfig {
                main_image_ratio: 100.0,
                ..auto_config()
            },
        )
        .unwrap();
        let half = calculate_layout(
            2000,
            1000,
            &WatermarkConfig {
                main_image_ratio: 50.0,
                ..auto_config()
            },
        )
        .unwrap();
        assert!((full.photo_scale - 2.0 * half.photo_scale).abs() < 1e-9);
        assert!((full.photo_rect.width - 2.0 * half.photo_rect.width).abs() < 1e-9);
    }

    #[test]
    fn corner_radius_scales_linearly_with_photo_scale() {
        let base = WatermarkConfig {
            corner_radius: 120.0,
            main_image_ratio: 50.0,
            ..auto_config()
        };
        let doubled = WatermarkConfig {
            main_image_ratio: 100.0,
            ..base.clone()
        };
        let a = calculate_layout(3000, 2000, &base).unwrap();
        let b = calculate_layout(3000, 2000, &doubled).unwrap();

        assert!((a.corner_radius - 120.0 * a.photo_scale).abs() < 1e-9);
        let ratio = b.corner_radius / a.corner_radius;
        assert!((ratio - b.photo_scale / a.photo_scale).abs() < 1e-9);
        assert!((ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn shadow_is_proportional_to_photo_height() {
        let config = WatermarkConfig {
            shadow_size: 20.0,
            main_image_ratio: 100.0,
            ..auto_config()
        };
        let layout = calculate_layout(4000, 3000, &config).unwrap();
        // photo height 2700 → blur 2700 * 0.2 * 0.5, offset 2700 * 0.2 * 0.25
        assert!((layout.shadow_blur - 270.0).abs() < 1e-9);
        assert!((layout.shadow_offset_y - 135.0).abs() < 1e-9);
    }

    #[test]
    fn zero_shadow_size_disables_shadow() {
        let config = WatermarkConfig {
            shadow_size: 0.0,
            ..WatermarkConfig::default()
        };
        let layout = calculate_layout(1200, 800, &config).unwrap();
        assert_eq!(layout.shadow_blur, 0.0);
        assert_eq!(layout.shadow_offset_y, 0.0);
    }

    #[test]
    fn tiny_main_image_ratio_keeps_photo_visible() {
        let config = WatermarkConfig {
            main_image_ratio: 0.0,
            ..auto_config()
        };
        let layout = calculate_layout(5000, 4, &config).unwrap();
        assert!(layout.photo_rect.width > 0.0);
        assert!(layout.photo_rect.height >= 1.0);
        assert!(layout.photo_scale > 0.0);
    }

    #[test]
    fn caption_block_is_centered_in_band() {
        let config = WatermarkConfig {
            main_image_ratio: 100.0,
            font_size_ratio: 100.0,
            ..auto_config()
        };
        let layout = calculate_layout(4000, 3000, &config).unwrap();

        let primary = 4000.0 / 45.0;
        assert!((layout.font_sizes.primary - primary).abs() < 1e-9);
        assert!((layout.font_sizes.secondary - primary * 0.8).abs() < 1e-9);

        let band_top = layout.photo_rect.bottom();
        let block_top = layout.caption_line1_y - layout.font_sizes.secondary;
        let block_bottom = layout.caption_line2_y;
        let above = block_top - band_top;
        let below = 3200.0 - block_bottom;
        assert!((above - below).abs() < 1e-6);
        assert!(
            (layout.caption_line2_y - layout.caption_line1_y - primary * 1.4).abs() < 1e-9
        );
    }

    #[test]
    fn font_size_ratio_scales_caption() {
        let normal = calculate_layout(2000, 1500, &auto_config()).unwrap();
        let large = calculate_layout(
            2000,
            1500,
            &WatermarkConfig {
                font_size_ratio: 200.0,
                ..auto_config()
            },
        )
        .unwrap();
        assert!((large.font_sizes.primary - 2.0 * normal.font_sizes.primary).abs() < 1e-9);
    }

    #[test]
    fn layout_on_canvas_matches_proportions_at_any_size() {
        let config = auto_config();
        let big = layout_on_canvas((3000, 2000), (3000, 2400), &config);
        let small = layout_on_canvas((3000, 2000), (300, 240), &config);
        assert!((big.photo_rect.x / 10.0 - small.photo_rect.x).abs() < 1e-9);
        assert!((big.caption_line2_y / 10.0 - small.caption_line2_y).abs() < 1e-9);
    }

    // =========================================================================
    // calculate_cover_crop tests
    // =========================================================================

    #[test]
    fn cover_crop_trims_sides_of_wider_source() {
        // 800x600 (4:3) → 400x500 (4:5): keep 600 rows, 480 columns centred
        assert_eq!(calculate_cover_crop((800, 600), (400, 500)), (160, 0, 480, 600));
    }

    #[test]
    fn cover_crop_trims_top_and_bottom_of_taller_source() {
        // 600x800 (3:4) → 500x400 (5:4): keep 600 columns, 480 rows centred
        assert_eq!(calculate_cover_crop((600, 800), (500, 400)), (0, 160, 600, 480));
    }

    #[test]
    fn cover_crop_same_aspect_is_whole_source() {
        assert_eq!(calculate_cover_crop((800, 600), (400, 300)), (0, 0, 800, 600));
    }

    #[test]
    fn cover_crop_of_panorama_stays_inside_source() {
        let auto = auto_config();
        for source in [(60000, 600), (600, 60000), (20000, 2000), (4000, 40)] {
            let canvas = calculate_output_dimensions(source, &auto);
            let (x, y, w, h) = calculate_cover_crop(source, canvas);
            assert!(x + w <= source.0 && y + h <= source.1, "{source:?}");
            // Region keeps the canvas aspect ratio
            let region_aspect = w as f64 / h as f64;
            let canvas_aspect = canvas.0 as f64 / canvas.1 as f64;
            assert!((region_aspect - canvas_aspect).abs() / canvas_aspect < 0.02, "{source:?}");
        }
        assert_eq!(
            calculate_cover_crop((60000, 600), (4000, 3200)),
            (29625, 0, 750, 600)
        );
    }

    #[test]
    fn cover_crop_never_empty() {
        let (_, _, w, h) = calculate_cover_crop((1, 1000), (1000, 1));
        assert!(w >= 1 && h >= 1);
    }
}
