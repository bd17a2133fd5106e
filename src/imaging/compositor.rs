//! Paints one framed photo onto a [`Canvas`].
//!
//! Drawing order, back to front:
//!
//! 1. **Background**: the photo's average colour (`pure_background`), or the
//!    photo cover-fitted to the canvas, blurred, dimmed and overlaid with 20% black.
//! 2. **Shadow**: the rounded photo rectangle, blurred and offset downwards,
//!    in 40% black; then the rectangle itself in opaque black.
//! 3. **Photo**: resampled into its rectangle, clipped to the rounded corners.
//! 4. **Caption**: parameters line, then the bold camera line, off-white over a
//!    soft dark shadow.
//!
//! [`render`] resets the canvas before step 1, so a canvas reused across a
//! batch produces exactly what a fresh one would.

use super::calculations::{Layout, calculate_cover_crop};
use super::params::{Backdrop, ShadowStyle, TextStyle};
use super::raster::{self, Canvas};
use super::text::{self, CaptionFonts};
use crate::config::WatermarkConfig;
use crate::metadata::Caption;
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};
use thiserror::Error;
use tracing::debug;

/// Largest surface we agree to allocate (16384²).
pub const MAX_SURFACE_PIXELS: u64 = 16384 * 16384;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} drawing surface")]
    SurfaceUnavailable { width: u32, height: u32 },
}

/// Render `image` framed per `layout` into `canvas`.
///
/// `fonts` of `None` skips the caption; everything else still renders.
pub fn render(
    canvas: &mut Canvas,
    image: &RgbaImage,
    layout: &Layout,
    caption: &Caption,
    config: &WatermarkConfig,
    fonts: Option<&CaptionFonts>,
) -> Result<(), RenderError> {
    let (width, height) = (layout.canvas_width, layout.canvas_height);
    if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
        return Err(RenderError::SurfaceUnavailable { width, height });
    }

    let surface = canvas.reset(width, height);

    if config.pure_background {
        draw_solid_background(surface, image);
    } else {
        draw_blurred_background(surface, image, config.background_blur as f32);
    }

    let photo_mask = photo_mask(layout);
    let photo_origin = photo_origin(layout);
    draw_shadow(surface, layout);
    raster::fill_masked(surface, &photo_mask, photo_origin, [0, 0, 0], 1.0);
    draw_photo(surface, image, &photo_mask, photo_origin);

    match fonts {
        Some(fonts) if !caption.is_empty() => {
            draw_caption(surface, layout, caption, fonts, &TextStyle::default());
        }
        Some(_) => {}
        None => debug!("no caption font, skipping caption"),
    }

    Ok(())
}

// =========================================================================
// Background
// =========================================================================

/// Average colour of `image`, via a 1×1 area-averaging downsample.
pub fn average_color(image: &RgbaImage) -> [u8; 3] {
    let px = imageops::thumbnail(image, 1, 1);
    let p = px.get_pixel(0, 0);
    [p[0], p[1], p[2]]
}

fn draw_solid_background(surface: &mut RgbaImage, image: &RgbaImage) {
    raster::fill(surface, average_color(image));
}

fn draw_blurred_background(surface: &mut RgbaImage, image: &RgbaImage, strength: f32) {
    let backdrop = Backdrop::default();
    let (width, height) = surface.dimensions();

    // Cover-fit: centre-crop the source to the canvas aspect, then resize
    let (crop_x, crop_y, crop_w, crop_h) =
        calculate_cover_crop(image.dimensions(), (width, height));
    let region = imageops::crop_imm(image, crop_x, crop_y, crop_w, crop_h);
    let cropped = imageops::resize(&*region, width, height, FilterType::Triangle);

    let sigma = backdrop.blur_sigma(width, height, strength);
    let mut blurred = raster::soft_blur(&cropped, sigma);
    raster::scale_brightness(&mut blurred, backdrop.brightness);

    for (dst, src) in surface.pixels_mut().zip(blurred.pixels()) {
        *dst = Rgba([src[0], src[1], src[2], 255]);
    }
    raster::overlay(surface, [0, 0, 0], backdrop.overlay_alpha);
}

// =========================================================================
// Shadow and photo
// =========================================================================

fn photo_size(layout: &Layout) -> (u32, u32) {
    let r = layout.photo_rect;
    (
        (r.width.round() as u32).max(1),
        (r.height.round() as u32).max(1),
    )
}

fn photo_origin(layout: &Layout) -> (i64, i64) {
    let r = layout.photo_rect;
    (r.x.round() as i64, r.y.round() as i64)
}

fn photo_mask(layout: &Layout) -> GrayImage {
    let (w, h) = photo_size(layout);
    raster::rounded_rect_mask(
        w,
        h,
        (0.0, 0.0, w as f32, h as f32),
        layout.corner_radius as f32,
    )
}

fn draw_shadow(surface: &mut RgbaImage, layout: &Layout) {
    let style = ShadowStyle::new(layout.shadow_blur as f32, layout.shadow_offset_y as f32);
    let sigma = style.blur / 2.0;
    let pad = (sigma * 3.0).ceil() as i64 + 2;

    let r = layout.photo_rect;
    let top = r.y + f64::from(style.offset_y);
    let origin = (r.x.floor() as i64 - pad, top.floor() as i64 - pad);
    let local_x = (r.x - origin.0 as f64) as f32;
    let local_y = (top - origin.1 as f64) as f32;
    let mask_w = (r.width.ceil() as i64 + 2 * pad + 2).max(1) as u32;
    let mask_h = (r.height.ceil() as i64 + 2 * pad + 2).max(1) as u32;

    let mask = raster::rounded_rect_mask(
        mask_w,
        mask_h,
        (local_x, local_y, r.width as f32, r.height as f32),
        layout.corner_radius as f32,
    );
    let blurred = raster::soft_blur(&mask, sigma);
    raster::fill_masked(surface, &blurred, origin, [0, 0, 0], style.opacity);
}

fn draw_photo(surface: &mut RgbaImage, image: &RgbaImage, mask: &GrayImage, origin: (i64, i64)) {
    let (w, h) = mask.dimensions();
    let resized = if image.dimensions() == (w, h) {
        image.clone()
    } else {
        imageops::resize(image, w, h, FilterType::Lanczos3)
    };
    raster::draw_masked(surface, &resized, origin, mask);
}

// =========================================================================
// Caption
// =========================================================================

fn draw_caption(
    surface: &mut RgbaImage,
    layout: &Layout,
    caption: &Caption,
    fonts: &CaptionFonts,
    style: &TextStyle,
) {
    let (width, height) = surface.dimensions();
    let center_x = width as f32 / 2.0;
    let mut mask = GrayImage::new(width, height);

    text::draw_centered(
        &mut mask,
        &fonts.regular,
        layout.font_sizes.secondary as f32,
        &caption.params_text,
        center_x,
        layout.caption_line1_y as f32,
    );
    text::draw_centered(
        &mut mask,
        &fonts.bold,
        layout.font_sizes.primary as f32,
        &caption.camera_text(),
        center_x,
        layout.caption_line2_y as f32,
    );

    let shadow = raster::soft_blur(&mask, style.shadow_blur / 2.0);
    raster::fill_masked(surface, &shadow, (0, 0), [0, 0, 0], style.shadow_opacity);
    raster::fill_masked(surface, &mask, (0, 0), style.fill, 1.0);
}
