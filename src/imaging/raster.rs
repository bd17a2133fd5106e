//! Drawing primitives on RGBA surfaces.
//!
//! The compositor never touches pixels directly; it combines these:
//!
//! - [`Canvas`]: the reusable output surface, reset in full before each render
//! - [`rounded_rect_mask`]: anti-aliased coverage of a rounded rectangle
//! - [`soft_blur`]: Gaussian blur that downsamples first for large sigmas
//! - [`fill_masked`], [`draw_masked`], [`overlay`], [`scale_brightness`]: blending
//!
//! Surfaces are opaque once the background is down, so straight and
//! premultiplied alpha coincide and blending works on straight RGBA.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgba, RgbaImage};

/// Sigma above which [`soft_blur`] works on a downsampled copy.
const MAX_DIRECT_SIGMA: f32 = 4.0;

/// Reusable output surface.
///
/// Holding one `Canvas` across a batch avoids reallocating a multi-megabyte
/// buffer per photo. [`Canvas::reset`] clears every pixel, so nothing drawn
/// for one photo can leak into the next.
#[derive(Debug)]
pub struct Canvas {
    surface: RgbaImage,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            surface: RgbaImage::new(0, 0),
        }
    }

    /// Resize to `width` × `height` and clear to transparent black.
    pub fn reset(&mut self, width: u32, height: u32) -> &mut RgbaImage {
        if self.surface.dimensions() == (width, height) {
            for p in self.surface.pixels_mut() {
                *p = Rgba([0, 0, 0, 0]);
            }
        } else {
            self.surface = RgbaImage::new(width, height);
        }
        &mut self.surface
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    /// Take the finished surface, leaving an empty one behind.
    pub fn take(&mut self) -> RgbaImage {
        std::mem::replace(&mut self.surface, RgbaImage::new(0, 0))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Coverage masks
// =========================================================================

/// Signed distance from `(px, py)` to a rounded rectangle (negative inside).
fn rounded_rect_distance(px: f32, py: f32, x: f32, y: f32, w: f32, h: f32, radius: f32) -> f32 {
    let hw = w / 2.0;
    let hh = h / 2.0;
    let r = radius.clamp(0.0, hw.min(hh));
    let qx = (px - (x + hw)).abs() - (hw - r);
    let qy = (py - (y + hh)).abs() - (hh - r);
    let outside = qx.max(0.0).hypot(qy.max(0.0));
    let inside = qx.max(qy).min(0.0);
    outside + inside - r
}

/// Anti-aliased coverage mask of a rounded rectangle on a `width` × `height` grid.
///
/// The rectangle is given in the mask's own coordinates and may be fractional.
/// `radius` is clamped to half the shorter side.
pub fn rounded_rect_mask(
    width: u32,
    height: u32,
    rect: (f32, f32, f32, f32),
    radius: f32,
) -> GrayImage {
    let (x, y, w, h) = rect;
    let mut mask = GrayImage::new(width, height);
    if w <= 0.0 || h <= 0.0 {
        return mask;
    }

    let x0 = (x.floor().max(0.0) as u32).min(width);
    let y0 = (y.floor().max(0.0) as u32).min(height);
    let x1 = ((x + w).ceil().max(0.0) as u32).min(width);
    let y1 = ((y + h).ceil().max(0.0) as u32).min(height);

    for py in y0..y1 {
        for px in x0..x1 {
            let d = rounded_rect_distance(px as f32 + 0.5, py as f32 + 0.5, x, y, w, h, radius);
            let coverage = (0.5 - d).clamp(0.0, 1.0);
            if coverage > 0.0 {
                mask.put_pixel(px, py, Luma([(coverage * 255.0).round() as u8]));
            }
        }
    }
    mask
}

// =========================================================================
// Blur
// =========================================================================

/// Gaussian blur with standard deviation `sigma`.
///
/// Large sigmas are applied to a downsampled copy and scaled back up, which
/// is visually indistinguishable for soft shadows and backdrops and keeps the
/// kernel small.
pub fn soft_blur<P>(img: &ImageBuffer<P, Vec<u8>>, sigma: f32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if sigma <= 0.0 || !sigma.is_finite() {
        return img.clone();
    }

    let (w, h) = img.dimensions();
    let factor = (sigma / MAX_DIRECT_SIGMA).floor().max(1.0);
    if factor <= 1.0 {
        return imageops::blur(img, sigma);
    }

    let small_w = ((w as f32 / factor).round() as u32).max(1);
    let small_h = ((h as f32 / factor).round() as u32).max(1);
    let small = imageops::resize(img, small_w, small_h, FilterType::Triangle);
    let blurred = imageops::blur(&small, sigma / factor);
    imageops::resize(&blurred, w, h, FilterType::Triangle)
}

// =========================================================================
// Blending
// =========================================================================

fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

/// Source-over of a solid colour with coverage `alpha` (0–255).
fn blend_pixel(dst: &mut Rgba<u8>, color: [u8; 3], alpha: u8) {
    if alpha == 0 {
        return;
    }
    let a = u16::from(alpha);
    let inv = 255 - a;
    for i in 0..3 {
        let out = mul_div255(u16::from(color[i]), a) + mul_div255(u16::from(dst[i]), inv);
        dst[i] = out.min(255) as u8;
    }
    dst[3] = (a + mul_div255(u16::from(dst[3]), inv)).min(255) as u8;
}

/// Flood the whole surface with an opaque colour.
pub fn fill(surface: &mut RgbaImage, color: [u8; 3]) {
    let px = Rgba([color[0], color[1], color[2], 255]);
    for p in surface.pixels_mut() {
        *p = px;
    }
}

/// Lay a uniform translucent colour over the whole surface.
pub fn overlay(surface: &mut RgbaImage, color: [u8; 3], opacity: f32) {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    for p in surface.pixels_mut() {
        blend_pixel(p, color, alpha);
    }
}

/// Multiply RGB by `factor` (alpha untouched).
pub fn scale_brightness(surface: &mut RgbaImage, factor: f32) {
    let factor = factor.max(0.0);
    for p in surface.pixels_mut() {
        for c in p.0.iter_mut().take(3) {
            *c = (f32::from(*c) * factor).round().min(255.0) as u8;
        }
    }
}

/// Paint `color` through `mask` placed with its top-left at `origin`.
///
/// Parts of the mask outside the surface are clipped.
pub fn fill_masked(
    surface: &mut RgbaImage,
    mask: &GrayImage,
    origin: (i64, i64),
    color: [u8; 3],
    opacity: f32,
) {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    if op == 0 {
        return;
    }
    let (sw, sh) = (i64::from(surface.width()), i64::from(surface.height()));
    for (mx, my, m) in mask.enumerate_pixels() {
        let x = origin.0 + i64::from(mx);
        let y = origin.1 + i64::from(my);
        if x < 0 || y < 0 || x >= sw || y >= sh || m[0] == 0 {
            continue;
        }
        let alpha = mul_div255(u16::from(m[0]), op) as u8;
        blend_pixel(surface.get_pixel_mut(x as u32, y as u32), color, alpha);
    }
}

/// Draw `src` at `origin`, using `mask` (same size as `src`) as its alpha.
pub fn draw_masked(surface: &mut RgbaImage, src: &RgbaImage, origin: (i64, i64), mask: &GrayImage) {
    let (sw, sh) = (i64::from(surface.width()), i64::from(surface.height()));
    for (sx, sy, p) in src.enumerate_pixels() {
        let x = origin.0 + i64::from(sx);
        let y = origin.1 + i64::from(sy);
        if x < 0 || y < 0 || x >= sw || y >= sh {
            continue;
        }
        let coverage = mask.get_pixel_checked(sx, sy).map_or(0, |m| m[0]);
        let alpha = mul_div255(u16::from(coverage), u16::from(p[3])) as u8;
        blend_pixel(surface.get_pixel_mut(x as u32, y as u32), [p[0], p[1], p[2]], alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Canvas
    // =========================================================================

    #[test]
    fn reset_clears_reused_surface() {
        let mut canvas = Canvas::new();
        fill(canvas.reset(4, 4), [255, 0, 0]);
        let surface = canvas.reset(4, 4);
        assert!(surface.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn reset_resizes() {
        let mut canvas = Canvas::new();
        canvas.reset(4, 4);
        canvas.reset(10, 3);
        assert_eq!(canvas.dimensions(), (10, 3));
        assert_eq!(canvas.take().dimensions(), (10, 3));
        assert_eq!(canvas.dimensions(), (0, 0));
    }

    // =========================================================================
    // Rounded rect mask
    // =========================================================================

    #[test]
    fn square_corners_fill_completely() {
        let mask = rounded_rect_mask(10, 10, (0.0, 0.0, 10.0, 10.0), 0.0);
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn rounded_corners_are_transparent() {
        let mask = rounded_rect_mask(40, 40, (0.0, 0.0, 40.0, 40.0), 10.0);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(39, 39)[0], 0);
        assert_eq!(mask.get_pixel(20, 20)[0], 255);
        // Straight edge midpoints stay solid
        assert_eq!(mask.get_pixel(20, 0)[0], 255);
        assert_eq!(mask.get_pixel(0, 20)[0], 255);
    }

    #[test]
    fn oversized_radius_is_clamped_to_pill() {
        let mask = rounded_rect_mask(40, 20, (0.0, 0.0, 40.0, 20.0), 500.0);
        // Radius clamps to 10: centre row is fully covered end to end
        assert!(mask.get_pixel(0, 10)[0] > 100);
        assert_eq!(mask.get_pixel(20, 10)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn mask_clips_to_grid() {
        let mask = rounded_rect_mask(10, 10, (-5.0, -5.0, 30.0, 30.0), 0.0);
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn empty_rect_gives_empty_mask() {
        let mask = rounded_rect_mask(10, 10, (2.0, 2.0, 0.0, 5.0), 1.0);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    // =========================================================================
    // Blur
    // =========================================================================

    #[test]
    fn zero_sigma_is_identity() {
        let mut img = GrayImage::new(8, 8);
        img.put_pixel(4, 4, Luma([255]));
        assert_eq!(soft_blur(&img, 0.0), img);
    }

    #[test]
    fn blur_spreads_energy_and_keeps_size() {
        let mut img = GrayImage::new(64, 64);
        for y in 28..36 {
            for x in 28..36 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        for sigma in [2.0, 12.0] {
            let out = soft_blur(&img, sigma);
            assert_eq!(out.dimensions(), (64, 64));
            assert!(out.get_pixel(32, 32)[0] < 255);
            assert!(out.get_pixel(32, 26)[0] > 0);
        }
    }

    // =========================================================================
    // Blending
    // =========================================================================

    #[test]
    fn overlay_darkens_by_alpha() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([200, 200, 200, 255]));
        overlay(&mut img, [0, 0, 0], 0.2);
        // 200 * (1 - 51/255) = 160
        assert_eq!(img.get_pixel(0, 0).0, [160, 160, 160, 255]);
    }

    #[test]
    fn brightness_scales_rgb_only() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([100, 200, 50, 255]));
        scale_brightness(&mut img, 0.5);
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 25, 255]);
    }

    #[test]
    fn fill_masked_clips_and_blends() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let mask = GrayImage::from_pixel(4, 4, Luma([255]));
        fill_masked(&mut img, &mask, (2, -2), [0, 0, 0], 1.0);

        assert_eq!(img.get_pixel(3, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 1).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(3, 2).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn draw_masked_respects_mask() {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([255]));
        draw_masked(&mut img, &src, (1, 0), &mask);

        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 0).0, [255, 0, 0, 255]);
    }
}
