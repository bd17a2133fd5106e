//! Parameter types for drawing and encoding.
//!
//! These structs describe *what* the compositor paints, not *how*. Keeping the
//! fixed visual constants here (shadow opacity, caption colours, backdrop
//! dimming) means the compositor reads as a sequence of steps and tests can
//! refer to the same values.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`ShadowStyle`]: Drop shadow under the photo: colour opacity, blur and vertical offset.
//! - [`TextStyle`]: Caption fill colour and its soft drop shadow.
//! - [`Backdrop`]: Brightness and overlay applied to the blurred background.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the encoder's `u8` factor.
    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Drop shadow cast by the rounded photo rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    /// Opacity of the black shadow colour.
    pub opacity: f32,
    /// Canvas-style blur extent in pixels (Gaussian sigma is half of this).
    pub blur: f32,
    /// Vertical offset in pixels; horizontal offset is always zero.
    pub offset_y: f32,
}

impl ShadowStyle {
    pub const OPACITY: f32 = 0.4;

    pub fn new(blur: f32, offset_y: f32) -> Self {
        Self {
            opacity: Self::OPACITY,
            blur,
            offset_y,
        }
    }
}

/// Caption text appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub fill: [u8; 3],
    pub shadow_opacity: f32,
    /// Canvas-style blur extent of the text shadow.
    pub shadow_blur: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: [0xfa, 0xfa, 0xfa],
            shadow_opacity: 0.7,
            shadow_blur: 8.0,
        }
    }
}

/// Treatment of the blurred full-bleed background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backdrop {
    /// Brightness multiplier applied with the blur.
    pub brightness: f32,
    /// Alpha of the black layer laid over the blurred image.
    pub overlay_alpha: f32,
    /// Blur as a fraction of the canvas's shorter side at `background_blur = 30`.
    pub blur_fraction: f32,
}

impl Backdrop {
    /// `background_blur` value that reproduces `blur_fraction` exactly.
    pub const REFERENCE_STRENGTH: f32 = 30.0;

    /// Gaussian sigma for a canvas of the given size.
    pub fn blur_sigma(&self, canvas_width: u32, canvas_height: u32, strength: f32) -> f32 {
        canvas_width.min(canvas_height) as f32 * self.blur_fraction * strength
            / Self::REFERENCE_STRENGTH
    }
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            brightness: 0.7,
            overlay_alpha: 0.2,
            blur_fraction: 0.015,
        }
    }
}
