//! Radial darkening overlay.
//!
//! Not part of the bake: callers opt in for normal exports and the
//! materialized preview, and never apply it to passport sheets.

use crate::color::smoothstep;
use crate::types::RgbaImage;

/// Peak darkening at full strength, matching an 80% black inset shadow.
pub const MAX_DARKENING: f32 = 0.8;

/// Multiplicative RGB factor for a pixel at normalized distance `d`
/// (0 at the center, 1 at the corners) for `strength` percent.
#[must_use]
pub fn vignette_factor(strength: f32, d: f32) -> f32 {
    let v = (strength / 100.0).clamp(0.0, 1.0);
    if v <= 0.0 {
        return 1.0;
    }
    (MAX_DARKENING * v).mul_add(-smoothstep(1.0 - v, 1.0, d), 1.0)
}

/// Darken `image` toward its edges by `strength` percent (`[0, 100]`).
///
/// Alpha is unchanged. Zero strength returns a copy.
#[must_use = "returns the vignetted image"]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn apply_vignette(image: &RgbaImage, strength: f32) -> RgbaImage {
    if strength <= 0.0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;

    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = (x as f32 + 0.5 - cx) / cx.max(0.5);
        let dy = (y as f32 + 0.5 - cy) / cy.max(0.5);
        let d = dx.hypot(dy) / std::f32::consts::SQRT_2;
        let factor = vignette_factor(strength, d);
        for c in 0..3 {
            pixel.0[c] = (f32::from(pixel.0[c]) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
