//! Non-destructive filter parameters.
//!
//! [`FilterModel`] is an immutable value: every constructor and setter
//! clamps its input into the field's declared range, so a model can
//! never hold an out-of-range value and filter values are never a
//! source of errors downstream. `NaN` is replaced by the field default.

use serde::{Deserialize, Serialize};

/// Valid range and default for one filter field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterRange {
    /// Inclusive lower bound.
    pub min: f32,
    /// Inclusive upper bound.
    pub max: f32,
    /// Identity value.
    pub default: f32,
}

impl FilterRange {
    const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp `value` into this range, mapping `NaN` to the default.
    #[must_use]
    pub fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Adjustment set applied to a photo.
///
/// Percent fields use 100 as identity for the multipliers
/// (brightness, contrast, saturation) and 0 for the blends
/// (sepia, grayscale). `blur` is a Gaussian sigma in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FilterSettings", rename_all = "camelCase")]
pub struct FilterModel {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    sepia: f32,
    grayscale: f32,
    blur: f32,
    sharpness: f32,
    vignette: f32,
}

impl FilterModel {
    /// Brightness multiplier, percent.
    pub const BRIGHTNESS: FilterRange = FilterRange::new(0.0, 200.0, 100.0);
    /// Contrast multiplier around mid-gray, percent.
    pub const CONTRAST: FilterRange = FilterRange::new(0.0, 200.0, 100.0);
    /// Saturation multiplier, percent.
    pub const SATURATION: FilterRange = FilterRange::new(0.0, 200.0, 100.0);
    /// Sepia blend, percent.
    pub const SEPIA: FilterRange = FilterRange::new(0.0, 100.0, 0.0);
    /// Grayscale blend, percent.
    pub const GRAYSCALE: FilterRange = FilterRange::new(0.0, 100.0, 0.0);
    /// Gaussian blur sigma in pixels. Unbounded above.
    pub const BLUR: FilterRange = FilterRange::new(0.0, f32::MAX, 0.0);
    /// Unsharp strength, percent.
    pub const SHARPNESS: FilterRange = FilterRange::new(0.0, 100.0, 0.0);
    /// Vignette strength, percent.
    pub const VIGNETTE: FilterRange = FilterRange::new(0.0, 100.0, 0.0);

    /// Build a model from raw values, clamping each into range.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        brightness: f32,
        contrast: f32,
        saturation: f32,
        sepia: f32,
        grayscale: f32,
        blur: f32,
        sharpness: f32,
        vignette: f32,
    ) -> Self {
        Self {
            brightness: Self::BRIGHTNESS.clamp(brightness),
            contrast: Self::CONTRAST.clamp(contrast),
            saturation: Self::SATURATION.clamp(saturation),
            sepia: Self::SEPIA.clamp(sepia),
            grayscale: Self::GRAYSCALE.clamp(grayscale),
            blur: Self::BLUR.clamp(blur),
            sharpness: Self::SHARPNESS.clamp(sharpness),
            vignette: Self::VIGNETTE.clamp(vignette),
        }
    }

    /// Brightness percent in `[0, 200]`.
    #[must_use]
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Contrast percent in `[0, 200]`.
    #[must_use]
    pub const fn contrast(&self) -> f32 {
        self.contrast
    }

    /// Saturation percent in `[0, 200]`.
    #[must_use]
    pub const fn saturation(&self) -> f32 {
        self.saturation
    }

    /// Sepia percent in `[0, 100]`.
    #[must_use]
    pub const fn sepia(&self) -> f32 {
        self.sepia
    }

    /// Grayscale percent in `[0, 100]`.
    #[must_use]
    pub const fn grayscale(&self) -> f32 {
        self.grayscale
    }

    /// Blur sigma in pixels, non-negative.
    #[must_use]
    pub const fn blur(&self) -> f32 {
        self.blur
    }

    /// Sharpness percent in `[0, 100]`.
    #[must_use]
    pub const fn sharpness(&self) -> f32 {
        self.sharpness
    }

    /// Vignette percent in `[0, 100]`.
    #[must_use]
    pub const fn vignette(&self) -> f32 {
        self.vignette
    }

    /// Copy with a new brightness.
    #[must_use]
    pub fn with_brightness(self, value: f32) -> Self {
        Self {
            brightness: Self::BRIGHTNESS.clamp(value),
            ..self
        }
    }

    /// Copy with a new contrast.
    #[must_use]
    pub fn with_contrast(self, value: f32) -> Self {
        Self {
            contrast: Self::CONTRAST.clamp(value),
            ..self
        }
    }

    /// Copy with a new saturation.
    #[must_use]
    pub fn with_saturation(self, value: f32) -> Self {
        Self {
            saturation: Self::SATURATION.clamp(value),
            ..self
        }
    }

    /// Copy with a new sepia blend.
    #[must_use]
    pub fn with_sepia(self, value: f32) -> Self {
        Self {
            sepia: Self::SEPIA.clamp(value),
            ..self
        }
    }

    /// Copy with a new grayscale blend.
    #[must_use]
    pub fn with_grayscale(self, value: f32) -> Self {
        Self {
            grayscale: Self::GRAYSCALE.clamp(value),
            ..self
        }
    }

    /// Copy with a new blur sigma.
    #[must_use]
    pub fn with_blur(self, value: f32) -> Self {
        Self {
            blur: Self::BLUR.clamp(value),
            ..self
        }
    }

    /// Copy with a new sharpness.
    #[must_use]
    pub fn with_sharpness(self, value: f32) -> Self {
        Self {
            sharpness: Self::SHARPNESS.clamp(value),
            ..self
        }
    }

    /// Copy with a new vignette strength.
    #[must_use]
    pub fn with_vignette(self, value: f32) -> Self {
        Self {
            vignette: Self::VIGNETTE.clamp(value),
            ..self
        }
    }

    /// Whether the five per-pixel color steps are all at identity.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_color_identity(&self) -> bool {
        self.brightness == Self::BRIGHTNESS.default
            && self.contrast == Self::CONTRAST.default
            && self.saturation == Self::SATURATION.default
            && self.sepia == Self::SEPIA.default
            && self.grayscale == Self::GRAYSCALE.default
    }

    /// Whether baking with this model leaves pixels unchanged.
    ///
    /// Vignette is not part of the bake, so it is ignored here.
    #[must_use]
    pub fn is_bake_identity(&self) -> bool {
        self.is_color_identity() && self.blur <= 0.0 && self.sharpness <= 0.0
    }
}

impl Default for FilterModel {
    fn default() -> Self {
        Self {
            brightness: Self::BRIGHTNESS.default,
            contrast: Self::CONTRAST.default,
            saturation: Self::SATURATION.default,
            sepia: Self::SEPIA.default,
            grayscale: Self::GRAYSCALE.default,
            blur: Self::BLUR.default,
            sharpness: Self::SHARPNESS.default,
            vignette: Self::VIGNETTE.default,
        }
    }
}

/// Unvalidated wire form of [`FilterModel`].
///
/// Deserialization goes through this type so JSON input is clamped the
/// same way as the constructors. Missing keys take their defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FilterSettings {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    sepia: f32,
    grayscale: f32,
    blur: f32,
    sharpness: f32,
    vignette: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let d = FilterModel::default();
        Self {
            brightness: d.brightness,
            contrast: d.contrast,
            saturation: d.saturation,
            sepia: d.sepia,
            grayscale: d.grayscale,
            blur: d.blur,
            sharpness: d.sharpness,
            vignette: d.vignette,
        }
    }
}

impl From<FilterSettings> for FilterModel {
    fn from(s: FilterSettings) -> Self {
        Self::new(
            s.brightness,
            s.contrast,
            s.saturation,
            s.sepia,
            s.grayscale,
            s.blur,
            s.sharpness,
            s.vignette,
        )
    }
}
