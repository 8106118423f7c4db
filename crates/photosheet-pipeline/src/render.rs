//! Filter rendering: the authoritative bake and the approximate preview.
//!
//! Both paths read the same [`FilterModel`] but are independent code:
//!
//! - [`bake`] applies brightness, contrast, saturation, sepia, and
//!   grayscale one step at a time (clamping after each), then Gaussian
//!   blur, then the 3×3 sharpening kernel. Its output is byte-identical
//!   for identical inputs and is the only output used for export.
//! - [`preview`] folds the five color steps into one matrix applied
//!   without intermediate clamping, then blurs, sharpens, and overlays
//!   the vignette. It is visually equivalent for in-gamut edits but not
//!   numerically exact.

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::color::{ColorMatrix, from_unit, to_unit};
use crate::filters::FilterModel;
use crate::types::{PipelineError, RgbaImage};

/// Which renderer to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
    /// Fast approximation for on-screen display.
    Preview,
    /// Exact pixels for export, print, and passport sheets.
    #[default]
    Bake,
}

/// Render `source` with `filters` in the given mode.
#[must_use]
pub fn render(source: &RgbaImage, filters: &FilterModel, mode: RenderMode) -> RgbaImage {
    match mode {
        RenderMode::Preview => preview(source, filters),
        RenderMode::Bake => bake(source, filters),
    }
}

/// Decode `bytes` and render them.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if the bytes cannot be decoded. Filter values never cause errors.
pub fn render_bytes(
    bytes: &[u8],
    filters: &FilterModel,
    mode: RenderMode,
) -> Result<RgbaImage, PipelineError> {
    let source = crate::decode::decode_rgba(bytes)?;
    Ok(render(&source, filters, mode))
}

/// Materialize `filters` into a new pixel buffer.
///
/// Vignette is not applied; see [`bake_for_export`].
#[must_use = "returns the baked image"]
pub fn bake(source: &RgbaImage, filters: &FilterModel) -> RgbaImage {
    if filters.is_bake_identity() {
        return source.clone();
    }
    let started = Instant::now();

    let steps: Vec<ColorMatrix> = ColorMatrix::steps(filters)
        .into_iter()
        .filter(|m| !m.is_identity())
        .collect();

    let colored = if steps.is_empty() {
        source.clone()
    } else {
        map_rgb(source, |rgb| {
            steps.iter().fold(rgb, |acc, step| step.apply_clamped(acc))
        })
    };

    let blurred = crate::blur::gaussian_blur_rgb(&colored, filters.blur());
    let sharpened = crate::sharpen::sharpen(&blurred, filters.sharpness());

    tracing::debug!(
        width = source.width(),
        height = source.height(),
        color_steps = steps.len(),
        blur = filters.blur(),
        sharpness = filters.sharpness(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "baked filters"
    );
    sharpened
}

/// Bake for a normal (non-passport) export, optionally adding the
/// vignette overlay on top of the baked pixels.
#[must_use = "returns the export-ready image"]
pub fn bake_for_export(
    source: &RgbaImage,
    filters: &FilterModel,
    include_vignette: bool,
) -> RgbaImage {
    let baked = bake(source, filters);
    if include_vignette {
        crate::vignette::apply_vignette(&baked, filters.vignette())
    } else {
        baked
    }
}

/// Cheap approximation of the bake plus the vignette overlay.
#[must_use = "returns the preview image"]
pub fn preview(source: &RgbaImage, filters: &FilterModel) -> RgbaImage {
    let matrix = ColorMatrix::composed(filters);
    let colored = if matrix.is_identity() {
        source.clone()
    } else {
        map_rgb(source, |rgb| matrix.apply(rgb))
    };
    let blurred = crate::blur::gaussian_blur_rgb(&colored, filters.blur());
    let sharpened = crate::sharpen::sharpen(&blurred, filters.sharpness());
    crate::vignette::apply_vignette(&sharpened, filters.vignette())
}

/// Apply `f` to every pixel's normalized RGB, keeping alpha.
fn map_rgb(image: &RgbaImage, f: impl Fn([f32; 3]) -> [f32; 3]) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let [r2, g2, b2] = f([to_unit(r), to_unit(g), to_unit(b)]);
        pixel.0 = [from_unit(r2), from_unit(g2), from_unit(b2), a];
    }
    out
}
