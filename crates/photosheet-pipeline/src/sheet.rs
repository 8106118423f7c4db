//! Passport sheet drawing.
//!
//! Turns a [`SheetLayout`] into pixels: fill the background, draw the
//! baked photo into every placement, and optionally outline each copy.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use web_time::Instant;

use crate::composite::blend_channel;
use crate::filters::FilterModel;
use crate::geometry::{PixelRect, Rect};
use crate::layout::{SheetLayout, SheetOptions, compute_layout};
use crate::types::{Dimensions, PipelineError};

/// Border stroke width in pixels, drawn inside the placement.
pub const BORDER_WIDTH: u32 = 4;

/// Border color.
pub const BORDER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Gradient top color (`#333333`).
pub const GRADIENT_TOP: u8 = 0x33;

/// Gradient bottom color (`#000000`).
pub const GRADIENT_BOTTOM: u8 = 0x00;

/// Sheet background fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Background {
    /// Solid white.
    #[default]
    White,
    /// Vertical linear gradient from dark gray at the top to black.
    Gradient,
}

impl Background {
    /// Background selected by the sheet options.
    #[must_use]
    pub const fn from_options(options: &SheetOptions) -> Self {
        if options.gradient_background {
            Self::Gradient
        } else {
            Self::White
        }
    }

    /// Color of row `y` on a canvas `height` pixels tall.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn row_color(self, y: u32, height: u32) -> Rgba<u8> {
        match self {
            Self::White => Rgba([255, 255, 255, 255]),
            Self::Gradient => {
                // Sample at the pixel center.
                let t = ((f64::from(y) + 0.5) / f64::from(height.max(1))).clamp(0.0, 1.0);
                let top = f64::from(GRADIENT_TOP);
                let bottom = f64::from(GRADIENT_BOTTOM);
                let v = (top + (bottom - top) * t).round() as u8;
                Rgba([v, v, v, 255])
            }
        }
    }

    /// A fresh canvas filled with this background.
    #[must_use]
    pub fn fill(self, canvas: Dimensions) -> RgbaImage {
        RgbaImage::from_fn(canvas.width, canvas.height, |_, y| {
            self.row_color(y, canvas.height)
        })
    }
}

/// Region of a `source`-sized image to sample for `crop`.
///
/// Snaps to whole pixels, clamps to the source bounds, and keeps at
/// least one pixel in each direction.
#[must_use]
pub fn source_region(crop: &Rect, source: Dimensions) -> PixelRect {
    let snapped = crop.snap();
    let x = snapped.x.min(source.width.saturating_sub(1));
    let y = snapped.y.min(source.height.saturating_sub(1));
    let width = snapped.width.clamp(1, (source.width - x).max(1));
    let height = snapped.height.clamp(1, (source.height - y).max(1));
    PixelRect::new(x, y, width, height)
}

/// Draw an already-baked photo onto a sheet according to `layout`.
///
/// The crop is resampled once and reused for every placement since all
/// copies share the same target size.
///
/// # Errors
///
/// Returns [`PipelineError::Layout`] if a snapped placement is empty or
/// falls outside the canvas, or if `baked` has no pixels.
pub fn draw_sheet(
    baked: &RgbaImage,
    layout: &SheetLayout,
    options: &SheetOptions,
) -> Result<RgbaImage, PipelineError> {
    let source = Dimensions::of(baked);
    if source.width == 0 || source.height == 0 {
        return Err(PipelineError::Layout(format!(
            "cannot draw a {}x{} source",
            source.width, source.height
        )));
    }

    let mut canvas = Background::from_options(options).fill(layout.canvas);
    let canvas_rect = PixelRect::new(0, 0, layout.canvas.width, layout.canvas.height);

    let region = source_region(&layout.crop, source);
    let cropped =
        imageops::crop_imm(baked, region.x, region.y, region.width, region.height).to_image();

    let mut scaled: Option<RgbaImage> = None;
    for placement in &layout.placements {
        let target = placement.target.snap();
        if target.is_empty() || !canvas_rect.contains_rect(&target) {
            return Err(PipelineError::Layout(format!(
                "placement at row {} col {} snapped to {target:?}",
                placement.row, placement.col
            )));
        }

        let photo = match scaled.take() {
            Some(img) if img.dimensions() == (target.width, target.height) => img,
            _ => imageops::resize(&cropped, target.width, target.height, FilterType::CatmullRom),
        };
        paint_over(&mut canvas, &photo, target.x, target.y);
        scaled = Some(photo);

        if options.add_border {
            draw_border(&mut canvas, target);
        }
    }

    Ok(canvas)
}

/// Source-over composite of `photo` onto the opaque `canvas` at `(x, y)`.
fn paint_over(canvas: &mut RgbaImage, photo: &RgbaImage, x: u32, y: u32) {
    for (px, py, src) in photo.enumerate_pixels() {
        let dst = canvas.get_pixel_mut(x + px, y + py);
        let [r, g, b, a] = src.0;
        dst.0 = [
            blend_channel(r, dst.0[0], a),
            blend_channel(g, dst.0[1], a),
            blend_channel(b, dst.0[2], a),
            255,
        ];
    }
}

/// Stroke a [`BORDER_WIDTH`] pixel outline inside `rect`.
#[allow(clippy::cast_possible_wrap)]
fn draw_border(canvas: &mut RgbaImage, rect: PixelRect) {
    for inset in 0..BORDER_WIDTH {
        let width = rect.width.saturating_sub(2 * inset);
        let height = rect.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let outline = imageproc::rect::Rect::at((rect.x + inset) as i32, (rect.y + inset) as i32)
            .of_size(width, height);
        draw_hollow_rect_mut(canvas, outline, BORDER_COLOR);
    }
}

/// Build a complete passport sheet from `source`.
///
/// Filters are baked once and the result is shared by every copy.
/// Vignette is never applied.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for an unsupported photo
/// count or non-finite photo height, and [`PipelineError::Layout`] when
/// the geometry degenerates (for example an empty source).
pub fn layout_sheet(
    source: &RgbaImage,
    filters: &FilterModel,
    options: &SheetOptions,
) -> Result<RgbaImage, PipelineError> {
    let started = Instant::now();
    let layout = compute_layout(Dimensions::of(source), options)?;
    let baked = crate::render::bake(source, filters);
    let sheet = draw_sheet(&baked, &layout, options)?;

    tracing::debug!(
        photo_count = options.photo_count,
        cols = layout.grid.cols,
        rows = layout.grid.rows,
        target_width = layout.target_width,
        target_height = layout.target_height,
        border = options.add_border,
        gradient = options.gradient_background,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "laid out passport sheet"
    );
    Ok(sheet)
}

/// Decode `bytes` and build a passport sheet from them.
///
/// # Errors
///
/// Decode errors from [`crate::decode::decode_rgba`] plus everything
/// [`layout_sheet`] can return.
pub fn layout_sheet_from_bytes(
    bytes: &[u8],
    filters: &FilterModel,
    options: &SheetOptions,
) -> Result<RgbaImage, PipelineError> {
    let source = crate::decode::decode_rgba(bytes)?;
    layout_sheet(&source, filters, options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::layout::PhysicalSheetSpec;

    const RED: Rgba<u8> = Rgba([220, 30, 40, 255]);

    fn options(count: u32, border: bool, gradient: bool) -> SheetOptions {
        SheetOptions {
            photo_count: count,
            add_border: border,
            gradient_background: gradient,
            ..SheetOptions::default()
        }
    }

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, RED)
    }

    fn snapped_targets(source: &RgbaImage, opts: &SheetOptions) -> Vec<PixelRect> {
        compute_layout(Dimensions::of(source), opts)
            .unwrap()
            .placements
            .iter()
            .map(|p| p.target.snap())
            .collect()
    }

    #[test]
    fn sheet_is_canvas_sized() {
        let sheet = layout_sheet(&solid(64, 48), &FilterModel::default(), &options(6, false, false))
            .unwrap();
        assert_eq!(
            sheet.dimensions(),
            (PhysicalSheetSpec::WIDTH_PX, PhysicalSheetSpec::HEIGHT_PX)
        );
    }

    #[test]
    fn sheet_is_deterministic() {
        let src = RgbaImage::from_fn(50, 70, |x, y| {
            Rgba([(x * 5) as u8, (y * 3) as u8, 90, 255])
        });
        let filters = FilterModel::default().with_contrast(130.0).with_sharpness(25.0);
        let opts = options(9, true, true);
        let a = layout_sheet(&src, &filters, &opts).unwrap();
        let b = layout_sheet(&src, &filters, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn border_drawn_inside_placement_and_background_untouched() {
        let src = solid(70, 90);
        let opts = options(6, true, false);
        let sheet = layout_sheet(&src, &FilterModel::default(), &opts).unwrap();
        for t in snapped_targets(&src, &opts) {
            let (cx, cy) = (t.x + t.width / 2, t.y + t.height / 2);
            // Outer edge and innermost border ring are black.
            assert_eq!(*sheet.get_pixel(t.x, t.y), BORDER_COLOR);
            assert_eq!(*sheet.get_pixel(t.right() - 1, t.bottom() - 1), BORDER_COLOR);
            assert_eq!(*sheet.get_pixel(t.x + BORDER_WIDTH - 1, cy), BORDER_COLOR);
            assert_eq!(*sheet.get_pixel(cx, t.y + BORDER_WIDTH - 1), BORDER_COLOR);
            // Just inside the stroke is the photo.
            assert_eq!(*sheet.get_pixel(t.x + BORDER_WIDTH, cy), RED);
            assert_eq!(*sheet.get_pixel(cx, cy), RED);
            // Just outside the placement is background.
            assert_eq!(sheet.get_pixel(t.x - 1, cy).0, [255, 255, 255, 255]);
            assert_eq!(sheet.get_pixel(cx, t.bottom()).0, [255, 255, 255, 255]);
        }
    }

    #[test]
    fn no_border_means_photo_reaches_edge() {
        let src = solid(70, 90);
        let opts = options(6, false, false);
        let sheet = layout_sheet(&src, &FilterModel::default(), &opts).unwrap();
        for t in snapped_targets(&src, &opts) {
            assert_eq!(*sheet.get_pixel(t.x, t.y + t.height / 2), RED);
        }
    }

    #[test]
    fn background_outside_placements_matches_fill() {
        let src = solid(40, 40);
        for gradient in [false, true] {
            let opts = options(3, true, gradient);
            let sheet = layout_sheet(&src, &FilterModel::default(), &opts).unwrap();
            let targets = snapped_targets(&src, &opts);
            let bg = Background::from_options(&opts);
            for (x, y, p) in sheet.enumerate_pixels() {
                if targets.iter().any(|t| t.contains(x, y)) {
                    continue;
                }
                assert_eq!(*p, bg.row_color(y, sheet.height()), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn gradient_runs_dark_gray_to_black() {
        let bg = Background::Gradient;
        assert_eq!(bg.row_color(0, 1800).0, [51, 51, 51, 255]);
        assert_eq!(bg.row_color(1799, 1800).0, [0, 0, 0, 255]);
        let mid = bg.row_color(900, 1800).0[0];
        assert!(mid > 0 && mid < 51);
        let rows: Vec<u8> = (0..1800).map(|y| bg.row_color(y, 1800).0[0]).collect();
        assert!(rows.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn filters_are_baked_into_copies() {
        let src = solid(30, 40);
        let opts = options(6, false, false);
        let sheet = layout_sheet(&src, &FilterModel::default().with_grayscale(100.0), &opts)
            .unwrap();
        let t = snapped_targets(&src, &opts)[0];
        let p = sheet.get_pixel(t.x + t.width / 2, t.y + t.height / 2).0;
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn vignette_is_not_applied_to_sheets() {
        let src = solid(30, 40);
        let opts = options(6, false, false);
        let plain = layout_sheet(&src, &FilterModel::default(), &opts).unwrap();
        let vignetted =
            layout_sheet(&src, &FilterModel::default().with_vignette(100.0), &opts).unwrap();
        assert_eq!(plain, vignetted);
    }

    #[test]
    fn invalid_count_rejected_before_drawing() {
        let result = layout_sheet(&solid(10, 10), &FilterModel::default(), &options(4, false, false));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn empty_source_is_layout_error() {
        let result = layout_sheet(&RgbaImage::new(0, 0), &FilterModel::default(), &options(6, false, false));
        assert!(matches!(result, Err(PipelineError::Layout(_))));
    }

    #[test]
    fn source_region_keeps_a_pixel_for_thin_sources() {
        let dims = Dimensions::new(1000, 1);
        let region = source_region(&crate::layout::cover_fit_crop(dims), dims);
        assert!(region.width >= 1 && region.height >= 1);
        assert!(PixelRect::new(0, 0, 1000, 1).contains_rect(&region));
    }

    #[test]
    fn from_bytes_matches_in_memory() {
        let src = solid(20, 30);
        let png = crate::decode::encode_png(&src).unwrap();
        let opts = options(9, false, true);
        assert_eq!(
            layout_sheet_from_bytes(&png, &FilterModel::default(), &opts).unwrap(),
            layout_sheet(&src, &FilterModel::default(), &opts).unwrap()
        );
    }
}
