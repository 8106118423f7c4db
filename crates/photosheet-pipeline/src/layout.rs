//! Passport sheet geometry.
//!
//! Everything here is pure arithmetic on dimensions: which grid to use,
//! how large each photo is, which part of the source to crop, and where
//! each copy lands on the sheet. Drawing lives in [`crate::sheet`].
//!
//! The sheet is a fixed 4×6 inch card at 300 dpi (1200×1800 px). Each
//! photo keeps the 3.5:4.5 passport aspect ratio, is centered in an
//! equal-sized grid cell, and never exceeds 90% of the cell width.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::types::{Dimensions, PipelineError};

/// The fixed physical print sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalSheetSpec;

impl PhysicalSheetSpec {
    /// Sheet width in inches.
    pub const WIDTH_IN: u32 = 4;
    /// Sheet height in inches.
    pub const HEIGHT_IN: u32 = 6;
    /// Print resolution.
    pub const DPI: u32 = 300;
    /// Canvas width in pixels.
    pub const WIDTH_PX: u32 = Self::WIDTH_IN * Self::DPI;
    /// Canvas height in pixels.
    pub const HEIGHT_PX: u32 = Self::HEIGHT_IN * Self::DPI;

    /// Canvas dimensions in pixels.
    #[must_use]
    pub const fn dimensions() -> Dimensions {
        Dimensions::new(Self::WIDTH_PX, Self::HEIGHT_PX)
    }
}

/// Passport photo aspect ratio, width over height (3.5 : 4.5).
pub const PASSPORT_ASPECT: f64 = 3.5 / 4.5;

/// Largest photo width as a fraction of the cell width.
pub const MAX_CELL_FILL: f64 = 0.9;

/// Number of copies on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoCount {
    /// Three copies: first row and a half of a 2×3 grid.
    Three,
    /// Six copies: full 2×3 grid.
    Six,
    /// Nine copies: full 3×3 grid.
    Nine,
}

impl PhotoCount {
    /// Number of copies.
    #[must_use]
    pub const fn get(self) -> usize {
        match self {
            Self::Three => 3,
            Self::Six => 6,
            Self::Nine => 9,
        }
    }

    /// Grid used for this count.
    #[must_use]
    pub const fn grid(self) -> GridConfig {
        match self {
            Self::Three | Self::Six => GridConfig { cols: 2, rows: 3 },
            Self::Nine => GridConfig { cols: 3, rows: 3 },
        }
    }
}

impl TryFrom<u32> for PhotoCount {
    type Error = PipelineError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::Three),
            6 => Ok(Self::Six),
            9 => Ok(Self::Nine),
            other => Err(PipelineError::InvalidConfig(format!(
                "photo count must be 3, 6, or 9, got {other}"
            ))),
        }
    }
}

impl fmt::Display for PhotoCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Grid of equal cells tiling the full sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of columns.
    pub cols: u32,
    /// Number of rows.
    pub rows: u32,
}

/// User-facing passport sheet parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetOptions {
    /// Requested printed photo height in inches. Ignored for nine
    /// copies, and capped so the photo fits its cell.
    pub photo_height_inches: f64,
    /// Stroke a black border around every copy.
    pub add_border: bool,
    /// Number of copies: 3, 6, or 9.
    pub photo_count: u32,
    /// Dark gray to black gradient instead of white.
    pub gradient_background: bool,
}

impl SheetOptions {
    /// Default printed photo height.
    pub const DEFAULT_PHOTO_HEIGHT_INCHES: f64 = 1.8;
    /// Default number of copies.
    pub const DEFAULT_PHOTO_COUNT: u32 = 6;
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            photo_height_inches: Self::DEFAULT_PHOTO_HEIGHT_INCHES,
            add_border: false,
            photo_count: Self::DEFAULT_PHOTO_COUNT,
            gradient_background: false,
        }
    }
}

/// One placed copy of the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotoRect {
    /// Grid row, zero-based.
    pub row: u32,
    /// Grid column, zero-based.
    pub col: u32,
    /// The cell this copy is centered in, in canvas pixels.
    pub cell: Rect,
    /// Where the photo is drawn, in canvas pixels.
    pub target: Rect,
    /// Horizontal gap between cell edge and photo.
    pub margin_x: f64,
    /// Vertical gap between cell edge and photo.
    pub margin_y: f64,
    /// Region of the source image drawn into `target`.
    pub crop: Rect,
}

/// Complete geometry of a passport sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Canvas size in pixels.
    pub canvas: Dimensions,
    /// Grid shape.
    pub grid: GridConfig,
    /// Cell width in pixels.
    pub cell_width: f64,
    /// Cell height in pixels.
    pub cell_height: f64,
    /// Photo width in pixels.
    pub target_width: f64,
    /// Photo height in pixels.
    pub target_height: f64,
    /// Cover-fit crop shared by every copy, in source pixels.
    pub crop: Rect,
    /// Placed copies in row-major order.
    pub placements: Vec<PhotoRect>,
}

/// Photo size in pixels for `count` copies in a grid with cells
/// `cell_width` wide.
///
/// Nine copies always fill 90% of the cell width. Otherwise the
/// requested height is used unless the resulting width would exceed
/// that cap, in which case the cap wins.
#[must_use]
pub fn target_size(count: PhotoCount, cell_width: f64, photo_height_inches: f64) -> (f64, f64) {
    let max_width = cell_width * MAX_CELL_FILL;
    let width_bounded = (max_width, max_width / PASSPORT_ASPECT);
    if count == PhotoCount::Nine {
        return width_bounded;
    }

    let height = photo_height_inches * f64::from(PhysicalSheetSpec::DPI);
    let width = height * PASSPORT_ASPECT;
    if width > max_width {
        width_bounded
    } else {
        (width, height)
    }
}

/// Largest centered region of `source` with the passport aspect ratio.
///
/// Wider sources lose columns on both sides; taller ones lose rows at
/// top and bottom.
#[must_use]
pub fn cover_fit_crop(source: Dimensions) -> Rect {
    let sw = f64::from(source.width);
    let sh = f64::from(source.height);
    if source.aspect_ratio() > PASSPORT_ASPECT {
        let w = sh * PASSPORT_ASPECT;
        Rect::new((sw - w) / 2.0, 0.0, w, sh)
    } else {
        let h = sw / PASSPORT_ASPECT;
        Rect::new(0.0, (sh - h) / 2.0, sw, h)
    }
}

/// Compute the full sheet geometry for a source of the given size.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the photo count is not
/// 3, 6, or 9 or the photo height is not finite.
/// Returns [`PipelineError::Layout`] if any computed rectangle has a
/// non-positive extent (for example an empty source image or a
/// non-positive photo height), or if a photo rounds to zero whole pixels.
pub fn compute_layout(
    source: Dimensions,
    options: &SheetOptions,
) -> Result<SheetLayout, PipelineError> {
    let count = PhotoCount::try_from(options.photo_count)?;
    if !options.photo_height_inches.is_finite() {
        return Err(PipelineError::InvalidConfig(format!(
            "photo height must be finite, got {}",
            options.photo_height_inches
        )));
    }

    let canvas = PhysicalSheetSpec::dimensions();
    let grid = count.grid();
    let cell_width = f64::from(canvas.width) / f64::from(grid.cols);
    let cell_height = f64::from(canvas.height) / f64::from(grid.rows);

    let (target_width, target_height) =
        target_size(count, cell_width, options.photo_height_inches);
    if !Rect::new(0.0, 0.0, target_width, target_height).is_positive() {
        return Err(PipelineError::Layout(format!(
            "photo size {target_width}x{target_height} is not positive"
        )));
    }

    let crop = cover_fit_crop(source);
    if !crop.is_positive() {
        return Err(PipelineError::Layout(format!(
            "crop of {}x{} source is empty",
            source.width, source.height
        )));
    }

    let margin_x = (cell_width - target_width) / 2.0;
    let margin_y = (cell_height - target_height) / 2.0;

    let placements = (0..grid.rows)
        .flat_map(|row| (0..grid.cols).map(move |col| (row, col)))
        .take(count.get())
        .map(|(row, col)| {
            let cell = Rect::new(
                f64::from(col) * cell_width,
                f64::from(row) * cell_height,
                cell_width,
                cell_height,
            );
            PhotoRect {
                row,
                col,
                cell,
                target: Rect::new(
                    cell.x + margin_x,
                    cell.y + margin_y,
                    target_width,
                    target_height,
                ),
                margin_x,
                margin_y,
                crop,
            }
        })
        .collect::<Vec<_>>();

    if let Some(empty) = placements.iter().find(|p| p.target.snap().is_empty()) {
        return Err(PipelineError::Layout(format!(
            "photo size {target_width}x{target_height} at row {} col {} rounds to zero pixels",
            empty.row, empty.col
        )));
    }

    Ok(SheetLayout {
        canvas,
        grid,
        cell_width,
        cell_height,
        target_width,
        target_height,
        crop,
        placements,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;

    fn options(count: u32, inches: f64) -> SheetOptions {
        SheetOptions {
            photo_count: count,
            photo_height_inches: inches,
            ..SheetOptions::default()
        }
    }

    #[test]
    fn canvas_is_1200_by_1800() {
        assert_eq!(PhysicalSheetSpec::dimensions(), Dimensions::new(1200, 1800));
    }

    #[test]
    fn grid_shapes() {
        assert_eq!(PhotoCount::Three.grid(), GridConfig { cols: 2, rows: 3 });
        assert_eq!(PhotoCount::Six.grid(), GridConfig { cols: 2, rows: 3 });
        assert_eq!(PhotoCount::Nine.grid(), GridConfig { cols: 3, rows: 3 });
        for c in [PhotoCount::Three, PhotoCount::Six, PhotoCount::Nine] {
            let grid = c.grid();
            assert!((grid.cols * grid.rows) as usize >= c.get());
        }
    }

    #[test]
    fn invalid_counts_are_config_errors() {
        for bad in [0, 1, 4, 5, 7, 8, 10, 12] {
            let result = compute_layout(Dimensions::new(100, 100), &options(bad, 1.8));
            assert!(
                matches!(result, Err(PipelineError::InvalidConfig(_))),
                "count {bad} should be rejected"
            );
        }
    }

    #[test]
    fn scenario_six_photos_at_1_8_inches() {
        let layout = compute_layout(Dimensions::new(4000, 3000), &options(6, 1.8)).unwrap();
        assert_eq!(layout.grid, GridConfig { cols: 2, rows: 3 });
        assert_eq!(layout.cell_width, 600.0);
        assert_eq!(layout.cell_height, 600.0);
        assert!((layout.target_height - 540.0).abs() < 1e-9);
        assert!((layout.target_width - 420.0).abs() < 1e-9);
        assert_eq!(layout.placements.len(), 6);
        for p in &layout.placements {
            assert!((p.margin_x - 90.0).abs() < 1e-9);
            assert!((p.margin_y - 30.0).abs() < 1e-9);
            assert!(p.target.height > p.target.width, "expected portrait");
        }
    }

    #[test]
    fn scenario_nine_photos() {
        let layout = compute_layout(Dimensions::new(800, 600), &options(9, 2.2)).unwrap();
        assert_eq!(layout.grid, GridConfig { cols: 3, rows: 3 });
        assert_eq!(layout.cell_width, 400.0);
        assert_eq!(layout.cell_height, 600.0);
        assert!((layout.target_width - 360.0).abs() < 1e-9);
        assert!((layout.target_height - 462.857_142_857).abs() < 1e-6);
        assert_eq!(layout.placements.len(), 9);
    }

    #[test]
    fn oversized_request_falls_back_to_width_cap() {
        // 2.5 in -> 750 px tall, 583 px wide > 0.9 * 600
        let layout = compute_layout(Dimensions::new(300, 400), &options(6, 2.5)).unwrap();
        assert!((layout.target_width - 540.0).abs() < 1e-9);
        assert!((layout.target_height - 540.0 / PASSPORT_ASPECT).abs() < 1e-9);
    }

    #[test]
    fn width_never_exceeds_cap() {
        for count in [3, 6, 9] {
            for tenths in 1..=40 {
                let inches = f64::from(tenths) / 10.0;
                let layout =
                    compute_layout(Dimensions::new(640, 480), &options(count, inches)).unwrap();
                assert!(layout.target_width <= layout.cell_width * MAX_CELL_FILL + 1e-9);
                let aspect = layout.target_width / layout.target_height;
                assert!((aspect - PASSPORT_ASPECT).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn three_photos_use_first_cells_row_major() {
        let layout = compute_layout(Dimensions::new(500, 500), &options(3, 1.8)).unwrap();
        let cells: Vec<(u32, u32)> = layout.placements.iter().map(|p| (p.row, p.col)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn cover_fit_crop_is_passport_aspect_and_inside_source() {
        let sizes = [
            (4000, 3000),
            (3000, 4000),
            (350, 450),
            (1, 1000),
            (1000, 1),
            (1920, 1080),
            (777, 1001),
        ];
        for (w, h) in sizes {
            let crop = cover_fit_crop(Dimensions::new(w, h));
            assert!(
                (crop.aspect_ratio() - PASSPORT_ASPECT).abs() < 1e-9,
                "{w}x{h}: aspect {}",
                crop.aspect_ratio()
            );
            let bounds = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));
            assert!(bounds.contains_rect(&crop, 1e-9), "{w}x{h}: {crop:?}");
        }
    }

    #[test]
    fn landscape_crop_is_horizontally_centered() {
        let crop = cover_fit_crop(Dimensions::new(900, 450));
        assert_eq!(crop.y, 0.0);
        assert_eq!(crop.height, 450.0);
        assert!((crop.x - (900.0 - crop.width) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn portrait_crop_is_vertically_centered() {
        let crop = cover_fit_crop(Dimensions::new(350, 900));
        assert_eq!(crop.x, 0.0);
        assert_eq!(crop.width, 350.0);
        assert!((crop.height - 450.0).abs() < 1e-9);
        assert!((crop.y - 225.0).abs() < 1e-9);
    }

    #[test]
    fn placements_are_disjoint_and_inside_cells_and_canvas() {
        let canvas = PixelRect::new(0, 0, 1200, 1800);
        for count in [3, 6, 9] {
            let layout = compute_layout(Dimensions::new(1024, 768), &options(count, 1.8)).unwrap();
            assert_eq!(layout.placements.len(), count as usize);
            let snapped: Vec<PixelRect> =
                layout.placements.iter().map(|p| p.target.snap()).collect();
            for (i, p) in layout.placements.iter().enumerate() {
                assert!(p.cell.contains_rect(&p.target, 1e-9));
                assert!(p.cell.snap().contains_rect(&snapped[i]));
                assert!(canvas.contains_rect(&snapped[i]));
                for other in &snapped[i + 1..] {
                    assert!(!snapped[i].intersects(other));
                }
            }
        }
    }

    #[test]
    fn empty_source_is_layout_error() {
        let result = compute_layout(Dimensions::new(0, 0), &options(6, 1.8));
        assert!(matches!(result, Err(PipelineError::Layout(_))));
    }

    #[test]
    fn non_positive_height_is_layout_error() {
        let result = compute_layout(Dimensions::new(10, 10), &options(6, 0.0));
        assert!(matches!(result, Err(PipelineError::Layout(_))));
    }

    #[test]
    fn sub_pixel_height_is_layout_error() {
        let result = compute_layout(Dimensions::new(100, 100), &options(6, 0.0005));
        assert!(matches!(result, Err(PipelineError::Layout(ref m)) if m.contains("zero pixels")));
    }

    #[test]
    fn nan_height_is_config_error() {
        let result = compute_layout(Dimensions::new(10, 10), &options(6, f64::NAN));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn sheet_options_json_defaults() {
        let o: SheetOptions = serde_json::from_str(r#"{"photoCount": 9}"#).unwrap();
        assert_eq!(o.photo_count, 9);
        assert_eq!(o.photo_height_inches, 1.8);
        assert!(!o.add_border);
        assert!(!o.gradient_background);
    }
}
