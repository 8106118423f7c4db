//! photosheet: bake photo filters and lay out passport photo sheets from
//! the command line.
//!
//! # Usage
//!
//! ```text
//! photosheet bake   <IMAGE> [-o OUT.png] [FILTER OPTIONS] [--vignette]
//! photosheet sheet  <IMAGE> [-o OUT.jpg] [FILTER OPTIONS] [--count 6] [--height 1.8] [--border] [--gradient]
//! photosheet flatten <IMAGE> [-o OUT.png] [--background ffffff]
//! photosheet layout <IMAGE> [SHEET OPTIONS]
//! photosheet style  [FILTER OPTIONS]
//! ```

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use image::Rgb;
use photosheet_export::{DEFAULT_FILE_PREFIX, ExportProfile, encode, export_file_name};
use photosheet_pipeline::{
    Dimensions, FilterModel, PreviewStyle, RenderMode, SheetOptions, bake_for_export,
    compute_layout, composite_on_opaque_background, layout_sheet, render,
};
use tracing::info;

/// Bake photo filters and lay out passport photo sheets.
#[derive(Parser)]
#[command(name = "photosheet", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply filters to a photo and write a lossless PNG.
    Bake {
        /// Input image path (PNG, JPEG, BMP, WebP).
        input: PathBuf,

        /// Output path. Defaults to a timestamped name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Darken the edges with the vignette overlay.
        #[arg(long)]
        vignette: bool,

        /// Write the fast preview approximation instead of the exact bake.
        #[arg(long, conflicts_with = "vignette")]
        preview: bool,
    },

    /// Lay out a 4x6 inch, 300 dpi passport sheet and write a JPEG.
    Sheet {
        /// Input image path (PNG, JPEG, BMP, WebP).
        input: PathBuf,

        /// Output path. Defaults to a timestamped name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Composite a transparent image onto a solid background.
    Flatten {
        /// Input image path.
        input: PathBuf,

        /// Output path. Defaults to a timestamped name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Background color as six hex digits.
        #[arg(long, default_value = "ffffff", value_parser = parse_hex_color)]
        background: Rgb<u8>,
    },

    /// Print the passport sheet geometry for an image as JSON.
    Layout {
        /// Input image path.
        input: PathBuf,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Print the display-time CSS for a filter set as JSON.
    Style {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Filter settings, as individual flags or one JSON document.
#[derive(Args)]
struct FilterArgs {
    /// Brightness percent (0-200).
    #[arg(long, default_value_t = FilterModel::BRIGHTNESS.default)]
    brightness: f32,

    /// Contrast percent (0-200).
    #[arg(long, default_value_t = FilterModel::CONTRAST.default)]
    contrast: f32,

    /// Saturation percent (0-200).
    #[arg(long, default_value_t = FilterModel::SATURATION.default)]
    saturation: f32,

    /// Sepia percent (0-100).
    #[arg(long, default_value_t = FilterModel::SEPIA.default)]
    sepia: f32,

    /// Grayscale percent (0-100).
    #[arg(long, default_value_t = FilterModel::GRAYSCALE.default)]
    grayscale: f32,

    /// Gaussian blur sigma in pixels.
    #[arg(long, default_value_t = FilterModel::BLUR.default)]
    blur: f32,

    /// Sharpness percent (0-100).
    #[arg(long, default_value_t = FilterModel::SHARPNESS.default)]
    sharpness: f32,

    /// Vignette strength percent (0-100).
    #[arg(long = "vignette-strength", default_value_t = FilterModel::VIGNETTE.default)]
    vignette_strength: f32,

    /// Full filter set as a JSON string.
    ///
    /// When provided, all other filter flags are ignored.
    #[arg(long)]
    filters_json: Option<String>,
}

impl FilterArgs {
    /// Build a [`FilterModel`], clamping out-of-range values.
    fn to_model(&self) -> Result<FilterModel, String> {
        if let Some(ref json) = self.filters_json {
            return serde_json::from_str(json)
                .map_err(|e| format!("Error parsing --filters-json: {e}"));
        }
        Ok(FilterModel::new(
            self.brightness,
            self.contrast,
            self.saturation,
            self.sepia,
            self.grayscale,
            self.blur,
            self.sharpness,
            self.vignette_strength,
        ))
    }
}

/// Passport sheet settings, as individual flags or one JSON document.
#[derive(Args)]
struct SheetArgs {
    /// Number of copies: 3, 6, or 9.
    #[arg(long, default_value_t = SheetOptions::DEFAULT_PHOTO_COUNT)]
    count: u32,

    /// Printed photo height in inches (ignored for 9 copies).
    #[arg(long, default_value_t = SheetOptions::DEFAULT_PHOTO_HEIGHT_INCHES)]
    height: f64,

    /// Outline every copy with a 4px black border.
    #[arg(long)]
    border: bool,

    /// Dark gradient background instead of white.
    #[arg(long)]
    gradient: bool,

    /// Full sheet options as a JSON string.
    ///
    /// When provided, all other sheet flags are ignored.
    #[arg(long)]
    sheet_json: Option<String>,
}

impl SheetArgs {
    fn to_options(&self) -> Result<SheetOptions, String> {
        if let Some(ref json) = self.sheet_json {
            return serde_json::from_str(json).map_err(|e| format!("Error parsing --sheet-json: {e}"));
        }
        Ok(SheetOptions {
            photo_height_inches: self.height,
            add_border: self.border,
            photo_count: self.count,
            gradient_background: self.gradient,
        })
    }
}

/// Parse `rrggbb` (with or without a leading `#`).
fn parse_hex_color(s: &str) -> Result<Rgb<u8>, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected six hex digits, got {s:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid color {s:?}: {e}"))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Resolve the output path, defaulting to `<prefix>-<millis>.<ext>`.
fn output_path(output: Option<PathBuf>, profile: ExportProfile) -> PathBuf {
    output.unwrap_or_else(|| {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        PathBuf::from(export_file_name(DEFAULT_FILE_PREFIX, millis, profile))
    })
}

fn read_image(path: &Path) -> Result<photosheet_pipeline::RgbaImage, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "read image");
    Ok(photosheet_pipeline::decode::decode_rgba(&bytes)?)
}

fn write_encoded(
    image: &photosheet_pipeline::RgbaImage,
    profile: ExportProfile,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = output_path(output, profile);
    let encoded = encode(image, profile)?;
    std::fs::write(&path, &encoded.bytes)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    info!(
        path = %path.display(),
        profile = %profile,
        width = encoded.width,
        height = encoded.height,
        bytes = encoded.bytes.len(),
        "wrote image"
    );
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Bake {
            input,
            output,
            filters,
            vignette,
            preview,
        } => {
            let filters = filters.to_model()?;
            let source = read_image(&input)?;
            let result = if preview {
                render(&source, &filters, RenderMode::Preview)
            } else {
                bake_for_export(&source, &filters, vignette)
            };
            write_encoded(&result, ExportProfile::Normal, output)?;
        }
        Command::Sheet {
            input,
            output,
            filters,
            sheet,
        } => {
            let filters = filters.to_model()?;
            let options = sheet.to_options()?;
            let source = read_image(&input)?;
            let result = layout_sheet(&source, &filters, &options)?;
            write_encoded(&result, ExportProfile::Passport, output)?;
        }
        Command::Flatten {
            input,
            output,
            background,
        } => {
            let source = read_image(&input)?;
            let result = composite_on_opaque_background(&source, background);
            write_encoded(&result, ExportProfile::Normal, output)?;
        }
        Command::Layout { input, sheet } => {
            let options = sheet.to_options()?;
            let source = read_image(&input)?;
            let layout = compute_layout(Dimensions::of(&source), &options)?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Command::Style { filters } => {
            let style = PreviewStyle::from_filters(&filters.to_model()?);
            println!("{}", serde_json::to_string_pretty(&style)?);
        }
    }

    Ok(())
}
