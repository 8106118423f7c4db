//! photosheet-export: Pure encoders for finished images (sans-IO)
//!
//! Normal exports are lossless PNG at the photo's full resolution;
//! passport sheets are 1200×1800 JPEG at quality 95.

pub mod profile;
pub mod raster;

use photosheet_pipeline::PipelineError;

pub use profile::{DEFAULT_FILE_PREFIX, ExportProfile, export_file_name};
pub use raster::{EncodedImage, encode, export_session, to_jpeg, to_png};

/// Errors that can occur while producing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The image encoder failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// There are no pixels to encode.
    #[error("cannot export an empty image")]
    EmptyImage,

    /// Producing the pixels failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
