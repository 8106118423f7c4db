//! Shared types for the photosheet core.

use serde::{Deserialize, Serialize};

use crate::session::RemoteEditError;

/// Re-export `RgbaImage` so downstream crates can pass pixel buffers
/// around without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Width divided by height. Zero-height images report `0.0`.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Errors that can occur anywhere in the photosheet core.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Layout or request parameters are outside their domain
    /// (for example an unsupported photo count).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A computed rectangle violated a geometry invariant.
    #[error("layout invariant violated: {0}")]
    Layout(String),

    /// The remote edit collaborator failed.
    #[error(transparent)]
    RemoteEdit(#[from] RemoteEditError),

    /// A remote edit is in flight; conflicting actions are rejected.
    #[error("an edit is already in progress")]
    Busy,

    /// The session has no image loaded.
    #[error("no image loaded")]
    NoImage,
}

/// Serde-compatible proxy for `PipelineError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidConfig(String),
    Layout(String),
    RemoteEdit(RemoteEditError),
    Busy,
    NoImage,
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
            Self::Layout(s) => PipelineErrorProxy::Layout(s.clone()),
            Self::RemoteEdit(e) => PipelineErrorProxy::RemoteEdit(e.clone()),
            Self::Busy => PipelineErrorProxy::Busy,
            Self::NoImage => PipelineErrorProxy::NoImage,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image error cannot be rebuilt; keep the message
            // as a decoding failure reported through the generic
            // `image` error type.
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::ImageDecode(image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    msg,
                )))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            PipelineErrorProxy::Layout(s) => Self::Layout(s),
            PipelineErrorProxy::RemoteEdit(e) => Self::RemoteEdit(e),
            PipelineErrorProxy::Busy => Self::Busy,
            PipelineErrorProxy::NoImage => Self::NoImage,
        })
    }
}
