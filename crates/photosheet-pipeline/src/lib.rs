//! photosheet-pipeline: Photo filter, compositing, and passport sheet
//! core (sans-IO).
//!
//! Takes one source photo plus a [`FilterModel`] and produces:
//!
//! - a fast approximate preview ([`render`] in [`RenderMode::Preview`],
//!   or a host-native [`PreviewStyle`]),
//! - the exact baked pixels used for export ([`RenderMode::Bake`]),
//! - a 4×6 inch, 300 dpi passport sheet with 3, 6, or 9 cropped copies
//!   ([`layout_sheet`]).
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers. Encoding for download lives in
//! `photosheet-export`; browser and filesystem glue live in
//! `photosheet-worker` and `photosheet-cli`.

pub mod blur;
pub mod color;
pub mod composite;
pub mod decode;
pub mod filters;
pub mod geometry;
pub mod layout;
pub mod preview;
pub mod render;
pub mod session;
pub mod sharpen;
pub mod sheet;
pub mod types;
pub mod vignette;

use serde::{Deserialize, Serialize};

pub use composite::{WHITE, composite_on_opaque_background, flatten_bytes};
pub use filters::FilterModel;
pub use layout::{PhotoCount, SheetLayout, SheetOptions, compute_layout};
pub use preview::{PreviewInputs, PreviewScheduler, PreviewStyle, PreviewTicket};
pub use render::{RenderMode, bake, bake_for_export, render, render_bytes};
pub use session::{AiAction, EditSession, HistoryStack, RemoteEditError, RemoteEditor};
pub use sheet::{layout_sheet, layout_sheet_from_bytes};
pub use types::{Dimensions, PipelineError, RgbaImage};

/// One unit of work for an off-thread renderer.
///
/// Serialized as JSON when crossing the worker boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderRequest {
    /// Approximate on-screen rendering, vignette included.
    #[serde(rename_all = "camelCase")]
    Preview {
        /// Filter settings.
        #[serde(default)]
        filters: FilterModel,
    },
    /// Exact baked photo for a normal export.
    #[serde(rename_all = "camelCase")]
    Bake {
        /// Filter settings.
        #[serde(default)]
        filters: FilterModel,
        /// Apply the vignette overlay on top of the bake.
        #[serde(default)]
        include_vignette: bool,
    },
    /// Passport sheet.
    #[serde(rename_all = "camelCase")]
    Sheet {
        /// Filter settings.
        #[serde(default)]
        filters: FilterModel,
        /// Sheet parameters.
        #[serde(default)]
        options: SheetOptions,
    },
}

/// Decode `image_bytes` and run `request` on them.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Sheet requests can also fail with [`PipelineError::InvalidConfig`] or
/// [`PipelineError::Layout`].
pub fn process(image_bytes: &[u8], request: &RenderRequest) -> Result<RgbaImage, PipelineError> {
    let source = decode::decode_rgba(image_bytes)?;
    match request {
        RenderRequest::Preview { filters } => Ok(render(&source, filters, RenderMode::Preview)),
        RenderRequest::Bake {
            filters,
            include_vignette,
        } => Ok(bake_for_export(&source, filters, *include_vignette)),
        RenderRequest::Sheet { filters, options } => layout_sheet(&source, filters, options),
    }
}
