//! Live preview support.
//!
//! Two concerns live here:
//!
//! - [`PreviewStyle`] describes the filters in the vocabulary a browser
//!   host applies at display time (a CSS `filter` list, an SVG
//!   `feConvolveMatrix` kernel, and an inset `box-shadow`), so the normal
//!   editing view never materializes pixels.
//! - [`PreviewScheduler`] decides when the passport preview must be
//!   regenerated and drops results that were superseded while in flight.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::filters::FilterModel;
use crate::layout::SheetOptions;
use crate::sharpen::sharpen_kernel;
use crate::types::RgbaImage;

/// Id of the SVG filter element the host declares for sharpening.
pub const SHARPEN_FILTER_ID: &str = "sharpness-filter";

/// Display-time rendering of a [`FilterModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStyle {
    /// Value for the CSS `filter` property.
    pub filter: String,
    /// `kernelMatrix` attribute for a 3×3 `feConvolveMatrix` with
    /// `preserveAlpha="true"`.
    pub kernel_matrix: String,
    /// Value for the CSS `box-shadow` property of the vignette overlay,
    /// or `none`.
    pub box_shadow: String,
}

impl PreviewStyle {
    /// Build the style for `filters`.
    ///
    /// Color functions are listed in bake order. The sharpening filter
    /// reference is only included when sharpness is non-zero.
    #[must_use]
    pub fn from_filters(filters: &FilterModel) -> Self {
        let mut filter = format!(
            "brightness({}%) contrast({}%) saturate({}%) sepia({}%) grayscale({}%) blur({}px)",
            filters.brightness(),
            filters.contrast(),
            filters.saturation(),
            filters.sepia(),
            filters.grayscale(),
            filters.blur(),
        );
        if filters.sharpness() > 0.0 {
            filter.push_str(&format!(" url(#{SHARPEN_FILTER_ID})"));
        }

        let kernel_matrix = sharpen_kernel(filters.sharpness())
            .iter()
            .flatten()
            .map(|v| format_number(*v))
            .collect::<Vec<_>>()
            .join(" ");

        let v = filters.vignette();
        let box_shadow = if v > 0.0 {
            format!("inset 0 0 {}px {}px rgba(0,0,0,0.8)", v * 2.0, v)
        } else {
            "none".to_string()
        };

        Self {
            filter,
            kernel_matrix,
            box_shadow,
        }
    }
}

/// Format without a trailing `.0` and without negative zero.
fn format_number(v: f32) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

/// Content fingerprint of a pixel buffer.
///
/// SipHash-1-3 with fixed keys over the dimensions and raw RGBA bytes,
/// so equal images always fingerprint equal across runs and targets.
#[must_use]
pub fn fingerprint(image: &RgbaImage) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0x7068_6f74_6f73_6865, 0x6574_5f70_7265_7669);
    hasher.write_u32(image.width());
    hasher.write_u32(image.height());
    hasher.write(image.as_raw());
    hasher.finish()
}

/// Everything a passport preview depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInputs {
    /// [`fingerprint`] of the current source image.
    pub source_fingerprint: u64,
    /// Current filter settings.
    pub filters: FilterModel,
    /// Sheet options when passport mode is on.
    pub sheet: Option<SheetOptions>,
}

impl PreviewInputs {
    /// Inputs for `source` under `filters`, fingerprinting the pixels.
    #[must_use]
    pub fn new(source: &RgbaImage, filters: FilterModel, sheet: Option<SheetOptions>) -> Self {
        Self {
            source_fingerprint: fingerprint(source),
            filters,
            sheet,
        }
    }
}

/// Handle for one in-flight preview regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreviewTicket {
    /// Monotonic request number, echoed back by the worker.
    pub generation: u64,
}

/// Last-write-wins coordination of preview regenerations.
///
/// Each change of inputs issues a new ticket; only the result carrying
/// the newest ticket is accepted. Results for older tickets are
/// dropped even if they arrive later.
#[derive(Debug, Default)]
pub struct PreviewScheduler {
    generation: u64,
    last_inputs: Option<PreviewInputs>,
    delivered: bool,
}

impl PreviewScheduler {
    /// Scheduler with no request issued yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a regeneration for `inputs`.
    ///
    /// Returns `None` when `inputs` equal the most recent request, in
    /// which case the in-flight or delivered preview is still valid.
    pub fn request(&mut self, inputs: PreviewInputs) -> Option<PreviewTicket> {
        if self.last_inputs.as_ref() == Some(&inputs) {
            tracing::trace!(generation = self.generation, "preview inputs unchanged");
            return None;
        }
        Some(self.force_request(inputs))
    }

    /// Issue a new ticket even if `inputs` did not change.
    pub fn force_request(&mut self, inputs: PreviewInputs) -> PreviewTicket {
        self.generation += 1;
        self.last_inputs = Some(inputs);
        self.delivered = false;
        tracing::debug!(generation = self.generation, "preview requested");
        PreviewTicket {
            generation: self.generation,
        }
    }

    /// Whether `ticket` is the most recent request.
    #[must_use]
    pub const fn is_current(&self, ticket: PreviewTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Whether the result for the most recent request has been accepted.
    #[must_use]
    pub const fn is_up_to_date(&self) -> bool {
        self.delivered
    }

    /// Accept `result` if it belongs to the most recent request.
    ///
    /// Stale results are dropped and `None` is returned.
    pub fn accept<T>(&mut self, ticket: PreviewTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            self.delivered = true;
            Some(result)
        } else {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "dropping superseded preview"
            );
            None
        }
    }

    /// Forget the last inputs so the next request always issues a ticket.
    ///
    /// Outstanding tickets stay valid until a new request supersedes
    /// them.
    pub fn invalidate(&mut self) {
        self.last_inputs = None;
        self.delivered = false;
    }
}
