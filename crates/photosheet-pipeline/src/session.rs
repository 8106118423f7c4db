//! The single active edit session.
//!
//! [`EditSession`] owns the current image, the filter settings, the
//! passport sheet options, and the undo history. Remote (generative)
//! edits run through an injected [`RemoteEditor`] and follow a two-phase
//! protocol so a host can await the remote call without holding a
//! borrow of the session:
//!
//! 1. [`EditSession::begin_remote_edit`] snapshots the current image
//!    into history, marks the session busy, and hands back the PNG
//!    payload to send.
//! 2. [`EditSession::finish_remote_edit`] clears the busy flag and, on
//!    success, installs the returned image.
//!
//! While busy, filter edits, image loads, exports, undo, and further
//! remote edits are rejected with [`PipelineError::Busy`].

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::composite::{WHITE, composite_on_opaque_background};
use crate::decode::{decode_rgba, encode_png};
use crate::filters::FilterModel;
use crate::layout::SheetOptions;
use crate::preview::PreviewInputs;
use crate::render::{RenderMode, bake_for_export, render};
use crate::sheet::layout_sheet;
use crate::types::{PipelineError, RgbaImage};

/// Failure reported by the remote edit collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RemoteEditError {
    /// The service rejected the credentials.
    #[error("the remote edit service rejected the API key")]
    InvalidCredentials,

    /// The service answered without an image.
    #[error("no image data found in the remote edit response")]
    NoImageReturned,

    /// Any other remote failure.
    #[error("remote edit failed: {0}")]
    Remote(String),
}

/// Capability for generative image edits.
///
/// `image` is an encoded image (PNG) or `None` for prompt-only
/// generation. The returned bytes are any format [`decode_rgba`]
/// accepts.
pub trait RemoteEditor {
    /// Run one edit.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteEditError`] describing why no image came back.
    fn edit(&self, image: Option<&[u8]>, instruction: &str) -> Result<Vec<u8>, RemoteEditError>;
}

impl<F> RemoteEditor for F
where
    F: Fn(Option<&[u8]>, &str) -> Result<Vec<u8>, RemoteEditError>,
{
    fn edit(&self, image: Option<&[u8]>, instruction: &str) -> Result<Vec<u8>, RemoteEditError> {
        self(image, instruction)
    }
}

const REMOVE_BACKGROUND_INSTRUCTION: &str = "Remove the background of this image. \
Make the background transparent. Keep the main subject sharp and clear.";

const FORMAL_SUIT_INSTRUCTION: &str = "Take the person in this image, which has a transparent \
background, and realistically dress them in a formal dark business suit with a white collared \
shirt and a simple, professional tie. Preserve the person's head, face, and neck exactly as \
they are. Ensure the added clothing looks natural and fits the person's posture. Most \
importantly, maintain the transparent background of the original image.";

const HIJAB_INSTRUCTION: &str = "Take the person in this image, which has a transparent \
background, and realistically dress them in a modest, elegant Hijab (Islamic headscarf) that \
covers the hair and neck completely. Ensure the face remains fully visible, clear, and natural. \
The Hijab should be simple, professional, and well-fitted, perhaps in a neutral color like \
white, grey, or black. Maintain the person's posture and facial features exactly. Most \
importantly, maintain the transparent background of the original image.";

/// A generative edit the session can request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "prompt", rename_all = "camelCase")]
pub enum AiAction {
    /// Cut out the subject; the result is flattened onto white.
    RemoveBackground,
    /// Dress the subject in a business suit.
    FormalSuit,
    /// Add a headscarf to the subject.
    Hijab,
    /// Free-form instruction; works with or without a loaded image.
    FreeForm(String),
}

impl AiAction {
    /// Instruction text sent to the remote editor.
    #[must_use]
    pub fn instruction(&self) -> &str {
        match self {
            Self::RemoveBackground => REMOVE_BACKGROUND_INSTRUCTION,
            Self::FormalSuit => FORMAL_SUIT_INSTRUCTION,
            Self::Hijab => HIJAB_INSTRUCTION,
            Self::FreeForm(prompt) => prompt.trim(),
        }
    }

    /// Whether the action needs a loaded image.
    #[must_use]
    pub const fn requires_image(&self) -> bool {
        !matches!(self, Self::FreeForm(_))
    }

    /// Whether the result is composited onto white before use.
    #[must_use]
    pub const fn flatten_result(&self) -> bool {
        matches!(self, Self::RemoveBackground)
    }
}

/// Whole-image undo snapshots, most recent last.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    snapshots: Vec<RgbaImage>,
    limit: Option<NonZeroUsize>,
}

impl HistoryStack {
    /// Unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` snapshots; the oldest is dropped
    /// when a push would exceed it.
    #[must_use]
    pub const fn with_capacity_limit(limit: NonZeroUsize) -> Self {
        Self {
            snapshots: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Save a snapshot.
    pub fn push(&mut self, image: RgbaImage) {
        if let Some(limit) = self.limit
            && self.snapshots.len() >= limit.get()
        {
            let excess = self.snapshots.len() + 1 - limit.get();
            self.snapshots.drain(..excess);
        }
        self.snapshots.push(image);
    }

    /// Remove and return the most recent snapshot.
    pub fn pop(&mut self) -> Option<RgbaImage> {
        self.snapshots.pop()
    }

    /// Number of stored snapshots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether there is nothing to undo.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

/// What [`EditSession::undo`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The previous image was restored.
    Restored,
    /// History was empty; filters were reset to their defaults instead.
    FiltersReset,
}

/// A remote edit that has been started but not finished.
///
/// Produced by [`EditSession::begin_remote_edit`] and consumed by
/// [`EditSession::finish_remote_edit`].
#[derive(Debug)]
#[must_use = "a pending edit keeps the session busy until finished"]
pub struct PendingEdit {
    action: AiAction,
    payload: Option<Vec<u8>>,
}

impl PendingEdit {
    /// The requested action.
    pub const fn action(&self) -> &AiAction {
        &self.action
    }

    /// Instruction text to send.
    #[must_use]
    pub fn instruction(&self) -> &str {
        self.action.instruction()
    }

    /// PNG encoding of the current image, if one was loaded.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

/// The active editing session.
#[derive(Debug, Default)]
pub struct EditSession {
    image: Option<RgbaImage>,
    filters: FilterModel,
    sheet: SheetOptions,
    passport_mode: bool,
    history: HistoryStack,
    busy: bool,
}

impl EditSession {
    /// Empty session with unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty session keeping at most `limit` undo snapshots.
    #[must_use]
    pub fn with_history_limit(limit: NonZeroUsize) -> Self {
        Self {
            history: HistoryStack::with_capacity_limit(limit),
            ..Self::default()
        }
    }

    /// The current image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Current filter settings.
    #[must_use]
    pub const fn filters(&self) -> &FilterModel {
        &self.filters
    }

    /// Current passport sheet options.
    #[must_use]
    pub const fn sheet_options(&self) -> &SheetOptions {
        &self.sheet
    }

    /// Whether output is a passport sheet rather than the single photo.
    #[must_use]
    pub const fn is_passport_mode(&self) -> bool {
        self.passport_mode
    }

    /// Whether a remote edit is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether [`Self::undo`] would restore an image.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Number of undo snapshots.
    #[must_use]
    pub const fn history_len(&self) -> usize {
        self.history.len()
    }

    const fn ensure_idle(&self) -> Result<(), PipelineError> {
        if self.busy {
            Err(PipelineError::Busy)
        } else {
            Ok(())
        }
    }

    fn current_image(&self) -> Result<&RgbaImage, PipelineError> {
        self.image.as_ref().ok_or(PipelineError::NoImage)
    }

    /// Replace the image with a newly loaded one.
    ///
    /// Filters reset to defaults and passport mode is switched off.
    /// History is kept.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] during a remote edit.
    pub fn load_image(&mut self, image: RgbaImage) -> Result<(), PipelineError> {
        self.ensure_idle()?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "loaded image"
        );
        self.image = Some(image);
        self.filters = FilterModel::default();
        self.passport_mode = false;
        Ok(())
    }

    /// Decode `bytes` and load them as the new image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] during a remote edit, or a decode
    /// error. On error the session is unchanged.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        self.ensure_idle()?;
        let image = decode_rgba(bytes)?;
        self.load_image(image)
    }

    /// Replace the filter settings.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] during a remote edit.
    pub fn set_filters(&mut self, filters: FilterModel) -> Result<(), PipelineError> {
        self.ensure_idle()?;
        self.filters = filters;
        Ok(())
    }

    /// Reset filters to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] during a remote edit.
    pub fn reset_filters(&mut self) -> Result<(), PipelineError> {
        self.set_filters(FilterModel::default())
    }

    /// Switch passport mode on or off.
    pub const fn set_passport_mode(&mut self, enabled: bool) {
        self.passport_mode = enabled;
    }

    /// Replace the passport sheet options.
    pub const fn set_sheet_options(&mut self, options: SheetOptions) {
        self.sheet = options;
    }

    /// Restore the previous image, or reset filters when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] during a remote edit.
    pub fn undo(&mut self) -> Result<UndoOutcome, PipelineError> {
        self.ensure_idle()?;
        if let Some(previous) = self.history.pop() {
            self.image = Some(previous);
            tracing::debug!(remaining = self.history.len(), "undo restored image");
            Ok(UndoOutcome::Restored)
        } else {
            self.filters = FilterModel::default();
            tracing::debug!("undo with empty history reset filters");
            Ok(UndoOutcome::FiltersReset)
        }
    }

    /// Start a remote edit.
    ///
    /// On success the current image (if any) has been pushed to history
    /// and the session is busy until [`Self::finish_remote_edit`].
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Busy`] if another edit is in flight.
    /// - [`PipelineError::NoImage`] if the action needs an image and
    ///   none is loaded.
    /// - [`PipelineError::InvalidConfig`] for an empty free-form prompt.
    /// - An encode error if the current image cannot be serialized.
    ///
    /// On error the session is unchanged.
    pub fn begin_remote_edit(&mut self, action: AiAction) -> Result<PendingEdit, PipelineError> {
        self.ensure_idle()?;
        if action.requires_image() && self.image.is_none() {
            return Err(PipelineError::NoImage);
        }
        if action.instruction().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "free-form edit needs a prompt".to_string(),
            ));
        }

        let payload = self.image.as_ref().map(encode_png).transpose()?;
        if let Some(image) = &self.image {
            self.history.push(image.clone());
        }
        self.busy = true;
        tracing::info!(?action, history = self.history.len(), "remote edit started");
        Ok(PendingEdit { action, payload })
    }

    /// Finish a remote edit with the collaborator's `outcome`.
    ///
    /// The busy flag is always cleared. Failures leave the image as it
    /// was; the history snapshot taken at the start is kept.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RemoteEdit`] if the remote call failed,
    /// or a decode error if the returned bytes are not an image.
    pub fn finish_remote_edit(
        &mut self,
        pending: PendingEdit,
        outcome: Result<Vec<u8>, RemoteEditError>,
    ) -> Result<(), PipelineError> {
        self.busy = false;
        let bytes = outcome.inspect_err(|e| {
            tracing::warn!(action = ?pending.action, error = %e, "remote edit failed");
        })?;
        let decoded = decode_rgba(&bytes)?;
        let image = if pending.action.flatten_result() {
            composite_on_opaque_background(&decoded, WHITE)
        } else {
            decoded
        };
        tracing::info!(
            action = ?pending.action,
            width = image.width(),
            height = image.height(),
            "remote edit applied"
        );
        self.image = Some(image);
        Ok(())
    }

    /// Run a remote edit synchronously through `editor`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::begin_remote_edit`] and
    /// [`Self::finish_remote_edit`] can return.
    pub fn apply_remote_edit(
        &mut self,
        editor: &impl RemoteEditor,
        action: AiAction,
    ) -> Result<(), PipelineError> {
        let pending = self.begin_remote_edit(action)?;
        let outcome = editor.edit(pending.payload(), pending.instruction());
        self.finish_remote_edit(pending, outcome)
    }

    /// Inputs for the live preview, or `None` without an image.
    #[must_use]
    pub fn preview_inputs(&self) -> Option<PreviewInputs> {
        let image = self.image.as_ref()?;
        let sheet = self.passport_mode.then_some(self.sheet);
        Some(PreviewInputs::new(image, self.filters, sheet))
    }

    /// Render what the editor shows: the passport sheet in passport
    /// mode, otherwise the approximate filtered photo.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NoImage`] without an image, or a layout error in
    /// passport mode.
    pub fn render_preview(&self) -> Result<RgbaImage, PipelineError> {
        let image = self.current_image()?;
        if self.passport_mode {
            layout_sheet(image, &self.filters, &self.sheet)
        } else {
            Ok(render(image, &self.filters, RenderMode::Preview))
        }
    }

    /// Final pixels for export or print.
    ///
    /// In passport mode this is the sheet (never vignetted); otherwise
    /// the baked photo, with the vignette only when `include_vignette`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Busy`] during a remote edit,
    /// [`PipelineError::NoImage`] without an image, or a layout error.
    pub fn export_image(&self, include_vignette: bool) -> Result<RgbaImage, PipelineError> {
        self.ensure_idle()?;
        let image = self.current_image()?;
        if self.passport_mode {
            layout_sheet(image, &self.filters, &self.sheet)
        } else {
            Ok(bake_for_export(image, &self.filters, include_vignette))
        }
    }
}
