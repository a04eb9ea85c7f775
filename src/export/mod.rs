//! Final render and hand-off: limit check, full-resolution PNG, then
//! download, native share or the social fallback.

mod error;
mod naming;

pub use error::{ExportError, ExportResult};
pub use naming::{export_file_name, slugify};

use std::path::PathBuf;

use crate::clipboard::ClipboardBackend;
use crate::compositor::{composite, RenderSurface, Scene};
use crate::geometry::{FrameFormat, NormalizedFrame};
use crate::loader::LoadedImage;
use crate::notification::{Notifier, Toast};
use crate::placement::PlacementState;
use crate::services::{DownloadLimiter, DownloadTracker};
use crate::share::{compose_url, Platform, ShareError, ShareSheet, UrlOpener};
use crate::storage::FileSaver;

const CAPTION_ON_CLIPBOARD: &str =
    "Your caption is on the clipboard: paste it into the post and attach the image.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Download,
    SaveToDevice,
    ShareToSocial { caption: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded { path: PathBuf },
    Shared,
    /// Desktop social flow: image saved, caption copied (when possible) and
    /// the compose page opened. The user finishes the post by hand.
    SocialFallback { path: PathBuf, caption_copied: bool },
}

/// One export attempt.
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub event_id: &'a str,
    pub event_slug: &'a str,
    pub template_id: &'a str,
    pub template_name: &'a str,
    pub format: FrameFormat,
    pub frame: NormalizedFrame,
    pub template: Option<&'a LoadedImage>,
    pub photo: Option<&'a LoadedImage>,
    pub placement: Option<PlacementState>,
}

/// Platform primitives and services the pipeline talks to.
#[derive(Clone, Copy)]
pub struct ExportCollaborators<'a> {
    pub limiter: &'a dyn DownloadLimiter,
    pub tracker: &'a dyn DownloadTracker,
    pub saver: &'a dyn FileSaver,
    pub share_sheet: &'a dyn ShareSheet,
    pub clipboard: &'a dyn ClipboardBackend,
    pub url_opener: &'a dyn UrlOpener,
    pub notifier: &'a dyn Notifier,
}

pub struct ExportPipeline<'a> {
    collaborators: ExportCollaborators<'a>,
    platform: Platform,
    social_compose_url: String,
}

impl std::fmt::Debug for ExportPipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("platform", &self.platform)
            .field("social_compose_url", &self.social_compose_url)
            .finish_non_exhaustive()
    }
}

impl<'a> ExportPipeline<'a> {
    pub fn new(
        collaborators: ExportCollaborators<'a>,
        platform: Platform,
        social_compose_url: impl Into<String>,
    ) -> Self {
        Self {
            collaborators,
            platform,
            social_compose_url: social_compose_url.into(),
        }
    }

    /// Runs one export. Every user-visible error is also posted as a toast;
    /// [`ExportError::ShareCancelled`] is returned silently.
    pub fn run(
        &self,
        request: &ExportRequest<'_>,
        target: &ExportTarget,
    ) -> ExportResult<ExportOutcome> {
        let result = self.run_inner(request, target);
        match &result {
            Ok(outcome) => {
                tracing::info!(template_id = request.template_id, ?outcome, "export complete");
                self.track(request);
            }
            Err(err) => {
                tracing::debug!(template_id = request.template_id, %err, "export stopped");
                if let Some(message) = err.user_message() {
                    self.collaborators.notifier.notify(Toast::error(message));
                }
            }
        }
        result
    }

    fn run_inner(
        &self,
        request: &ExportRequest<'_>,
        target: &ExportTarget,
    ) -> ExportResult<ExportOutcome> {
        let (Some(template), Some(photo), Some(placement)) =
            (request.template, request.photo, request.placement)
        else {
            return Err(ExportError::ImageNotReady);
        };

        self.check_limit(request)?;

        let bytes = render_png(request.format, request.frame, template, photo, placement)?;
        let file_name = export_file_name(request.event_slug, request.template_name);

        match target {
            ExportTarget::Download => self.download(&file_name, &bytes),
            ExportTarget::SaveToDevice => self.save_to_device(&file_name, &bytes),
            ExportTarget::ShareToSocial { caption } => {
                self.share_to_social(&file_name, &bytes, caption)
            }
        }
    }

    fn check_limit(&self, request: &ExportRequest<'_>) -> ExportResult<()> {
        match self
            .collaborators
            .limiter
            .check_and_reserve(request.event_id, request.template_id)
        {
            Ok(decision) if decision.blocks_export() => {
                Err(ExportError::limit_reached(decision.message))
            }
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!(?err, "download limit check failed; allowing export");
                Ok(())
            }
        }
    }

    fn download(&self, file_name: &str, bytes: &[u8]) -> ExportResult<ExportOutcome> {
        let path = self.save(file_name, bytes)?;
        self.collaborators
            .notifier
            .notify(Toast::success(format!("Saved {}", path.display())));
        Ok(ExportOutcome::Downloaded { path })
    }

    fn save_to_device(&self, file_name: &str, bytes: &[u8]) -> ExportResult<ExportOutcome> {
        if !self.collaborators.share_sheet.can_share_files() {
            return self.download(file_name, bytes);
        }
        match self.collaborators.share_sheet.share_file(bytes, file_name, None) {
            Ok(()) => Ok(ExportOutcome::Shared),
            Err(ShareError::Cancelled) => Err(ExportError::ShareCancelled),
            Err(err) => {
                tracing::warn!(?err, "native share failed; downloading instead");
                self.download(file_name, bytes)
            }
        }
    }

    fn share_to_social(
        &self,
        file_name: &str,
        bytes: &[u8],
        caption: &str,
    ) -> ExportResult<ExportOutcome> {
        if self.platform == Platform::Mobile && self.collaborators.share_sheet.can_share_files() {
            match self
                .collaborators
                .share_sheet
                .share_file(bytes, file_name, Some(caption))
            {
                Ok(()) => return Ok(ExportOutcome::Shared),
                Err(ShareError::Cancelled) => return Err(ExportError::ShareCancelled),
                Err(err) => {
                    tracing::warn!(?err, "native share failed; using download fallback");
                }
            }
        }

        let path = self.save(file_name, bytes)?;
        let caption_copied = match self.collaborators.clipboard.copy_text(caption) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(?err, "failed to copy caption to clipboard");
                false
            }
        };
        let url = compose_url(&self.social_compose_url, caption);
        if let Err(err) = self.collaborators.url_opener.open_url(&url) {
            tracing::warn!(?err, %url, "failed to open compose page");
        }

        let message = if caption_copied {
            format!("Image saved to {}. {CAPTION_ON_CLIPBOARD}", path.display())
        } else {
            format!(
                "Image saved to {}. Attach it to your post and add your caption.",
                path.display()
            )
        };
        self.collaborators
            .notifier
            .notify(Toast::info(message).persistent());
        Ok(ExportOutcome::SocialFallback {
            path,
            caption_copied,
        })
    }

    fn save(&self, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
        self.collaborators
            .saver
            .save_file(file_name, bytes)
            .map_err(ExportError::failure)
    }

    fn track(&self, request: &ExportRequest<'_>) {
        if let Err(err) = self
            .collaborators
            .tracker
            .record_download(request.event_id, request.template_id)
        {
            tracing::warn!(?err, "failed to record download");
        }
    }
}

/// Full-resolution composite on a fresh surface, PNG encoded.
pub fn render_png(
    format: FrameFormat,
    frame: NormalizedFrame,
    template: &LoadedImage,
    photo: &LoadedImage,
    placement: PlacementState,
) -> ExportResult<Vec<u8>> {
    let (width, height) = format.pixel_dimensions();
    let mut surface = RenderSurface::new(width, height);
    let scene = Scene {
        format,
        frame,
        template: Some(template),
        photo: Some(photo),
        scale: placement.scale,
        offset: placement.offset,
    };
    if !composite(&mut surface, &scene) {
        return Err(ExportError::failure("composite produced no image"));
    }
    surface.encode_png().map_err(ExportError::failure)
}
