//! Live preview: keeps one long-lived render surface in sync with the latest
//! placement at a device-aware backing resolution.
//!
//! The canvas always has the template format's aspect ratio, fitted into the
//! available display area, so preview and export crop the photo identically.

mod quality;

pub use quality::PreviewQuality;

use crate::compositor::{
    composite_cached, composite_template_only, RenderSurface, ResampleCache, Scene,
};
use crate::geometry::{FrameFormat, NormalizedFrame, Size};
use crate::loader::{LoadError, LoadedImage};
use crate::notification::{Notifier, Toast};
use crate::placement::PlacementState;
use crate::share::Platform;

/// What the last render put on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    Composite,
    /// Template only; no photo placed yet.
    Placeholder,
    Empty,
}

/// Inputs for one preview frame.
#[derive(Debug, Clone, Copy)]
pub struct PreviewInput<'a> {
    pub format: FrameFormat,
    pub frame: NormalizedFrame,
    pub template: Option<&'a LoadedImage>,
    pub photo: Option<&'a LoadedImage>,
    pub placement: Option<PlacementState>,
}

#[derive(Debug)]
pub struct PreviewRenderer {
    quality: PreviewQuality,
    platform: Platform,
    format: FrameFormat,
    available: Size,
    device_pixel_ratio: f64,
    surface: RenderSurface,
    cache: ResampleCache,
    last_outcome: PreviewOutcome,
}

impl PreviewRenderer {
    /// `available` is the on-screen area for the canvas; the backing surface
    /// is the fitted canvas times the quality multiplier.
    pub fn new(
        quality: PreviewQuality,
        platform: Platform,
        format: FrameFormat,
        available: Size,
        device_pixel_ratio: f64,
    ) -> Self {
        let mut renderer = Self {
            quality,
            platform,
            format,
            available,
            device_pixel_ratio,
            surface: RenderSurface::new(1, 1),
            cache: ResampleCache::new(),
            last_outcome: PreviewOutcome::Empty,
        };
        let (width, height) = renderer.backing_dimensions();
        renderer.surface.resize(width, height);
        renderer
    }

    /// On-screen canvas size: the format's aspect ratio fitted into the
    /// available area. Pointer coordinates are relative to this.
    pub fn display_size(&self) -> Size {
        self.format.fit_within(self.available)
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn multiplier(&self) -> f64 {
        self.quality.multiplier(self.device_pixel_ratio, self.platform)
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn cache(&self) -> &ResampleCache {
        &self.cache
    }

    pub fn last_outcome(&self) -> PreviewOutcome {
        self.last_outcome
    }

    /// Viewport resize or DPR change. Returns whether the backing surface
    /// was reallocated; the caller re-renders either way.
    pub fn set_viewport(&mut self, available: Size, device_pixel_ratio: f64) -> bool {
        self.available = available;
        self.device_pixel_ratio = device_pixel_ratio;
        self.resize_surface()
    }

    /// Template swap. Returns whether the backing surface was reallocated.
    pub fn set_format(&mut self, format: FrameFormat) -> bool {
        self.format = format;
        self.resize_surface()
    }

    fn backing_dimensions(&self) -> (u32, u32) {
        let (width, _) = self.quality.backing_size(
            self.display_size(),
            self.device_pixel_ratio,
            self.platform,
        );
        (width, self.format.height_for_width(width))
    }

    fn resize_surface(&mut self) -> bool {
        let (width, height) = self.backing_dimensions();
        let resized = self.surface.resize(width, height);
        if resized {
            tracing::debug!(width, height, format = %self.format, "preview surface resized");
        }
        resized
    }

    pub fn render(&mut self, input: &PreviewInput<'_>) -> PreviewOutcome {
        if input.format != self.format {
            self.set_format(input.format);
        }
        let outcome = match (input.photo, input.placement) {
            (Some(photo), Some(placement)) if input.template.is_some() => {
                let scene = Scene {
                    format: input.format,
                    frame: input.frame,
                    template: input.template,
                    photo: Some(photo),
                    scale: placement.scale,
                    offset: placement.offset,
                };
                if composite_cached(&mut self.surface, &scene, &mut self.cache) {
                    PreviewOutcome::Composite
                } else {
                    self.surface.clear();
                    PreviewOutcome::Empty
                }
            }
            _ if composite_template_only(&mut self.surface, input.template, &mut self.cache) => {
                PreviewOutcome::Placeholder
            }
            _ => {
                self.surface.clear();
                PreviewOutcome::Empty
            }
        };
        self.last_outcome = outcome;
        outcome
    }

    /// Blanks the preview and tells the user, without interrupting the
    /// render loop.
    pub fn show_load_failure(&mut self, notifier: &dyn Notifier, what: &str, err: &LoadError) {
        tracing::warn!(?err, what, "image failed to load");
        self.surface.clear();
        self.cache.clear();
        self.last_outcome = PreviewOutcome::Empty;
        notifier.notify(Toast::error(format!(
            "Could not load the {what}. Please try another file."
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Offset;
    use crate::notification::testing::RecordingNotifier;
    use image::{Rgba, RgbaImage};

    fn frame() -> NormalizedFrame {
        NormalizedFrame::new(0.2, 0.2, 0.6, 0.6).expect("frame should be valid")
    }

    fn template() -> LoadedImage {
        let image = RgbaImage::from_fn(100, 100, |x, y| {
            if (20..80).contains(&x) && (20..80).contains(&y) {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([10, 10, 10, 255])
            }
        });
        LoadedImage::from_rgba(image).expect("template should not be empty")
    }

    fn photo() -> LoadedImage {
        LoadedImage::from_rgba(RgbaImage::from_pixel(200, 100, Rgba([0, 200, 0, 255])))
            .expect("photo should not be empty")
    }

    fn renderer() -> PreviewRenderer {
        PreviewRenderer::new(
            PreviewQuality::default(),
            Platform::Desktop,
            FrameFormat::Square,
            Size::new(150.0, 150.0),
            2.0,
        )
    }

    #[test]
    fn backing_surface_uses_quality_multiplier() {
        let renderer = renderer();
        assert_eq!(renderer.surface().width(), 300);
        assert_eq!(renderer.surface().height(), 300);
        assert_eq!(renderer.multiplier(), 2.0);
    }

    #[test]
    fn renders_placeholder_until_photo_is_placed() {
        let mut renderer = renderer();
        let template = template();
        let input = PreviewInput {
            format: FrameFormat::Square,
            frame: frame(),
            template: Some(&template),
            photo: None,
            placement: None,
        };
        assert_eq!(renderer.render(&input), PreviewOutcome::Placeholder);
        let centre = renderer.surface().image().get_pixel(150, 150);
        assert_eq!(centre[3], 0);
    }

    #[test]
    fn renders_composite_with_latest_state() {
        let mut renderer = renderer();
        let template = template();
        let photo = photo();
        let mut input = PreviewInput {
            format: FrameFormat::Square,
            frame: frame(),
            template: Some(&template),
            photo: Some(&photo),
            placement: Some(PlacementState::new(6.48, Offset::new(-324.0, 0.0))),
        };
        assert_eq!(renderer.render(&input), PreviewOutcome::Composite);
        assert_eq!(*renderer.surface().image().get_pixel(150, 150), Rgba([0, 200, 0, 255]));

        input.placement = Some(PlacementState::new(f64::NAN, Offset::zero()));
        assert_eq!(renderer.render(&input), PreviewOutcome::Empty);
        assert!(renderer.surface().image().pixels().all(|pixel| pixel[3] == 0));
    }

    #[test]
    fn resize_only_reallocates_on_backing_change() {
        let mut renderer = renderer();
        assert!(!renderer.set_viewport(Size::new(150.0, 150.0), 2.0));
        assert!(renderer.set_viewport(Size::new(300.0, 300.0), 2.0));
        assert_eq!(renderer.surface().width(), 600);
        assert_eq!(renderer.display_size(), Size::new(300.0, 300.0));
    }

    #[test]
    fn surface_follows_format_aspect_ratio() {
        let mut renderer = renderer();
        assert!(renderer.set_format(FrameFormat::Story));
        // 150x150 available at 2x: story fits as 84.375x150.
        assert_eq!(renderer.surface().width(), 169);
        assert_eq!(renderer.surface().height(), 300);
        assert!((renderer.display_size().height - 150.0).abs() < 1e-9);

        assert!(renderer.set_format(FrameFormat::Portrait));
        assert_eq!(renderer.surface().width(), 240);
        assert_eq!(renderer.surface().height(), 300);
    }

    #[test]
    fn drag_redraws_reuse_resampled_photo() {
        let mut renderer = renderer();
        let template = template();
        let pixels = RgbaImage::from_pixel(2400, 1800, Rgba([0, 200, 0, 255]));
        let photo = LoadedImage::from_rgba(pixels).expect("photo should not be empty");
        let mut input = PreviewInput {
            format: FrameFormat::Square,
            frame: frame(),
            template: Some(&template),
            photo: Some(&photo),
            placement: Some(PlacementState::new(0.36, Offset::new(-108.0, 0.0))),
        };
        assert_eq!(renderer.render(&input), PreviewOutcome::Composite);
        let after_first = renderer.cache().resamples();

        for step in 1..=10 {
            input.placement = Some(PlacementState::new(
                0.36,
                Offset::new(-108.0 - 10.0 * f64::from(step), 0.0),
            ));
            assert_eq!(renderer.render(&input), PreviewOutcome::Composite);
        }
        assert_eq!(renderer.cache().resamples(), after_first);
    }

    #[test]
    fn load_failure_blanks_preview_and_notifies() {
        let mut renderer = renderer();
        let template = template();
        let input = PreviewInput {
            format: FrameFormat::Square,
            frame: frame(),
            template: Some(&template),
            photo: None,
            placement: None,
        };
        renderer.render(&input);

        let notifier = RecordingNotifier::default();
        renderer.show_load_failure(
            &notifier,
            "photo",
            &LoadError::Empty {
                origin: "upload.png".to_string(),
            },
        );
        assert_eq!(renderer.last_outcome(), PreviewOutcome::Empty);
        assert!(renderer.surface().image().pixels().all(|pixel| pixel[3] == 0));
        assert_eq!(
            notifier.messages(),
            vec!["Could not load the photo. Please try another file.".to_string()]
        );
    }
}
