use crate::geometry::Size;
use crate::share::Platform;

const DEFAULT_MAX_QUALITY: f64 = 3.0;
const DEFAULT_MOBILE_QUALITY: f64 = 2.0;

/// Backing-store multiplier for the preview canvas.
///
/// Follows the device pixel ratio, never drops below 1, never exceeds
/// `max_quality`. Mobile devices get at least `mobile_quality`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewQuality {
    max_quality: f64,
    mobile_quality: f64,
}

impl Default for PreviewQuality {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUALITY, DEFAULT_MOBILE_QUALITY)
    }
}

impl PreviewQuality {
    pub fn new(max_quality: f64, mobile_quality: f64) -> Self {
        let max_quality = if max_quality.is_finite() && max_quality >= 1.0 {
            max_quality
        } else {
            DEFAULT_MAX_QUALITY
        };
        let mobile_quality = if mobile_quality.is_finite() && mobile_quality >= 1.0 {
            mobile_quality.min(max_quality)
        } else {
            DEFAULT_MOBILE_QUALITY.min(max_quality)
        };
        Self {
            max_quality,
            mobile_quality,
        }
    }

    pub fn max_quality(&self) -> f64 {
        self.max_quality
    }

    pub fn multiplier(&self, device_pixel_ratio: f64, platform: Platform) -> f64 {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let ratio = match platform {
            Platform::Desktop => ratio,
            Platform::Mobile => ratio.max(self.mobile_quality),
        };
        ratio.clamp(1.0, self.max_quality)
    }

    /// Backing pixels for a canvas shown at `display` size.
    pub fn backing_size(
        &self,
        display: Size,
        device_pixel_ratio: f64,
        platform: Platform,
    ) -> (u32, u32) {
        display
            .scaled(self.multiplier(device_pixel_ratio, platform))
            .to_pixels()
    }
}
