//! Photo placement inside the frame: cover scale, the fill constraint and the
//! projections that enforce it.
//!
//! Everything here is in frame pixels (the format's logical resolution), so
//! the same state renders identically on a 300px preview and a 1080px export.

use serde::{Deserialize, Serialize};

use crate::geometry::{Offset, Size};

pub const DEFAULT_MAX_ZOOM_FACTOR: f64 = 3.0;

// Absorbs float noise such as 648/1000*1000 = 647.9999999999999.
const FILL_EPSILON: f64 = 1e-9;

/// Scale and offset of one photo within one frame. Replaced wholesale on
/// every update; never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementState {
    pub scale: f64,
    pub offset: Offset,
}

impl PlacementState {
    pub const fn new(scale: f64, offset: Offset) -> Self {
        Self { scale, offset }
    }

    pub const fn with_offset(self, offset: Offset) -> Self {
        Self::new(self.scale, offset)
    }

    pub const fn with_scale(self, scale: f64) -> Self {
        Self::new(scale, self.offset)
    }

    pub fn scaled_size(&self, image: Size) -> Size {
        image.scaled(self.scale)
    }
}

/// Minimum scale at which `image` fully covers `frame`.
///
/// `None` for empty or non-finite sizes.
pub fn cover_scale(frame: Size, image: Size) -> Option<f64> {
    let valid = |size: Size| {
        size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
    };
    if !valid(frame) || !valid(image) {
        return None;
    }
    Some((frame.width / image.width).max(frame.height / image.height))
}

fn clamp_axis(offset: f64, frame_extent: f64, scaled_extent: f64) -> f64 {
    let lowest = frame_extent - scaled_extent;
    if lowest > FILL_EPSILON {
        // Under-scaled image: nothing can satisfy the constraint, keep it
        // centered so the gap is symmetric.
        return lowest / 2.0;
    }
    if !offset.is_finite() {
        return lowest.min(0.0) / 2.0;
    }
    offset.clamp(lowest.min(0.0), 0.0)
}

/// Projects `offset` onto the region where the scaled image covers the frame.
/// Idempotent.
pub fn clamp_offset(offset: Offset, scale: f64, frame: Size, image: Size) -> Offset {
    let scaled = image.scaled(scale);
    Offset::new(
        clamp_axis(offset.x, frame.width, scaled.width),
        clamp_axis(offset.y, frame.height, scaled.height),
    )
}

/// Valid placements for one frame/image pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementBounds {
    frame: Size,
    image: Size,
    min_scale: f64,
    max_scale: f64,
}

impl PlacementBounds {
    /// `max_zoom_factor` is relative to cover scale; values below one are
    /// treated as one.
    pub fn new(frame: Size, image: Size, max_zoom_factor: f64) -> Option<Self> {
        let min_scale = cover_scale(frame, image)?;
        let factor = if max_zoom_factor.is_finite() {
            max_zoom_factor.max(1.0)
        } else {
            DEFAULT_MAX_ZOOM_FACTOR
        };
        Some(Self {
            frame,
            image,
            min_scale,
            max_scale: min_scale * factor,
        })
    }

    pub const fn frame(&self) -> Size {
        self.frame
    }

    pub const fn image(&self) -> Size {
        self.image
    }

    pub const fn cover_scale(&self) -> f64 {
        self.min_scale
    }

    pub const fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        if !scale.is_finite() {
            return self.min_scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn clamp_offset(&self, scale: f64, offset: Offset) -> Offset {
        clamp_offset(offset, scale, self.frame, self.image)
    }

    /// Clamps scale first, then the offset at the clamped scale.
    pub fn clamp(&self, state: PlacementState) -> PlacementState {
        let scale = self.clamp_scale(state.scale);
        PlacementState::new(scale, self.clamp_offset(scale, state.offset))
    }

    /// Cover scale, centered.
    pub fn initial(&self) -> PlacementState {
        let scaled = self.image.scaled(self.min_scale);
        let offset = Offset::new(
            (self.frame.width - scaled.width) / 2.0,
            (self.frame.height - scaled.height) / 2.0,
        );
        PlacementState::new(self.min_scale, self.clamp_offset(self.min_scale, offset))
    }

    /// Rescales keeping the image point under `anchor` (frame pixels) fixed
    /// where the constraint allows; without an anchor the offset is kept and
    /// re-clamped.
    pub fn rescale(
        &self,
        state: PlacementState,
        scale: f64,
        anchor: Option<Offset>,
    ) -> PlacementState {
        let scale = self.clamp_scale(scale);
        let offset = match anchor {
            Some(anchor) if state.scale > 0.0 => {
                let ratio = scale / state.scale;
                Offset::new(
                    anchor.x - (anchor.x - state.offset.x) * ratio,
                    anchor.y - (anchor.y - state.offset.y) * ratio,
                )
            }
            _ => state.offset,
        };
        PlacementState::new(scale, self.clamp_offset(scale, offset))
    }

    /// Scale as a percentage of cover scale (100 at cover).
    pub fn zoom_percent(&self, scale: f64) -> f64 {
        scale / self.min_scale * 100.0
    }

    pub fn scale_for_percent(&self, percent: f64) -> f64 {
        self.clamp_scale(self.min_scale * percent / 100.0)
    }

    /// True when `state` satisfies the fill constraint.
    pub fn covers(&self, state: &PlacementState) -> bool {
        let scaled = self.image.scaled(state.scale);
        scaled.width + FILL_EPSILON >= self.frame.width
            && scaled.height + FILL_EPSILON >= self.frame.height
            && state.offset.x <= FILL_EPSILON
            && state.offset.y <= FILL_EPSILON
            && state.offset.x + FILL_EPSILON >= self.frame.width - scaled.width
            && state.offset.y + FILL_EPSILON >= self.frame.height - scaled.height
    }
}
