//! Coordinate model shared by the compositor, the placement controller and the
//! export pipeline.
//!
//! Three spaces are in play:
//!
//! - **normalized**: `[0, 1]` fractions of the template format, used to store
//!   the photo frame so it is resolution independent;
//! - **frame pixels**: logical pixels of the format (`1080x1080` for square),
//!   origin at the frame's top-left; placement offsets live here;
//! - **canvas pixels**: whatever backing resolution a surface is rendered at.
//!
//! Conversions never round. Only the rasterizer rounds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("frame component {component} is not a finite number")]
    NonFinite { component: &'static str },
    #[error("frame component {component}={value} is outside [0, 1]")]
    OutOfRange { component: &'static str, value: f64 },
    #[error("frame has an empty {axis} extent")]
    EmptyExtent { axis: &'static str },
    #[error("frame overflows the template on the {axis} axis ({origin} + {extent} > 1)")]
    Overflow {
        axis: &'static str,
        origin: f64,
        extent: f64,
    },
    #[error("unknown template format: {value}")]
    UnknownFormat { value: String },
}

pub type GeometryResult<T> = std::result::Result<T, GeometryError>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Integer backing-store size for a surface; at least one pixel per axis.
    pub fn to_pixels(self) -> (u32, u32) {
        (to_pixel_extent(self.width), to_pixel_extent(self.height))
    }
}

fn to_pixel_extent(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        return 1;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}

/// A position in canvas pixels (pointer coordinates, frame origins).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Top-left corner of the scaled photo relative to the frame, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edge-inclusive hit test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    #[default]
    Square,
    Story,
    Portrait,
    Landscape,
}

impl FrameFormat {
    pub const ALL: [FrameFormat; 4] = [
        Self::Square,
        Self::Story,
        Self::Portrait,
        Self::Landscape,
    ];

    /// Fixed logical resolution of the export image.
    pub const fn pixel_dimensions(self) -> (u32, u32) {
        match self {
            Self::Square => (1080, 1080),
            Self::Story => (1080, 1920),
            Self::Portrait => (1080, 1350),
            Self::Landscape => (1200, 630),
        }
    }

    pub fn dimensions(self) -> Size {
        let (width, height) = self.pixel_dimensions();
        Size::from_pixels(width, height)
    }

    pub fn aspect_ratio(self) -> f64 {
        let size = self.dimensions();
        size.width / size.height
    }

    /// Largest canvas with this format's aspect ratio that fits in
    /// `available`. Degenerate input yields the logical dimensions.
    pub fn fit_within(self, available: Size) -> Size {
        let valid = |value: f64| value.is_finite() && value > 0.0;
        if !valid(available.width) || !valid(available.height) {
            return self.dimensions();
        }
        let ratio = self.aspect_ratio();
        if available.width / available.height > ratio {
            Size::new(available.height * ratio, available.height)
        } else {
            Size::new(available.width, available.width / ratio)
        }
    }

    /// Backing height that keeps this format's aspect ratio at `width`.
    pub fn height_for_width(self, width: u32) -> u32 {
        to_pixel_extent(f64::from(width) / self.aspect_ratio())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Square => "Square (1:1)",
            Self::Story => "Story (9:16)",
            Self::Portrait => "Portrait (4:5)",
            Self::Landscape => "Landscape (1.91:1)",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Story => "story",
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }

    pub fn parse(value: &str) -> GeometryResult<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| GeometryError::UnknownFormat {
                value: value.to_string(),
            })
    }
}

impl std::str::FromStr for FrameFormat {
    type Err = GeometryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Photo frame rectangle in normalized template space.
///
/// Always valid once constructed: every component is finite and within
/// `[0, 1]`, extents are non-zero and the rectangle stays inside the template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame", into = "RawFrame")]
pub struct NormalizedFrame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawFrame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawFrame> for NormalizedFrame {
    type Error = GeometryError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl From<NormalizedFrame> for RawFrame {
    fn from(frame: NormalizedFrame) -> Self {
        Self {
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
        }
    }
}

// Tolerates float noise from editors that store e.g. 0.1 + 0.9.
const NORMALIZED_EPSILON: f64 = 1e-9;

impl NormalizedFrame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> GeometryResult<Self> {
        for (component, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() {
                return Err(GeometryError::NonFinite { component });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(GeometryError::OutOfRange { component, value });
            }
        }
        if width <= 0.0 {
            return Err(GeometryError::EmptyExtent { axis: "horizontal" });
        }
        if height <= 0.0 {
            return Err(GeometryError::EmptyExtent { axis: "vertical" });
        }
        if x + width > 1.0 + NORMALIZED_EPSILON {
            return Err(GeometryError::Overflow {
                axis: "horizontal",
                origin: x,
                extent: width,
            });
        }
        if y + height > 1.0 + NORMALIZED_EPSILON {
            return Err(GeometryError::Overflow {
                axis: "vertical",
                origin: y,
                extent: height,
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// The whole template.
    pub const fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    pub const fn x(&self) -> f64 {
        self.x
    }

    pub const fn y(&self) -> f64 {
        self.y
    }

    pub const fn width(&self) -> f64 {
        self.width
    }

    pub const fn height(&self) -> f64 {
        self.height
    }
}

/// Frame rectangle in the pixel space of a canvas of the given size.
///
/// No clamping: the normalized frame is already validated.
pub fn frame_rect(frame: &NormalizedFrame, canvas_width: f64, canvas_height: f64) -> PixelRect {
    PixelRect::new(
        frame.x * canvas_width,
        frame.y * canvas_height,
        frame.width * canvas_width,
        frame.height * canvas_height,
    )
}

/// Frame rectangle at the format's logical resolution; this is the
/// coordinate system placement offsets are expressed in.
pub fn logical_frame_rect(format: FrameFormat, frame: &NormalizedFrame) -> PixelRect {
    let size = format.dimensions();
    frame_rect(frame, size.width, size.height)
}

/// Ratio between a rendered canvas and the format's logical width.
pub fn display_scale(canvas_width: f64, format_width: f64) -> f64 {
    if !canvas_width.is_finite() || !format_width.is_finite() || format_width <= 0.0 {
        return 1.0;
    }
    canvas_width / format_width
}
