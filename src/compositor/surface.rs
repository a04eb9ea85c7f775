use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::Size;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to encode png: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
    #[error("encoded png is empty")]
    EmptyEncoding,
}

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Offscreen RGBA render target.
///
/// Each owner creates its own surface; the preview keeps one alive across
/// redraws and resizes it, export creates a fresh one per run so the two
/// never share pixels.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    image: RgbaImage,
}

impl RenderSurface {
    /// Zero extents are bumped to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::from_pixels(self.width(), self.height())
    }

    /// Reallocates only when the backing size actually changes. Returns
    /// whether it did.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if self.image.dimensions() == (width, height) {
            return false;
        }
        self.image = RgbaImage::new(width, height);
        true
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Lossless PNG with alpha.
    pub fn encode_png(&self) -> SurfaceResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|source| SurfaceError::Encode { source })?;
        if bytes.is_empty() {
            return Err(SurfaceError::EmptyEncoding);
        }
        Ok(bytes)
    }
}
