//! Pure compositing: user photo clipped to the photo frame, template overlay on
//! top, rendered at any target resolution.

mod surface;

pub use surface::{RenderSurface, SurfaceError, SurfaceResult};

use image::{imageops, Rgba, RgbaImage};

use crate::geometry::{
    display_scale, frame_rect, FrameFormat, NormalizedFrame, Offset, PixelRect,
};
use crate::loader::LoadedImage;

/// Below this effective photo scale the source is halved first so the
/// bilinear pass below never skips source pixels.
const PREFILTER_SCALE_THRESHOLD: f64 = 0.5;

/// Everything the compositor needs for one frame. Images are optional so a
/// caller holding half-loaded state can pass it through; rendering only
/// happens once both are present.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub format: FrameFormat,
    pub frame: NormalizedFrame,
    pub template: Option<&'a LoadedImage>,
    pub photo: Option<&'a LoadedImage>,
    pub scale: f64,
    pub offset: Offset,
}

/// Resampled copies of the photo and the overlay, kept between frames.
///
/// The photo is stored as a chain of successively halved levels built on
/// first use; the overlay is stretched once per target size. Both are keyed
/// on image identity, so a new upload or template starts a fresh chain.
#[derive(Debug, Default)]
pub struct ResampleCache {
    photo: Option<LoadedImage>,
    photo_levels: Vec<RgbaImage>,
    overlay: Option<(LoadedImage, RgbaImage)>,
    resamples: u64,
}

impl ResampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.photo = None;
        self.photo_levels.clear();
        self.overlay = None;
    }

    /// Resize passes run so far.
    pub fn resamples(&self) -> u64 {
        self.resamples
    }

    /// Highest-resolution level that is at most twice `target_width`.
    fn photo_level<'a>(&'a mut self, photo: &'a LoadedImage, target_width: f64) -> &'a RgbaImage {
        let cached = self
            .photo
            .as_ref()
            .is_some_and(|current| current.shares_pixels(photo));
        if !cached {
            self.photo = Some(photo.clone());
            self.photo_levels.clear();
        }

        let mut level = 0;
        loop {
            let current = if level == 0 {
                photo.pixels()
            } else {
                &self.photo_levels[level - 1]
            };
            if current.width() <= 1
                || target_width / f64::from(current.width()) >= PREFILTER_SCALE_THRESHOLD
            {
                break;
            }
            if self.photo_levels.len() == level {
                let half = imageops::resize(
                    current,
                    (current.width() / 2).max(1),
                    (current.height() / 2).max(1),
                    imageops::FilterType::Triangle,
                );
                tracing::debug!(
                    level = level + 1,
                    width = half.width(),
                    height = half.height(),
                    "photo level built"
                );
                self.resamples += 1;
                self.photo_levels.push(half);
            }
            level += 1;
        }

        if level == 0 {
            photo.pixels()
        } else {
            &self.photo_levels[level - 1]
        }
    }

    fn overlay<'a>(
        &'a mut self,
        template: &'a LoadedImage,
        width: u32,
        height: u32,
    ) -> &'a RgbaImage {
        if template.pixels().dimensions() == (width, height) {
            return template.pixels();
        }
        let stale = match &self.overlay {
            Some((cached, stretched)) => {
                !cached.shares_pixels(template) || stretched.dimensions() != (width, height)
            }
            None => true,
        };
        if stale {
            let stretched = imageops::resize(
                template.pixels(),
                width,
                height,
                imageops::FilterType::Triangle,
            );
            self.resamples += 1;
            self.overlay = Some((template.clone(), stretched));
        }
        match &self.overlay {
            Some((_, stretched)) => stretched,
            None => template.pixels(),
        }
    }
}

/// Renders `scene` into `surface`. Returns `false` and leaves the surface
/// untouched when either image is missing or the placement is degenerate.
pub fn composite(surface: &mut RenderSurface, scene: &Scene<'_>) -> bool {
    composite_cached(surface, scene, &mut ResampleCache::new())
}

/// [`composite`] reusing resampled images from earlier frames.
pub fn composite_cached(
    surface: &mut RenderSurface,
    scene: &Scene<'_>,
    cache: &mut ResampleCache,
) -> bool {
    let (Some(template), Some(photo)) = (scene.template, scene.photo) else {
        tracing::debug!("composite skipped: images not ready");
        return false;
    };
    if !scene.scale.is_finite()
        || scene.scale <= 0.0
        || !scene.offset.x.is_finite()
        || !scene.offset.y.is_finite()
    {
        tracing::debug!(
            scale = scene.scale,
            offset = ?scene.offset,
            "composite skipped: invalid placement"
        );
        return false;
    }

    surface.clear();
    let canvas = surface.size();
    let res_scale = display_scale(canvas.width, scene.format.dimensions().width);
    let clip = frame_rect(&scene.frame, canvas.width, canvas.height);
    let photo_size = photo.natural_size();
    let destination = PixelRect::new(
        clip.x + scene.offset.x * res_scale,
        clip.y + scene.offset.y * res_scale,
        photo_size.width * scene.scale * res_scale,
        photo_size.height * scene.scale * res_scale,
    );

    let sampled = cache.photo_level(photo, destination.width);
    draw_image_clipped(surface.image_mut(), sampled, destination, clip);
    let (width, height) = (surface.width(), surface.height());
    let overlay = cache.overlay(template, width, height);
    imageops::overlay(surface.image_mut(), overlay, 0, 0);
    true
}

/// Placeholder state: the overlay alone, stretched over the whole surface.
pub fn composite_template_only(
    surface: &mut RenderSurface,
    template: Option<&LoadedImage>,
    cache: &mut ResampleCache,
) -> bool {
    let Some(template) = template else {
        return false;
    };
    surface.clear();
    let (width, height) = (surface.width(), surface.height());
    let overlay = cache.overlay(template, width, height);
    imageops::overlay(surface.image_mut(), overlay, 0, 0);
    true
}

/// First and one-past-last pixel whose center lies in `[start, end)`.
fn pixel_span(start: f64, end: f64, limit: u32) -> (u32, u32) {
    let limit_f = f64::from(limit);
    let first = (start - 0.5).ceil().clamp(0.0, limit_f);
    let last = (end - 0.5).ceil().clamp(0.0, limit_f);
    (first as u32, last.max(first) as u32)
}

fn draw_image_clipped(
    target: &mut RgbaImage,
    sampled: &RgbaImage,
    destination: PixelRect,
    clip: PixelRect,
) {
    if destination.width <= 0.0 || destination.height <= 0.0 {
        return;
    }
    let left = destination.x.max(clip.x);
    let top = destination.y.max(clip.y);
    let right = destination.right().min(clip.right());
    let bottom = destination.bottom().min(clip.bottom());
    if right <= left || bottom <= top {
        return;
    }
    let (x_start, x_end) = pixel_span(left, right, target.width());
    let (y_start, y_end) = pixel_span(top, bottom, target.height());
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let step_x = f64::from(sampled.width()) / destination.width;
    let step_y = f64::from(sampled.height()) / destination.height;
    for y in y_start..y_end {
        let v = (f64::from(y) + 0.5 - destination.y) * step_y - 0.5;
        for x in x_start..x_end {
            let u = (f64::from(x) + 0.5 - destination.x) * step_x - 0.5;
            let pixel = sample_bilinear(sampled, u, v);
            blend_over(target.get_pixel_mut(x, y), pixel);
        }
    }
}

/// Bilinear sample in premultiplied space, clamped to the edge.
fn sample_bilinear(source: &RgbaImage, u: f64, v: f64) -> [f64; 4] {
    let max_x = f64::from(source.width() - 1);
    let max_y = f64::from(source.height() - 1);
    let u = u.clamp(0.0, max_x);
    let v = v.clamp(0.0, max_y);
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let x1 = (x0 + 1.0).min(max_x);
    let y1 = (y0 + 1.0).min(max_y);

    let corners = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ];
    let mut accum = [0.0_f64; 4];
    for (cx, cy, weight) in corners {
        if weight == 0.0 {
            continue;
        }
        let Rgba([r, g, b, a]) = *source.get_pixel(cx as u32, cy as u32);
        let alpha = f64::from(a) / 255.0;
        accum[0] += f64::from(r) * alpha * weight;
        accum[1] += f64::from(g) * alpha * weight;
        accum[2] += f64::from(b) * alpha * weight;
        accum[3] += alpha * weight;
    }
    accum
}

/// Source-over of a premultiplied sample onto a straight-alpha pixel.
fn blend_over(destination: &mut Rgba<u8>, premultiplied: [f64; 4]) {
    let src_alpha = premultiplied[3];
    if src_alpha <= 0.0 {
        return;
    }
    let Rgba([dr, dg, db, da]) = *destination;
    let dst_alpha = f64::from(da) / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    let channel = |src_premul: f64, dst: u8| -> u8 {
        let dst_premul = f64::from(dst) * dst_alpha;
        let out_premul = src_premul + dst_premul * (1.0 - src_alpha);
        (out_premul / out_alpha).round().clamp(0.0, 255.0) as u8
    };
    *destination = Rgba([
        channel(premultiplied[0], dr),
        channel(premultiplied[1], dg),
        channel(premultiplied[2], db),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}
