//! Image loading. Decoding is the only suspension point of the engine: it runs
//! on a worker thread and the editing session polls for completion from its
//! own (single) thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use image::{ImageReader, RgbaImage};
use thiserror::Error;

use crate::geometry::Size;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image {origin} has no pixels")]
    Empty { origin: String },
    #[error("image loader worker exited before delivering a result")]
    WorkerGone,
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// A fully decoded RGBA image. Cheap to clone; pixels are shared read-only
/// between the preview and export surfaces.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pixels: Arc<RgbaImage>,
}

impl LoadedImage {
    pub fn from_rgba(pixels: RgbaImage) -> Option<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return None;
        }
        Some(Self {
            pixels: Arc::new(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Natural dimensions as floating point, for placement math.
    pub fn natural_size(&self) -> Size {
        Size::from_pixels(self.width(), self.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether both handles point at the same decoded pixels.
    pub fn shares_pixels(&self, other: &LoadedImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

pub fn decode_image(bytes: &[u8], origin: &str) -> LoadResult<LoadedImage> {
    let decoded = image::load_from_memory(bytes).map_err(|source| LoadError::Decode {
        origin: origin.to_string(),
        source,
    })?;
    LoadedImage::from_rgba(decoded.into_rgba8()).ok_or_else(|| LoadError::Empty {
        origin: origin.to_string(),
    })
}

pub fn load_image(path: &Path) -> LoadResult<LoadedImage> {
    let origin = path.display().to_string();
    let reader = ImageReader::open(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let decoded = reader.decode().map_err(|source| LoadError::Decode {
        origin: origin.clone(),
        source,
    })?;
    let loaded = LoadedImage::from_rgba(decoded.into_rgba8())
        .ok_or(LoadError::Empty { origin: origin.clone() })?;
    tracing::debug!(
        path = %path.display(),
        width = loaded.width(),
        height = loaded.height(),
        "image decoded"
    );
    Ok(loaded)
}

#[derive(Debug)]
pub enum LoadPoll {
    Pending,
    Ready(LoadResult<LoadedImage>),
}

/// Handle to an image decoding on a worker thread.
#[derive(Debug)]
pub struct PendingLoad {
    rx: mpsc::Receiver<LoadResult<LoadedImage>>,
    finished: bool,
}

impl PendingLoad {
    /// Non-blocking check. Yields `Ready` exactly once; afterwards the handle
    /// stays `Pending` forever and should be dropped.
    pub fn poll(&mut self) -> LoadPoll {
        if self.finished {
            return LoadPoll::Pending;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.finished = true;
                LoadPoll::Ready(result)
            }
            Err(mpsc::TryRecvError::Empty) => LoadPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.finished = true;
                LoadPoll::Ready(Err(LoadError::WorkerGone))
            }
        }
    }
}

pub fn spawn_worker_load<W>(work: W) -> PendingLoad
where
    W: FnOnce() -> LoadResult<LoadedImage> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = work();
        let _ = tx.send(result);
    });
    PendingLoad {
        rx,
        finished: false,
    }
}

pub fn spawn_load(path: PathBuf) -> PendingLoad {
    spawn_worker_load(move || load_image(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("png encode should work");
        bytes
    }

    #[test]
    fn decode_image_reads_png_bytes() {
        let image = decode_image(&png_bytes(4, 3), "memory").expect("decode should work");
        assert_eq!((image.width(), image.height()), (4, 3));
        assert_eq!(image.natural_size(), Size::new(4.0, 3.0));
    }

    #[test]
    fn decode_image_reports_garbage_as_decode_error() {
        let err = decode_image(b"not an image", "memory").expect_err("decode should fail");
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn load_image_reports_missing_file() {
        let err = load_image(Path::new("/nonexistent/meetme/photo.png"))
            .expect_err("missing file should fail");
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn spawned_load_delivers_result_once() {
        let bytes = png_bytes(2, 2);
        let mut pending = spawn_worker_load(move || decode_image(&bytes, "worker"));
        let result = loop {
            match pending.poll() {
                LoadPoll::Pending => std::thread::sleep(std::time::Duration::from_millis(1)),
                LoadPoll::Ready(result) => break result,
            }
        };
        assert_eq!(result.expect("worker decode should work").width(), 2);
        assert!(matches!(pending.poll(), LoadPoll::Pending));
    }

    #[test]
    fn from_rgba_rejects_empty_images() {
        assert!(LoadedImage::from_rgba(RgbaImage::new(0, 5)).is_none());
    }
}
