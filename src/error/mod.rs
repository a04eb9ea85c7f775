use crate::clipboard::ClipboardError;
use crate::compositor::SurfaceError;
use crate::export::ExportError;
use crate::geometry::GeometryError;
use crate::gesture::GestureError;
use crate::loader::LoadError;
use crate::services::ServiceError;
use crate::share::ShareError;
use crate::storage::StorageError;
use crate::template::TemplateError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Gesture(#[from] GestureError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}
