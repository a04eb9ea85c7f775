use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::placement::PlacementState;

const DOWNLOAD_FALLBACK_SUBDIR: &str = "Downloads";
const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("invalid file name: {name:?}")]
    InvalidFileName { name: String },
    #[error("template id is empty")]
    MissingTemplateId,
    #[error("malformed placements file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize placements: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Download-as-file primitive.
pub trait FileSaver {
    fn save_file(&self, file_name: &str, bytes: &[u8]) -> StorageResult<PathBuf>;
}

/// Admin-only persistence of sample-photo placements.
pub trait PlacementStore {
    fn save_placement(&self, template_id: &str, state: &PlacementState) -> StorageResult<()>;
    fn load_placement(&self, template_id: &str) -> StorageResult<Option<PlacementState>>;
}

#[derive(Debug, Clone)]
pub struct StorageService {
    download_dir: PathBuf,
}

impl StorageService {
    pub const fn with_paths(download_dir: PathBuf) -> Self {
        Self { download_dir }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        Ok(Self::with_paths(default_download_dir()?))
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn target_path(&self, file_name: &str) -> StorageResult<PathBuf> {
        validate_file_name(file_name)?;
        Ok(self.download_dir.join(file_name))
    }

    /// Writes next to the target first and renames, so a failed write never
    /// leaves a truncated file under the final name.
    pub fn save_file(&self, file_name: &str, bytes: &[u8]) -> StorageResult<PathBuf> {
        let target = self.target_path(file_name)?;
        fs::create_dir_all(&self.download_dir)?;

        let partial = self
            .download_dir
            .join(format!(".{file_name}{PARTIAL_SUFFIX}"));
        if let Err(err) = fs::write(&partial, bytes) {
            let _ = fs::remove_file(&partial);
            return Err(StorageError::Io(err));
        }
        save_overwrite(&partial, &target)?;
        tracing::info!(path = %target.display(), bytes = bytes.len(), "saved export");
        Ok(target)
    }
}

impl FileSaver for StorageService {
    fn save_file(&self, file_name: &str, bytes: &[u8]) -> StorageResult<PathBuf> {
        self.save_file(file_name, bytes)
    }
}

/// The platform download directory, else `$HOME/Downloads`.
pub fn default_download_dir() -> StorageResult<PathBuf> {
    if let Some(dir) = dirs::download_dir() {
        return Ok(dir);
    }
    let home = dirs::home_dir().ok_or(StorageError::MissingHomeDirectory)?;
    Ok(home.join(DOWNLOAD_FALLBACK_SUBDIR))
}

fn validate_file_name(file_name: &str) -> StorageResult<()> {
    let invalid = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(StorageError::InvalidFileName {
            name: file_name.to_string(),
        });
    }
    Ok(())
}

fn save_overwrite(source: &Path, destination: &Path) -> StorageResult<()> {
    let _ = fs::remove_file(destination);
    if let Err(err) = fs::rename(source, destination) {
        let _ = fs::remove_file(source);
        return Err(StorageError::Io(err));
    }
    Ok(())
}

/// Placements keyed by template id in one JSON object.
#[derive(Debug, Clone)]
pub struct JsonPlacementStore {
    path: PathBuf,
}

impl JsonPlacementStore {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StorageResult<BTreeMap<String, PlacementState>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StorageError::Io(err)),
        };
        serde_json::from_str(&contents).map_err(|source| StorageError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl PlacementStore for JsonPlacementStore {
    fn save_placement(&self, template_id: &str, state: &PlacementState) -> StorageResult<()> {
        if template_id.is_empty() {
            return Err(StorageError::MissingTemplateId);
        }
        let mut placements = self.read_all()?;
        placements.insert(template_id.to_string(), *state);
        let json = serde_json::to_string_pretty(&placements).map_err(StorageError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        tracing::debug!(template_id, scale = state.scale, "saved placeholder placement");
        Ok(())
    }

    fn load_placement(&self, template_id: &str) -> StorageResult<Option<PlacementState>> {
        if template_id.is_empty() {
            return Err(StorageError::MissingTemplateId);
        }
        Ok(self.read_all()?.remove(template_id))
    }
}
