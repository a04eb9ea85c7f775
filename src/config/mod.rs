use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::controller::ControllerSettings;
use crate::placement::DEFAULT_MAX_ZOOM_FACTOR;
use crate::preview::PreviewQuality;
use crate::storage::{StorageResult, StorageService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "meetme";
const APP_CONFIG_FILE: &str = "config.json";
const PLACEMENTS_FILE: &str = "placements.json";

const DEFAULT_PREVIEW_MAX_QUALITY: f64 = 3.0;
const DEFAULT_PREVIEW_MOBILE_QUALITY: f64 = 2.0;
const DEFAULT_WHEEL_ZOOM_STEP: f64 = 1.1;
pub const DEFAULT_LINKEDIN_COMPOSE_URL: &str =
    "https://www.linkedin.com/feed/?shareActive=true&text=";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub download_dir: Option<PathBuf>,
    pub preview_max_quality: f64,
    pub preview_mobile_quality: f64,
    pub max_zoom_factor: f64,
    pub wheel_zoom_step: f64,
    pub linkedin_compose_url: Option<String>,
    pub placements_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            preview_max_quality: DEFAULT_PREVIEW_MAX_QUALITY,
            preview_mobile_quality: DEFAULT_PREVIEW_MOBILE_QUALITY,
            max_zoom_factor: DEFAULT_MAX_ZOOM_FACTOR,
            wheel_zoom_step: DEFAULT_WHEEL_ZOOM_STEP,
            linkedin_compose_url: None,
            placements_file: None,
        }
    }
}

impl AppConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        let defaults = ControllerSettings::default();
        ControllerSettings {
            max_zoom_factor: positive_or(self.max_zoom_factor, defaults.max_zoom_factor),
            wheel_zoom_step: positive_or(self.wheel_zoom_step, defaults.wheel_zoom_step),
            ..defaults
        }
    }

    pub fn preview_quality(&self) -> PreviewQuality {
        PreviewQuality::new(self.preview_max_quality, self.preview_mobile_quality)
    }

    pub fn linkedin_compose_url(&self) -> &str {
        self.linkedin_compose_url
            .as_deref()
            .unwrap_or(DEFAULT_LINKEDIN_COMPOSE_URL)
    }

    /// Saves into the configured download directory, else the platform one.
    pub fn storage_service(&self) -> StorageResult<StorageService> {
        match &self.download_dir {
            Some(dir) => Ok(StorageService::with_paths(dir.clone())),
            None => StorageService::with_default_paths(),
        }
    }

    /// Configured placements file, else next to `config.json`.
    pub fn resolved_placements_file(
        &self,
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> Result<PathBuf, ConfigPathError> {
        match &self.placements_file {
            Some(path) => Ok(path.clone()),
            None => app_config_path(APP_DIR, PLACEMENTS_FILE, xdg_config_home, home),
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "meetme",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/meetme/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("meetme", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/meetme/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("meetme", "config.json", None, None)
            .expect_err("missing home should fail");
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let config = load_app_config_with(Some(dir.path()), None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.max_zoom_factor, 3.0);
        assert_eq!(config.linkedin_compose_url(), DEFAULT_LINKEDIN_COMPOSE_URL);
    }

    #[test]
    fn partial_config_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let app_dir = dir.path().join("meetme");
        std::fs::create_dir_all(&app_dir).expect("config dir should be created");
        std::fs::write(
            app_dir.join("config.json"),
            r#"{"max_zoom_factor": 4.0, "download_dir": "/srv/out"}"#,
        )
        .expect("config should be written");

        let config = load_app_config_with(Some(dir.path()), None);
        assert_eq!(config.max_zoom_factor, 4.0);
        assert_eq!(config.download_dir, Some(PathBuf::from("/srv/out")));
        assert_eq!(config.preview_max_quality, 3.0);
        assert_eq!(config.controller_settings().max_zoom_factor, 4.0);
        assert_eq!(config.preview_quality(), PreviewQuality::default());
    }

    #[test]
    fn malformed_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let app_dir = dir.path().join("meetme");
        std::fs::create_dir_all(&app_dir).expect("config dir should be created");
        std::fs::write(app_dir.join("config.json"), "{ not json")
            .expect("config should be written");

        assert_eq!(load_app_config_with(Some(dir.path()), None), AppConfig::default());
    }

    #[test]
    fn invalid_numeric_settings_fall_back_in_controller_settings() {
        let config = AppConfig {
            max_zoom_factor: -1.0,
            wheel_zoom_step: f64::NAN,
            ..AppConfig::default()
        };
        let settings = config.controller_settings();
        assert_eq!(settings.max_zoom_factor, 3.0);
        assert_eq!(settings.wheel_zoom_step, 1.1);
    }

    #[test]
    fn placements_file_defaults_next_to_config() {
        let path = AppConfig::default()
            .resolved_placements_file(None, Some(Path::new("/home/admin")))
            .expect("path should resolve");
        assert_eq!(path, PathBuf::from("/home/admin/.config/meetme/placements.json"));

        let config = AppConfig {
            download_dir: Some(PathBuf::from("/srv/exports")),
            ..AppConfig::default()
        };
        let storage = config.storage_service().expect("storage should resolve");
        assert_eq!(storage.download_dir(), Path::new("/srv/exports"));
    }
}
