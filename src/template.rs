//! Template records consumed by the compositing core.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{logical_frame_rect, FrameFormat, NormalizedFrame, PixelRect};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template id is empty")]
    MissingId,
    #[error("template {id} has no overlay image reference")]
    MissingImage { id: String },
    #[error("template {id} not found")]
    NotFound { id: String },
    #[error("failed to parse template record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("template source failed: {message}")]
    Source { message: String },
}

pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// A reusable branded frame. Read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub format: FrameFormat,
    /// Transparent overlay drawn on top of the photo (path or URL).
    pub image_url: String,
    pub photo_frame: NormalizedFrame,
}

impl Template {
    pub fn from_json(json: &str) -> TemplateResult<Self> {
        let template: Template = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> TemplateResult<()> {
        if self.id.trim().is_empty() {
            return Err(TemplateError::MissingId);
        }
        if self.image_url.trim().is_empty() {
            return Err(TemplateError::MissingImage {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Frame rectangle at the format's logical resolution.
    pub fn frame_pixels(&self) -> PixelRect {
        logical_frame_rect(self.format, &self.photo_frame)
    }
}

/// Read-only template lookup. No caching happens on this side.
pub trait TemplateSource {
    fn fetch_template(&self, template_id: &str) -> TemplateResult<Template>;
}

/// Template records stored as `<id>.json` in one directory. Overlay
/// references inside a record resolve relative to that directory.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    root: PathBuf,
}

impl DirectoryTemplateSource {
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn overlay_path(&self, template: &Template) -> PathBuf {
        self.root.join(&template.image_url)
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn fetch_template(&self, template_id: &str) -> TemplateResult<Template> {
        let id = template_id.trim();
        if id.is_empty() {
            return Err(TemplateError::MissingId);
        }
        let not_found = || TemplateError::NotFound { id: id.to_string() };
        if id == "." || id == ".." || id.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
            return Err(not_found());
        }

        let path = self.root.join(format!("{id}.json"));
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(err) => {
                return Err(TemplateError::Source {
                    message: format!("{}: {err}", path.display()),
                })
            }
        };
        let template = Template::from_json(&json)?;
        if template.id != id {
            return Err(TemplateError::Source {
                message: format!("{} declares id {}", path.display(), template.id),
            });
        }
        tracing::debug!(template_id = id, format = %template.format, "template record loaded");
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_TEMPLATE: &str = r#"{
        "id": "tpl-1",
        "name": "Speaker Card",
        "format": "square",
        "imageUrl": "overlays/speaker.png",
        "photoFrame": {"x": 0.2, "y": 0.2, "width": 0.6, "height": 0.6}
    }"#;

    #[test]
    fn from_json_reads_camel_case_record() {
        let template = Template::from_json(SQUARE_TEMPLATE).expect("template should parse");
        assert_eq!(template.format, FrameFormat::Square);
        assert_eq!(template.image_url, "overlays/speaker.png");

        let frame = template.frame_pixels();
        assert!((frame.x - 216.0).abs() < 1e-9);
        assert!((frame.width - 648.0).abs() < 1e-9);
    }

    #[test]
    fn from_json_rejects_frame_outside_template() {
        let json = SQUARE_TEMPLATE.replace(r#""x": 0.2"#, r#""x": 0.6"#);
        assert!(matches!(
            Template::from_json(&json),
            Err(TemplateError::Parse(_))
        ));
    }

    #[test]
    fn directory_source_reads_record_by_id() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        std::fs::write(dir.path().join("tpl-1.json"), SQUARE_TEMPLATE)
            .expect("record should be written");
        let source = DirectoryTemplateSource::new(dir.path().to_path_buf());

        let template = source.fetch_template("tpl-1").expect("template should load");
        assert_eq!(template.name, "Speaker Card");
        assert_eq!(
            source.overlay_path(&template),
            dir.path().join("overlays/speaker.png")
        );
    }

    #[test]
    fn directory_source_reports_missing_and_mismatched_records() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        std::fs::write(dir.path().join("renamed.json"), SQUARE_TEMPLATE)
            .expect("record should be written");
        let source = DirectoryTemplateSource::new(dir.path().to_path_buf());

        assert!(matches!(
            source.fetch_template("tpl-2"),
            Err(TemplateError::NotFound { id }) if id == "tpl-2"
        ));
        assert!(matches!(
            source.fetch_template("../tpl-1"),
            Err(TemplateError::NotFound { .. })
        ));
        assert!(matches!(
            source.fetch_template(" "),
            Err(TemplateError::MissingId)
        ));
        assert!(matches!(
            source.fetch_template("renamed"),
            Err(TemplateError::Source { .. })
        ));
    }

    #[test]
    fn validate_requires_id_and_overlay() {
        let mut template = Template::from_json(SQUARE_TEMPLATE).expect("template should parse");
        template.image_url = " ".to_string();
        assert!(matches!(
            template.validate(),
            Err(TemplateError::MissingImage { .. })
        ));

        template.id.clear();
        assert!(matches!(template.validate(), Err(TemplateError::MissingId)));
    }
}
