use thiserror::Error;

const DEFAULT_LIMIT_MESSAGE: &str = "Download limit reached for this template.";

/// Export failures as the user sees them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("{message}")]
    LimitReached { message: String },
    #[error("image not ready: upload a photo first")]
    ImageNotReady,
    /// User dismissed the share sheet. Never shown.
    #[error("share cancelled by user")]
    ShareCancelled,
    #[error("export failed: {reason}")]
    ExportFailure { reason: String },
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

impl ExportError {
    pub(super) fn limit_reached(message: Option<String>) -> Self {
        let message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LIMIT_MESSAGE.to_string());
        Self::LimitReached { message }
    }

    pub(super) fn failure(reason: impl std::fmt::Display) -> Self {
        Self::ExportFailure {
            reason: reason.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExportFailure { .. } | Self::ImageNotReady)
    }

    /// Toast text, `None` for silent outcomes.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::LimitReached { message } => Some(message.clone()),
            Self::ImageNotReady => Some("Please upload a photo first.".to_string()),
            Self::ShareCancelled => None,
            Self::ExportFailure { .. } => Some(
                "Something went wrong while creating your image. Please try again.".to_string(),
            ),
        }
    }
}
