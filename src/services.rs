//! Boundary collaborators for export: the download-limit check and the
//! analytics sink.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },
    #[error("{service} timed out")]
    Timeout { service: &'static str },
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Answer of the download-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitDecision {
    pub success: bool,
    pub limit_reached: bool,
    pub message: Option<String>,
}

impl LimitDecision {
    pub fn allowed() -> Self {
        Self {
            success: true,
            limit_reached: false,
            message: None,
        }
    }

    pub fn limit_reached(message: impl Into<String>) -> Self {
        Self {
            success: false,
            limit_reached: true,
            message: Some(message.into()),
        }
    }

    /// Only an explicit limit blocks export; any other unsuccessful answer
    /// fails open.
    pub fn blocks_export(&self) -> bool {
        self.limit_reached
    }
}

pub trait DownloadLimiter {
    /// Called once per export attempt, before rendering.
    fn check_and_reserve(&self, event_id: &str, template_id: &str) -> ServiceResult<LimitDecision>;
}

pub trait DownloadTracker {
    /// Best-effort; callers never retry.
    fn record_download(&self, event_id: &str, template_id: &str) -> ServiceResult<()>;
}

/// Limiter for deployments without a limit service.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl DownloadLimiter for Unlimited {
    fn check_and_reserve(
        &self,
        _event_id: &str,
        _template_id: &str,
    ) -> ServiceResult<LimitDecision> {
        Ok(LimitDecision::allowed())
    }
}

/// Tracker that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracker;

impl DownloadTracker for LogTracker {
    fn record_download(&self, event_id: &str, template_id: &str) -> ServiceResult<()> {
        tracing::info!(event_id, template_id, "download recorded");
        Ok(())
    }
}
