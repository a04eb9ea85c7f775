use std::fmt::Write as _;
use std::io;
use std::process::Command;

use thiserror::Error;

const XDG_OPEN_COMMAND: &str = "xdg-open";

#[derive(Debug, Error)]
pub enum ShareError {
    /// The user dismissed the share sheet.
    #[error("share cancelled by user")]
    Cancelled,
    #[error("share failed: {message}")]
    Failed { message: String },
    #[error("failed to run {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with non-zero status: {status}")]
    CommandFailed { command: String, status: String },
}

pub type ShareResult<T> = std::result::Result<T, ShareError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

/// Native file share (system share sheet).
pub trait ShareSheet {
    /// False when files cannot be shared natively.
    fn can_share_files(&self) -> bool;
    fn share_file(&self, bytes: &[u8], file_name: &str, caption: Option<&str>) -> ShareResult<()>;
}

/// Opens a URL in the user's browser.
pub trait UrlOpener {
    fn open_url(&self, url: &str) -> ShareResult<()>;
}

/// Share sheet for hosts without one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShareSheet;

impl ShareSheet for NoShareSheet {
    fn can_share_files(&self) -> bool {
        false
    }

    fn share_file(
        &self,
        _bytes: &[u8],
        _file_name: &str,
        _caption: Option<&str>,
    ) -> ShareResult<()> {
        Err(ShareError::Failed {
            message: "native file sharing is not available".to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XdgOpenBackend;

impl UrlOpener for XdgOpenBackend {
    fn open_url(&self, url: &str) -> ShareResult<()> {
        let status = Command::new(XDG_OPEN_COMMAND)
            .arg(url)
            .status()
            .map_err(|source| ShareError::CommandIo {
                command: XDG_OPEN_COMMAND.to_string(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ShareError::CommandFailed {
                command: XDG_OPEN_COMMAND.to_string(),
                status: status.to_string(),
            })
        }
    }
}

/// Appends the percent-encoded caption to a compose URL ending in `text=`.
pub fn compose_url(base: &str, caption: &str) -> String {
    let mut url = String::with_capacity(base.len() + caption.len() * 3);
    url.push_str(base);
    for byte in caption.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                url.push(char::from(byte));
            }
            _ => {
                let _ = write!(url, "%{byte:02X}");
            }
        }
    }
    url
}
