use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

const WL_COPY_COMMAND: &str = "wl-copy";
const MIME_TEXT_PLAIN_UTF8: &str = "text/plain;charset=utf-8";
const MIME_IMAGE_PNG: &str = "image/png";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to run wl-copy command: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write clipboard payload: {source}")]
    WritePayload {
        #[source]
        source: io::Error,
    },
    #[error("wl-copy exited with non-zero status: {status}")]
    CommandFailed { status: String },
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardBackend {
    fn copy_text(&self, text: &str) -> ClipboardResult<()>;
    fn copy_png(&self, bytes: &[u8]) -> ClipboardResult<()>;
}

#[derive(Debug, Default)]
pub struct WlCopyBackend;

impl WlCopyBackend {
    fn pipe(&self, mime: &str, payload: &[u8]) -> ClipboardResult<()> {
        let mut child = Command::new(WL_COPY_COMMAND)
            .arg("--type")
            .arg(mime)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|err| ClipboardError::CommandIo {
                command: WL_COPY_COMMAND.to_string(),
                source: err,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload)
                .map_err(|source| ClipboardError::WritePayload { source })?;
        }

        let status = child.wait().map_err(|err| ClipboardError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source: err,
        })?;
        if status.success() {
            tracing::debug!(mime, bytes = payload.len(), "copied to clipboard");
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                status: status.to_string(),
            })
        }
    }
}

impl ClipboardBackend for WlCopyBackend {
    fn copy_text(&self, text: &str) -> ClipboardResult<()> {
        self.pipe(MIME_TEXT_PLAIN_UTF8, text.as_bytes())
    }

    fn copy_png(&self, bytes: &[u8]) -> ClipboardResult<()> {
        self.pipe(MIME_IMAGE_PNG, bytes)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::{ClipboardBackend, ClipboardError, ClipboardResult};

    #[derive(Debug, Default)]
    pub(crate) struct MockClipboard {
        pub(crate) texts: RefCell<Vec<String>>,
        pub(crate) images: RefCell<Vec<Vec<u8>>>,
        pub(crate) fail: bool,
    }

    impl MockClipboard {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn write_count(&self) -> usize {
            self.texts.borrow().len() + self.images.borrow().len()
        }
    }

    impl ClipboardBackend for MockClipboard {
        fn copy_text(&self, text: &str) -> ClipboardResult<()> {
            if self.fail {
                return Err(ClipboardError::CommandFailed {
                    status: "exit status: 1".to_string(),
                });
            }
            self.texts.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn copy_png(&self, bytes: &[u8]) -> ClipboardResult<()> {
            if self.fail {
                return Err(ClipboardError::CommandFailed {
                    status: "exit status: 1".to_string(),
                });
            }
            self.images.borrow_mut().push(bytes.to_vec());
            Ok(())
        }
    }
}
