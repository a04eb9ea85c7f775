//! User-facing toasts.

const APP_NAME: &str = "MeetMe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    /// Stays visible until dismissed; used when the user still has manual
    /// steps to finish.
    pub persistent: bool,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
            persistent: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
            persistent: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
            persistent: false,
        }
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }
}

/// Fire-and-forget toast sink. Delivery failures are logged, never returned.
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Desktop notifications through the session notification daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNotifier;

impl Notifier for SystemNotifier {
    fn notify(&self, toast: Toast) {
        let summary = match toast.level {
            ToastLevel::Info | ToastLevel::Success => APP_NAME,
            ToastLevel::Error => "MeetMe error",
        };
        let timeout = if toast.persistent {
            notify_rust::Timeout::Never
        } else {
            notify_rust::Timeout::Default
        };
        if let Err(err) = notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(summary)
            .body(&toast.message)
            .timeout(timeout)
            .show()
        {
            tracing::warn!("system notification failed: {err}");
        }
    }
}

/// Headless sink: toasts go to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => tracing::warn!(persistent = toast.persistent, "{}", toast.message),
            ToastLevel::Info | ToastLevel::Success => {
                tracing::info!(persistent = toast.persistent, "{}", toast.message)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::{Notifier, Toast};

    #[derive(Debug, Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) toasts: RefCell<Vec<Toast>>,
    }

    impl RecordingNotifier {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.toasts
                .borrow()
                .iter()
                .map(|toast| toast.message.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, toast: Toast) {
            self.toasts.borrow_mut().push(toast);
        }
    }
}
