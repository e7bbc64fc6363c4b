//! Toast notifications backed by a `tokio::sync::broadcast` channel.
//!
//! [`Notifier`] is cheap to clone and is handed explicitly to every
//! component that reports to the admin.  Each toast is also logged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Toast>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }

    pub fn notify(&self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Success | ToastLevel::Info => tracing::info!(?level, %message, "Toast"),
            ToastLevel::Warning => tracing::warn!(%message, "Toast"),
            ToastLevel::Error => tracing::error!(%message, "Toast"),
        }
        // Zero receivers is fine; toasts are fire-and-forget.
        let _ = self.sender.send(Toast {
            level,
            message,
            timestamp: Utc::now(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(ToastLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(ToastLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(ToastLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(ToastLevel::Error, message);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
