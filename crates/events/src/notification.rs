//! Transient user-facing notifications.
//!
//! Every state-changing workflow action resolves to exactly one
//! [`Notification`] emitted to a [`NotificationSink`].

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationKind {
    /// Display time used when the caller does not pick one.
    pub fn default_duration_ms(self) -> u64 {
        match self {
            NotificationKind::Success | NotificationKind::Info => 3000,
            NotificationKind::Warning => 4000,
            NotificationKind::Error => 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub duration_ms: u64,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            duration_ms: kind.default_duration_ms(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Destination for notifications produced by the workflow.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

// ---------------------------------------------------------------------------
// BroadcastNotifier
// ---------------------------------------------------------------------------

const RECENT_CAPACITY: usize = 50;

/// Sink that fans notifications out over a broadcast channel and keeps the
/// most recent ones for polling clients.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
    recent: Mutex<VecDeque<Notification>>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            recent: Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Most recent notifications, newest first.
    pub fn recent(&self) -> Vec<Notification> {
        let recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().rev().cloned().collect()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NotificationSink for BroadcastNotifier {
    fn emit(&self, notification: Notification) {
        tracing::debug!(
            kind = ?notification.kind,
            title = %notification.title,
            "Notification emitted"
        );
        {
            let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(notification.clone());
        }
        let _ = self.sender.send(notification);
    }
}
