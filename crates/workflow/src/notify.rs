//! One notification per finished user action.

use std::sync::Arc;

use ideaflow_events::{Notification, NotificationSink};

use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};

/// Turns action outcomes into notifications with the configured durations.
#[derive(Clone)]
pub struct ActionNotifier {
    sink: Arc<dyn NotificationSink>,
    success_ms: u64,
    error_ms: u64,
}

impl ActionNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>, config: &WorkflowConfig) -> Self {
        Self {
            sink,
            success_ms: config.success_notification_ms,
            error_ms: config.error_notification_ms,
        }
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        self.sink
            .emit(Notification::success(title, message).with_duration(self.success_ms));
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) {
        self.sink.emit(Notification::info(title, message));
    }

    /// Emit the error notification for `error` and hand it back.
    ///
    /// Store failures get a retry hint.
    pub fn failure(&self, error: WorkflowError) -> WorkflowError {
        let message = if error.is_store_failure() {
            format!("{error}. Please try again.")
        } else {
            error.to_string()
        };
        self.sink.emit(
            Notification::error(error.notification_title(), message).with_duration(self.error_ms),
        );
        error
    }

    /// Emit a success built from the value, or the failure, and pass the
    /// result through.
    pub fn report<T>(
        &self,
        result: WorkflowResult<T>,
        on_success: impl FnOnce(&T) -> (String, String),
    ) -> WorkflowResult<T> {
        match result {
            Ok(value) => {
                let (title, message) = on_success(&value);
                self.success(title, message);
                Ok(value)
            }
            Err(e) => Err(self.failure(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use ideaflow_core::error::CoreError;
    use ideaflow_db::StoreError;
    use ideaflow_events::{BroadcastNotifier, NotificationKind};

    use super::*;

    fn notifier() -> (Arc<BroadcastNotifier>, ActionNotifier) {
        let sink = Arc::new(BroadcastNotifier::default());
        let notifier = ActionNotifier::new(sink.clone(), &WorkflowConfig::default());
        (sink, notifier)
    }

    #[test]
    fn success_uses_configured_duration() {
        let (sink, notifier) = notifier();
        let result: WorkflowResult<i64> = Ok(7);
        let value = notifier
            .report(result, |id| ("Task created".into(), format!("Task #{id}")))
            .unwrap();
        assert_eq!(value, 7);

        let recent = sink.recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].kind, NotificationKind::Success);
        assert_eq!(recent[0].message, "Task #7");
        assert_eq!(recent[0].duration_ms, 3000);
    }

    #[test]
    fn store_failure_asks_for_retry() {
        let (sink, notifier) = notifier();
        let err = notifier.failure(StoreError::Unavailable("socket closed".into()).into());
        assert!(err.is_store_failure());

        let recent = sink.recent();
        assert_eq!(recent[0].kind, NotificationKind::Error);
        assert_eq!(recent[0].title, "Action failed");
        assert!(recent[0].message.ends_with("Please try again."));
        assert_eq!(recent[0].duration_ms, 5000);
    }

    #[test]
    fn domain_failure_keeps_message() {
        let (sink, notifier) = notifier();
        notifier.failure(CoreError::DiscussionLocked { discussion_id: 4 }.into());
        assert_eq!(sink.recent()[0].title, "Discussion locked");
    }
}
