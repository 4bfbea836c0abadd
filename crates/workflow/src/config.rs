//! Tunables for the workflow services.

use ideaflow_core::undo::UNDO_WINDOW_SECS;

/// Default cap on rows scanned by a trail query.
pub const DEFAULT_TRAIL_SCAN_LIMIT: i64 = 500;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// How long an approve/reject stays undoable.
    pub undo_window_secs: i64,
    /// Also re-check undo expiry when the record is consumed. Off by default:
    /// a record that was live at load stays usable for the session.
    pub undo_revalidate_on_use: bool,
    pub trail_scan_limit: i64,
    pub success_notification_ms: u64,
    pub error_notification_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            undo_window_secs: UNDO_WINDOW_SECS,
            undo_revalidate_on_use: false,
            trail_scan_limit: DEFAULT_TRAIL_SCAN_LIMIT,
            success_notification_ms: 3000,
            error_notification_ms: 5000,
        }
    }
}
