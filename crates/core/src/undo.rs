//! Undo window constants and expiry checks.

use serde::{Deserialize, Serialize};

use crate::status::IdeaStatus;
use crate::types::Timestamp;

/// How long an approve/reject can be undone, in seconds.
pub const UNDO_WINDOW_SECS: i64 = 5 * 60;

/// Key under which the single undo slot is persisted.
pub const UNDO_STORAGE_KEY: &str = "ideaflow.last_approval_action";

/// The review action an undo record compensates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    /// Status the idea ends up in after the action.
    pub fn target_status(self) -> IdeaStatus {
        match self {
            ApprovalAction::Approve => IdeaStatus::Approved,
            ApprovalAction::Reject => IdeaStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject => "reject",
        }
    }

    /// Past-tense verb for notifications ("approved", "rejected").
    pub fn past_tense(self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approved",
            ApprovalAction::Reject => "rejected",
        }
    }
}

/// Returns `true` while `now` is within `window_secs` of `recorded_at`.
///
/// A record timestamped in the future (clock skew) counts as live.
pub fn is_within_window(recorded_at: Timestamp, now: Timestamp, window_secs: i64) -> bool {
    now.signed_duration_since(recorded_at).num_milliseconds() < window_secs * 1000
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn record_just_inside_window_is_live() {
        let t = Utc::now();
        let now = t + Duration::seconds(4 * 60 + 59);
        assert!(is_within_window(t, now, UNDO_WINDOW_SECS));
    }

    #[test]
    fn record_at_window_edge_is_expired() {
        let t = Utc::now();
        assert!(!is_within_window(t, t + Duration::seconds(300), UNDO_WINDOW_SECS));
        assert!(!is_within_window(t, t + Duration::seconds(301), UNDO_WINDOW_SECS));
    }

    #[test]
    fn future_record_is_live() {
        let now = Utc::now();
        assert!(is_within_window(now + Duration::seconds(10), now, UNDO_WINDOW_SECS));
    }

    #[test]
    fn actions_map_to_review_statuses() {
        assert_eq!(ApprovalAction::Approve.target_status(), IdeaStatus::Approved);
        assert_eq!(ApprovalAction::Reject.target_status(), IdeaStatus::Rejected);
        assert_eq!(ApprovalAction::Reject.past_tense(), "rejected");
    }
}
