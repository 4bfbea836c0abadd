//! Task field rules.
//!
//! `percent_complete` and `Completed` are independent: a task may be marked
//! completed at 80% or sit at 100% while on hold. Only the range is enforced.

use crate::error::CoreError;

pub const MIN_PERCENT_COMPLETE: i16 = 0;
pub const MAX_PERCENT_COMPLETE: i16 = 100;

/// Validate that a progress value lies in `0..=100`.
pub fn validate_percent_complete(value: i16) -> Result<(), CoreError> {
    if (MIN_PERCENT_COMPLETE..=MAX_PERCENT_COMPLETE).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "percent_complete must be between {MIN_PERCENT_COMPLETE} and \
             {MAX_PERCENT_COMPLETE}, got {value}"
        )))
    }
}

/// Task fields an assignee without `ManageTasks` may change.
pub const ASSIGNEE_EDITABLE_FIELDS: &[&str] = &["status", "percent_complete"];

/// Reject any field outside [`ASSIGNEE_EDITABLE_FIELDS`].
pub fn validate_assignee_fields(changed: &[&str]) -> Result<(), CoreError> {
    let forbidden: Vec<&str> = changed
        .iter()
        .copied()
        .filter(|f| !ASSIGNEE_EDITABLE_FIELDS.contains(f))
        .collect();
    if forbidden.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Assignees may only change status and progress, not: {}",
            forbidden.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_bounds_are_inclusive() {
        assert!(validate_percent_complete(0).is_ok());
        assert!(validate_percent_complete(100).is_ok());
        assert!(validate_percent_complete(-1).is_err());
        assert!(validate_percent_complete(101).is_err());
    }

    #[test]
    fn assignee_may_change_status_and_progress() {
        assert!(validate_assignee_fields(&["status", "percent_complete"]).is_ok());
        assert!(validate_assignee_fields(&[]).is_ok());
    }

    #[test]
    fn assignee_may_not_change_other_fields() {
        let err = validate_assignee_fields(&["status", "title", "due_date"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("title"));
        assert!(msg.contains("due_date"));
        assert!(!msg.contains("status,"));
    }
}
