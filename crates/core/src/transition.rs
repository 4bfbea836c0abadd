//! Idea transition graph.
//!
//! ```text
//! PendingApproval --review only--> Approved | Rejected
//! Approved --first task only--> InProgress
//! Approved | InProgress --all tasks done--> Completed
//! Approved | Rejected --undo only--> PendingApproval
//! ```
//!
//! Task statuses are unconstrained and have no graph here; only actor
//! capability decides which task fields may change (see [`crate::roles`]).

use crate::error::CoreError;
use crate::status::{IdeaStatus, TaskStatus};
use crate::trail::event_types;

/// How a transition was requested.
///
/// `Review` and `Undo` are only constructed by the approval coordinator, so
/// decisions and their reversal always pass its single-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// A user asked for the new status directly.
    Direct,
    /// An approve or reject decision.
    Review,
    /// The engine moved the idea as a side effect of creating its first task.
    TaskCreation,
    /// A compensating action restoring a snapshot.
    Undo,
}

impl TransitionOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionOrigin::Direct => "direct",
            TransitionOrigin::Review => "review",
            TransitionOrigin::TaskCreation => "task_creation",
            TransitionOrigin::Undo => "undo",
        }
    }
}

fn invalid(from: IdeaStatus, to: IdeaStatus, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidTransition {
        entity: "Idea",
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.into(),
    }
}

/// Validate one edge of the idea graph.
///
/// Completion preconditions that depend on tasks are checked separately by
/// [`check_completion`] because they need store data.
pub fn validate_idea_transition(
    from: IdeaStatus,
    to: IdeaStatus,
    origin: TransitionOrigin,
) -> Result<(), CoreError> {
    use IdeaStatus::*;

    if from == to {
        return Err(invalid(from, to, "idea is already in that status"));
    }

    if to == PendingApproval {
        return match (origin, from) {
            (TransitionOrigin::Undo, Approved | Rejected) => Ok(()),
            (TransitionOrigin::Undo, _) => {
                Err(invalid(from, to, "only review decisions can be undone"))
            }
            _ => Err(invalid(
                from,
                to,
                "pending approval can only be re-entered through undo",
            )),
        };
    }

    match (from, to) {
        (PendingApproval, Approved | Rejected) => match origin {
            TransitionOrigin::Review => Ok(()),
            _ => Err(invalid(from, to, "decisions are made through approve or reject")),
        },
        (Approved, InProgress) => match origin {
            TransitionOrigin::TaskCreation => Ok(()),
            _ => Err(invalid(from, to, "work starts when the first task is created")),
        },
        (Approved | InProgress, Completed) => Ok(()),
        _ => Err(invalid(from, to, "edge is not part of the idea workflow")),
    }
}

/// Completion requires every task of the idea to be `Completed`.
///
/// An idea without tasks may be completed directly.
pub fn check_completion(task_statuses: &[TaskStatus]) -> Result<(), CoreError> {
    let open = task_statuses
        .iter()
        .filter(|s| **s != TaskStatus::Completed)
        .count();
    if open == 0 {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "Idea",
            from: "*".to_string(),
            to: IdeaStatus::Completed.to_string(),
            reason: format!(
                "{open} of {} tasks are not completed",
                task_statuses.len()
            ),
        })
    }
}

/// Tasks may only be created under ideas that passed review.
pub fn accepts_tasks(status: IdeaStatus) -> bool {
    matches!(status, IdeaStatus::Approved | IdeaStatus::InProgress)
}

/// Map a successful idea transition to its trail event type.
pub fn event_type_for(to: IdeaStatus, origin: TransitionOrigin) -> &'static str {
    match (origin, to) {
        (TransitionOrigin::Review, IdeaStatus::Approved) => event_types::APPROVED,
        (TransitionOrigin::Review, IdeaStatus::Rejected) => event_types::REJECTED,
        _ => event_types::STATUS_CHANGED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use IdeaStatus::*;

    fn direct(from: IdeaStatus, to: IdeaStatus) -> Result<(), CoreError> {
        validate_idea_transition(from, to, TransitionOrigin::Direct)
    }

    fn review(from: IdeaStatus, to: IdeaStatus) -> Result<(), CoreError> {
        validate_idea_transition(from, to, TransitionOrigin::Review)
    }

    #[test]
    fn review_edges_need_a_review() {
        assert!(review(PendingApproval, Approved).is_ok());
        assert!(review(PendingApproval, Rejected).is_ok());
        assert!(direct(PendingApproval, Approved).is_err());
        assert!(direct(PendingApproval, Rejected).is_err());
        assert!(review(Approved, Rejected).is_err());
    }

    #[test]
    fn work_starts_only_with_the_first_task() {
        assert!(direct(Approved, InProgress).is_err());
        assert!(review(Approved, InProgress).is_err());
        assert!(validate_idea_transition(Approved, InProgress, TransitionOrigin::TaskCreation).is_ok());
    }

    #[test]
    fn completion_edges_are_allowed() {
        assert!(direct(Approved, Completed).is_ok());
        assert!(direct(InProgress, Completed).is_ok());
    }

    #[test]
    fn direct_return_to_pending_is_rejected() {
        for from in [Approved, Rejected, InProgress, Completed] {
            let err = direct(from, PendingApproval).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn undo_may_return_review_decisions_to_pending() {
        assert!(validate_idea_transition(Approved, PendingApproval, TransitionOrigin::Undo).is_ok());
        assert!(validate_idea_transition(Rejected, PendingApproval, TransitionOrigin::Undo).is_ok());
        assert!(
            validate_idea_transition(InProgress, PendingApproval, TransitionOrigin::Undo).is_err()
        );
    }

    #[test]
    fn other_edges_are_rejected() {
        assert!(direct(PendingApproval, InProgress).is_err());
        assert!(direct(PendingApproval, Completed).is_err());
        assert!(direct(Rejected, Approved).is_err());
        assert!(direct(Completed, InProgress).is_err());
        assert!(direct(InProgress, Approved).is_err());
    }

    #[test]
    fn same_status_is_rejected() {
        assert!(direct(Approved, Approved).is_err());
    }

    #[test]
    fn completion_without_tasks_succeeds() {
        assert!(check_completion(&[]).is_ok());
    }

    #[test]
    fn completion_requires_every_task_completed() {
        assert!(check_completion(&[TaskStatus::Completed, TaskStatus::Completed]).is_ok());
        let err = check_completion(&[TaskStatus::Completed, TaskStatus::OnHold]).unwrap_err();
        assert!(err.to_string().contains("1 of 2 tasks"));
    }

    #[test]
    fn event_types_follow_transition() {
        assert_eq!(event_type_for(Approved, TransitionOrigin::Review), "approved");
        assert_eq!(event_type_for(Rejected, TransitionOrigin::Review), "rejected");
        assert_eq!(event_type_for(Completed, TransitionOrigin::Direct), "status_changed");
        assert_eq!(event_type_for(PendingApproval, TransitionOrigin::Undo), "status_changed");
        assert_eq!(event_type_for(InProgress, TransitionOrigin::TaskCreation), "status_changed");
    }

    #[test]
    fn only_reviewed_ideas_accept_tasks() {
        assert!(accepts_tasks(Approved));
        assert!(accepts_tasks(InProgress));
        assert!(!accepts_tasks(PendingApproval));
        assert!(!accepts_tasks(Rejected));
        assert!(!accepts_tasks(Completed));
    }
}
