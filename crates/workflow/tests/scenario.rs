//! End to end: review, task work, completion and discussion lock.

mod common;

use assert_matches::assert_matches;
use common::{admin, approver, contributor, pending_idea, Harness};
use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::error::CoreError;
use ideaflow_core::status::{IdeaStatus, TaskStatus};
use ideaflow_core::trail::event_types;
use ideaflow_core::undo::ApprovalAction;
use ideaflow_db::models::discussion::NewMessage;
use ideaflow_db::models::task::TaskUpdate;
use ideaflow_events::bus::names;
use ideaflow_workflow::WorkflowError;

#[tokio::test]
async fn idea_42_from_review_to_completion() {
    let h = Harness::new();
    let mut events = h.bus.subscribe();

    // Unrelated work already in the system takes task ids 1..=6.
    let other = h.approved("Unrelated").await;
    for n in 1..=6 {
        h.task_for(other.id, &format!("filler {n}"), vec![]).await;
    }

    h.store
        .seed_idea(pending_idea(42, "Reduce onboarding time"))
        .await;
    h.coordinator.refresh_pending().await.unwrap();
    assert_eq!(h.coordinator.pending()[0].id, 42);

    // approve(#42)
    let approved = h
        .coordinator
        .handle_approval_by_id(42, ApprovalAction::Approve, &approver())
        .await
        .unwrap();
    assert_eq!(approved.status, IdeaStatus::Approved);
    let latest = &h.trail_for(42).await[0];
    assert_eq!(latest.event_type, event_types::APPROVED);
    assert_eq!(latest.previous_status.as_deref(), Some("pending_approval"));
    assert_eq!(latest.new_status.as_deref(), Some("approved"));

    // Admin creates Task #7 under #42.
    let task = h.task_for(42, "Write onboarding checklist", vec![contributor().id]).await;
    assert_eq!(task, 7);
    let trail = h.trail_for(42).await;
    assert!(trail
        .iter()
        .any(|e| e.event_type == event_types::TASK_CREATED && e.task_id == Some(7)));

    // Contributor completes the only task.
    let done = h
        .engine
        .update_task(
            &contributor(),
            7,
            TaskUpdate {
                status: Some(TaskStatus::Completed),
                percent_complete: Some(100),
                ..TaskUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);

    // Admin completes Idea #42.
    let completed = h
        .engine
        .transition_idea(&admin(), 42, IdeaStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, IdeaStatus::Completed);

    let trail = h.trail_for(42).await;
    assert!(trail.iter().any(|e| e.event_type == event_types::STATUS_CHANGED
        && e.task_id.is_none()
        && e.new_status.as_deref() == Some("completed")));

    // Task #7's thread is locked.
    let thread = h
        .engine
        .discussions()
        .thread_for(DiscussionOwner::Task(7))
        .await
        .unwrap()
        .expect("task thread opened on creation");
    assert!(thread.locked);
    let blocked = h
        .engine
        .add_message(
            &contributor(),
            thread.id,
            NewMessage {
                body: "One more thing".into(),
                is_question: false,
                attachments: vec![],
            },
        )
        .await;
    assert_matches!(
        blocked,
        Err(WorkflowError::Core(CoreError::DiscussionLocked { .. }))
    );

    // The bus saw the approval and the completion.
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.idea_id == Some(42) {
            seen.push(event.event_type);
        }
    }
    assert!(seen.iter().any(|e| e == names::IDEA_APPROVED));
    assert!(seen.iter().any(|e| e == names::DISCUSSION_LOCKED));
    assert_eq!(seen.last().map(String::as_str), Some(names::IDEA_STATUS_CHANGED));

    assert!(h.trail.verify_integrity().await.unwrap().chain_valid);
}
