//! Approval Coordinator.
//!
//! Runs approve, reject and undo for one reviewer session. At most one of
//! them is in flight at a time; a second call made while one is running
//! fails with `Busy`. Each call resolves to exactly one notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use ideaflow_core::error::CoreError;
use ideaflow_core::identity::Actor;
use ideaflow_core::status::IdeaStatus;
use ideaflow_core::types::DbId;
use ideaflow_core::undo::ApprovalAction;
use ideaflow_db::models::idea::{Idea, IdeaFilter};
use ideaflow_events::NotificationSink;

use crate::config::WorkflowConfig;
use crate::engine::WorkflowEngine;
use crate::error::{WorkflowError, WorkflowResult};
use crate::notify::ActionNotifier;
use crate::undo::{UndoCache, UndoRecord};

/// Clears the in-flight flag when the action finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ApprovalCoordinator {
    engine: Arc<WorkflowEngine>,
    undo: UndoCache,
    notify: ActionNotifier,
    config: WorkflowConfig,
    in_flight: AtomicBool,
    /// Ideas awaiting review, oldest first.
    pending: Mutex<Vec<Idea>>,
}

impl ApprovalCoordinator {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        undo: UndoCache,
        notifier: Arc<dyn NotificationSink>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            engine,
            undo,
            notify: ActionNotifier::new(notifier, &config),
            config,
            in_flight: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, CoreError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| CoreError::Busy("Another approval action is still in progress".into()))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Pending working set
    // -----------------------------------------------------------------------

    /// Reload the pending set from the store.
    pub async fn refresh_pending(&self) -> WorkflowResult<Vec<Idea>> {
        let ideas = self
            .engine
            .list_ideas(&IdeaFilter::with_status(IdeaStatus::PendingApproval))
            .await?;
        *self.lock_pending() = ideas.clone();
        tracing::debug!(count = ideas.len(), "Pending set refreshed");
        Ok(ideas)
    }

    pub fn pending(&self) -> Vec<Idea> {
        self.lock_pending().clone()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<Idea>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }

    // -----------------------------------------------------------------------
    // Approve / reject
    // -----------------------------------------------------------------------

    /// Approve or reject `idea`.
    ///
    /// The undo snapshot is taken from `idea` before anything is awaited. It
    /// replaces the retained record only if the transition commits; on
    /// failure the new record is dropped and any earlier one stays.
    pub async fn handle_approval_action(
        &self,
        idea: &Idea,
        action: ApprovalAction,
        actor: &Actor,
    ) -> WorkflowResult<Idea> {
        let _in_flight = match self.begin() {
            Ok(guard) => guard,
            Err(e) => return Err(self.fail(e.into())),
        };
        let record = UndoRecord::snapshot(idea, action, Utc::now());

        match self
            .engine
            .review_idea(actor, idea.id, action.target_status())
            .await
        {
            Ok(updated) => {
                self.lock_pending().retain(|i| i.id != updated.id);
                self.undo.store(record).await;
                tracing::info!(
                    idea_id = updated.id,
                    action = action.as_str(),
                    user_id = actor.id,
                    "Approval action applied"
                );
                let minutes = self.undo.window_secs() / 60;
                self.notify.success(
                    format!("Idea {}", action.past_tense()),
                    format!(
                        "\"{}\" was {}. You can undo this within {minutes} minutes.",
                        updated.title,
                        action.past_tense()
                    ),
                );
                Ok(updated)
            }
            Err(e) => {
                drop(record);
                tracing::warn!(
                    idea_id = idea.id,
                    action = action.as_str(),
                    error = %e,
                    "Approval action failed"
                );
                Err(self.fail(e))
            }
        }
    }

    /// Resolve `idea_id` from the pending set, falling back to the store,
    /// then run [`handle_approval_action`](Self::handle_approval_action).
    pub async fn handle_approval_by_id(
        &self,
        idea_id: DbId,
        action: ApprovalAction,
        actor: &Actor,
    ) -> WorkflowResult<Idea> {
        let cached = self.lock_pending().iter().find(|i| i.id == idea_id).cloned();
        let idea = match cached {
            Some(idea) => idea,
            None => match self.engine.get_idea(idea_id).await {
                Ok(idea) => idea,
                Err(e) => return Err(self.fail(e)),
            },
        };
        self.handle_approval_action(&idea, action, actor).await
    }

    // -----------------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------------

    /// Reverse the retained approve/reject.
    ///
    /// The slot is emptied whatever the outcome. A restored pending idea goes
    /// back to the head of the pending set.
    pub async fn handle_undo(&self, actor: &Actor) -> WorkflowResult<Idea> {
        let _in_flight = match self.begin() {
            Ok(guard) => guard,
            Err(e) => return Err(self.fail(e.into())),
        };

        let Some(record) = self.undo.take().await else {
            return Err(self.nothing_to_undo("There is no recent approval action to undo."));
        };
        if self.config.undo_revalidate_on_use && !record.is_live(Utc::now(), self.undo.window_secs()) {
            tracing::info!(idea_id = record.idea_id, "Undo record expired before use");
            return Err(self.nothing_to_undo("The last approval action can no longer be undone."));
        }

        match self
            .engine
            .restore_idea(actor, record.idea_id, record.original_status)
            .await
        {
            Ok(restored) => {
                if restored.status == IdeaStatus::PendingApproval {
                    let mut pending = self.lock_pending();
                    pending.retain(|i| i.id != restored.id);
                    pending.insert(0, restored.clone());
                }
                tracing::info!(
                    idea_id = restored.id,
                    undone = record.action.as_str(),
                    user_id = actor.id,
                    "Approval action undone"
                );
                self.notify.success(
                    "Action undone",
                    format!("\"{}\" is back to {}.", record.idea_title, restored.status),
                );
                Ok(restored)
            }
            Err(e) => {
                tracing::warn!(idea_id = record.idea_id, error = %e, "Undo failed");
                Err(self.fail(e))
            }
        }
    }

    /// The retained record, if it is still inside the window.
    pub async fn undo_status(&self) -> Option<UndoRecord> {
        let record = self.undo.peek().await?;
        if self.config.undo_revalidate_on_use && !record.is_live(Utc::now(), self.undo.window_secs()) {
            return None;
        }
        Some(record)
    }

    pub fn undo_window_secs(&self) -> i64 {
        self.undo.window_secs()
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    fn nothing_to_undo(&self, message: &str) -> WorkflowError {
        self.notify.info("Nothing to undo", message);
        CoreError::NothingToUndo.into()
    }

    fn fail(&self, error: WorkflowError) -> WorkflowError {
        self.notify.failure(error)
    }
}
