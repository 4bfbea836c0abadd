//! Discussion Lock Manager.
//!
//! Owns thread existence, the lock flag and message admission. Capability
//! checks happen in [`WorkflowEngine`](crate::engine::WorkflowEngine) before
//! these methods are reached.

use std::sync::Arc;

use ideaflow_core::discussion::{validate_message_body, DiscussionOwner};
use ideaflow_core::error::CoreError;
use ideaflow_core::identity::Actor;
use ideaflow_core::trail::event_types;
use ideaflow_core::types::DbId;
use ideaflow_db::models::discussion::{
    CreateDiscussion, CreateMessage, Discussion, DiscussionMessage, DiscussionThread, NewMessage,
};
use ideaflow_db::EntityStore;
use ideaflow_events::bus::names;
use ideaflow_events::{EventBus, PlatformEvent};

use crate::error::WorkflowResult;
use crate::trail::{AuditTrailLogger, TrailEntry};

pub struct DiscussionLockManager {
    store: Arc<dyn EntityStore>,
    trail: Arc<AuditTrailLogger>,
    bus: Arc<EventBus>,
}

impl DiscussionLockManager {
    pub fn new(store: Arc<dyn EntityStore>, trail: Arc<AuditTrailLogger>, bus: Arc<EventBus>) -> Self {
        Self { store, trail, bus }
    }

    /// Open the owner's thread. If one already exists it is returned as is.
    pub async fn create_thread(
        &self,
        actor: &Actor,
        owner: DiscussionOwner,
        context: Option<String>,
    ) -> WorkflowResult<Discussion> {
        if let Some(existing) = self.store.find_discussion(owner).await? {
            tracing::debug!(discussion_id = existing.id, ?owner, "Discussion already exists");
            return Ok(existing);
        }

        let idea_id = match owner {
            DiscussionOwner::Idea(id) => self.store.get_idea(id).await?.id,
            DiscussionOwner::Task(id) => self.store.get_task(id).await?.idea_id,
        };

        let id = self
            .store
            .create_discussion(&CreateDiscussion {
                owner,
                idea_id,
                context,
                participants: vec![actor.id],
            })
            .await?;
        let discussion = self.store.get_discussion(id).await?;

        tracing::info!(discussion_id = id, idea_id, ?owner, "Discussion opened");
        self.bus.publish(
            PlatformEvent::new(names::DISCUSSION_CREATED)
                .for_idea(idea_id)
                .with_source("discussion", id)
                .with_actor(actor.id)
                .with_payload(serde_json::json!({
                    "owner_type": owner.entity_type(),
                    "owner_id": owner.entity_id(),
                })),
        );
        Ok(discussion)
    }

    pub async fn thread_for(&self, owner: DiscussionOwner) -> WorkflowResult<Option<Discussion>> {
        Ok(self.store.find_discussion(owner).await?)
    }

    pub async fn get_thread(&self, id: DbId) -> WorkflowResult<DiscussionThread> {
        let discussion = self.store.get_discussion(id).await?;
        let messages = self.store.list_messages(id).await?;
        Ok(DiscussionThread {
            discussion,
            messages,
        })
    }

    /// Flip the lock flag. Setting the flag to its current value is a no-op
    /// and records nothing.
    pub async fn set_locked(
        &self,
        actor: &Actor,
        id: DbId,
        locked: bool,
    ) -> WorkflowResult<Discussion> {
        let mut discussion = self.store.get_discussion(id).await?;
        if discussion.locked == locked {
            return Ok(discussion);
        }

        self.store.set_discussion_locked(id, locked).await?;
        discussion.locked = locked;

        let (event_type, bus_name) = if locked {
            (event_types::DISCUSSION_LOCKED, names::DISCUSSION_LOCKED)
        } else {
            (event_types::DISCUSSION_UNLOCKED, names::DISCUSSION_UNLOCKED)
        };
        let mut entry = TrailEntry::new(discussion.idea_id, event_type).discussion(id);
        if let Some(task_id) = discussion.task_id() {
            entry = entry.task(task_id);
        }
        self.trail.append(actor, entry).await;

        tracing::info!(discussion_id = id, locked, "Discussion lock changed");
        self.bus.publish(
            PlatformEvent::new(bus_name)
                .for_idea(discussion.idea_id)
                .with_source("discussion", id)
                .with_actor(actor.id),
        );
        Ok(discussion)
    }

    /// Post a message. Fails with `DiscussionLocked` while the flag is set.
    pub async fn add_message(
        &self,
        actor: &Actor,
        id: DbId,
        input: NewMessage,
    ) -> WorkflowResult<DiscussionMessage> {
        validate_message_body(&input.body)?;
        let discussion = self.store.get_discussion(id).await?;
        if discussion.locked {
            return Err(CoreError::DiscussionLocked { discussion_id: id }.into());
        }

        let message = self
            .store
            .append_message(&CreateMessage {
                discussion_id: id,
                author_id: actor.id,
                author_name: actor.name.clone(),
                body: input.body,
                is_question: input.is_question,
                attachments: input.attachments,
            })
            .await?;
        let message_id = message.id;

        let mut entry = TrailEntry::new(discussion.idea_id, event_types::COMMENTED)
            .discussion(id)
            .metadata(serde_json::json!({
                "message_id": message_id,
                "is_question": message.is_question,
                "attachments": message.attachments.len(),
            }));
        if let Some(task_id) = discussion.task_id() {
            entry = entry.task(task_id);
        }
        self.trail.append(actor, entry).await;

        self.bus.publish(
            PlatformEvent::new(names::DISCUSSION_MESSAGE)
                .for_idea(discussion.idea_id)
                .with_source("discussion", id)
                .with_actor(actor.id)
                .with_payload(serde_json::json!({ "message_id": message_id })),
        );
        Ok(message)
    }

    /// Lock the threads of the given tasks. Tasks without a thread, and
    /// threads already locked, are skipped. A thread that cannot be read or
    /// locked is logged and the rest are still attempted. Returns the ids
    /// newly locked.
    pub async fn lock_for_tasks(&self, actor: &Actor, task_ids: &[DbId]) -> Vec<DbId> {
        let mut locked = Vec::new();
        for &task_id in task_ids {
            let thread = match self.store.find_discussion(DiscussionOwner::Task(task_id)).await {
                Ok(Some(thread)) => thread,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(task_id, error = %e, "Failed to look up task discussion");
                    continue;
                }
            };
            if thread.locked {
                continue;
            }
            match self.set_locked(actor, thread.id, true).await {
                Ok(_) => locked.push(thread.id),
                Err(e) => {
                    tracing::error!(
                        task_id,
                        discussion_id = thread.id,
                        error = %e,
                        "Failed to lock task discussion"
                    );
                }
            }
        }
        locked
    }
}
