//! In-memory [`EntityStore`] and [`TrailStore`].
//!
//! Backs the `memory` store backend and every workflow test. Supports
//! artificial latency and write-failure injection so concurrency and
//! failure paths can be exercised without a database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::status::{IdeaStatus, TaskStatus};
use ideaflow_core::types::DbId;
use tokio::sync::RwLock;

use crate::attachments::sanitize_file_name;
use crate::models::attachment::{Attachment, FileUpload};
use crate::models::discussion::{CreateDiscussion, CreateMessage, Discussion, DiscussionMessage};
use crate::models::idea::{CreateIdea, Idea, IdeaFilter, IdeaStatusChange, IdeaUpdate};
use crate::models::task::{CreateTask, Task, TaskFilter, TaskUpdate};
use crate::models::trail_event::{CreateTrailEvent, TrailEvent, TrailQuery};
use crate::store::{require, EntityStore, StoreError, StoreResult, TrailStore};

#[derive(Default)]
struct Counters {
    idea: DbId,
    task: DbId,
    discussion: DbId,
    message: DbId,
    trail: DbId,
}

fn bump(counter: &mut DbId) -> DbId {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct MemoryState {
    ids: Counters,
    ideas: BTreeMap<DbId, Idea>,
    tasks: BTreeMap<DbId, Task>,
    discussions: BTreeMap<DbId, Discussion>,
    messages: Vec<DiscussionMessage>,
    trail: Vec<TrailEvent>,
    files: HashMap<String, Vec<u8>>,
}

/// Process-local store. Cheap to construct; share it behind an `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    latency: Option<Duration>,
    fail_writes: AtomicBool,
    fail_trail_appends: AtomicBool,
    fail_locks: std::sync::Mutex<HashSet<DbId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`, like a remote store would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every entity write fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every trail append fail with [`StoreError::Unavailable`].
    pub fn set_fail_trail_appends(&self, fail: bool) {
        self.fail_trail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make lock changes on one discussion fail with [`StoreError::Unavailable`].
    pub fn fail_lock_changes_for(&self, discussion_id: DbId) {
        self.fail_locks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(discussion_id);
    }

    /// Insert an idea with a caller-chosen id, e.g. to reproduce a fixture.
    pub async fn seed_idea(&self, idea: Idea) {
        let mut state = self.state.write().await;
        state.ids.idea = state.ids.idea.max(idea.id);
        state.ideas.insert(idea.id, idea);
    }

    /// Number of stored trail events.
    pub async fn trail_len(&self) -> usize {
        self.state.read().await.trail.len()
    }

    /// Raw bytes of an uploaded attachment, by URL.
    pub async fn attachment_bytes(&self, url: &str) -> Option<Vec<u8>> {
        self.state.read().await.files.get(url).cloned()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn write_guard(&self) -> StoreResult<()> {
        self.pause().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn list_ideas(&self, filter: &IdeaFilter) -> StoreResult<Vec<Idea>> {
        self.pause().await;
        let state = self.state.read().await;
        let mut ideas: Vec<Idea> = state
            .ideas
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        ideas.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(ideas)
    }

    async fn get_idea(&self, id: DbId) -> StoreResult<Idea> {
        self.pause().await;
        let state = self.state.read().await;
        require("Idea", id, state.ideas.get(&id).cloned())
    }

    async fn create_idea(&self, input: &CreateIdea) -> StoreResult<DbId> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let id = bump(&mut state.ids.idea);
        let now = Utc::now();
        state.ideas.insert(
            id,
            Idea {
                id,
                title: input.title.clone(),
                description: input.description.clone(),
                category: input.category.clone(),
                priority: input.priority,
                status: IdeaStatus::PendingApproval,
                created_by: input.created_by,
                created_at: now,
                modified_at: now,
                approved_by: None,
                approved_at: None,
                attachments: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn update_idea(&self, id: DbId, update: &IdeaUpdate) -> StoreResult<()> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let idea = require("Idea", id, state.ideas.get_mut(&id))?;
        if let Some(title) = &update.title {
            idea.title = title.clone();
        }
        if let Some(description) = &update.description {
            idea.description = description.clone();
        }
        if let Some(category) = &update.category {
            idea.category = category.clone();
        }
        if let Some(priority) = update.priority {
            idea.priority = priority;
        }
        idea.modified_at = Utc::now();
        Ok(())
    }

    async fn set_idea_status(&self, id: DbId, change: &IdeaStatusChange) -> StoreResult<()> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let idea = require("Idea", id, state.ideas.get_mut(&id))?;
        idea.status = change.status;
        idea.approved_by = change.approved_by;
        idea.approved_at = change.approved_at;
        idea.modified_at = Utc::now();
        Ok(())
    }

    async fn add_idea_attachment(&self, id: DbId, attachment: &Attachment) -> StoreResult<()> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let idea = require("Idea", id, state.ideas.get_mut(&id))?;
        idea.attachments.push(attachment.clone());
        idea.modified_at = Utc::now();
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        self.pause().await;
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn get_task(&self, id: DbId) -> StoreResult<Task> {
        self.pause().await;
        let state = self.state.read().await;
        require("Task", id, state.tasks.get(&id).cloned())
    }

    async fn create_task(&self, input: &CreateTask) -> StoreResult<DbId> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        if !state.ideas.contains_key(&input.idea_id) {
            return Err(StoreError::NotFound {
                entity: "Idea",
                id: input.idea_id,
            });
        }
        let id = bump(&mut state.ids.task);
        let now = Utc::now();
        state.tasks.insert(
            id,
            Task {
                id,
                idea_id: input.idea_id,
                title: input.title.clone(),
                description: input.description.clone(),
                status: TaskStatus::NotStarted,
                priority: input.priority,
                percent_complete: 0,
                assigned_to: input.assigned_to.clone(),
                start_date: input.start_date,
                due_date: input.due_date,
                created_at: now,
                modified_at: now,
            },
        );
        Ok(id)
    }

    async fn update_task(&self, id: DbId, update: &TaskUpdate) -> StoreResult<()> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let task = require("Task", id, state.tasks.get_mut(&id))?;
        update.apply_to(task);
        task.modified_at = Utc::now();
        Ok(())
    }

    async fn find_discussion(&self, owner: DiscussionOwner) -> StoreResult<Option<Discussion>> {
        self.pause().await;
        let state = self.state.read().await;
        Ok(state
            .discussions
            .values()
            .find(|d| d.owner_type == owner.entity_type() && d.owner_id == owner.entity_id())
            .cloned())
    }

    async fn get_discussion(&self, id: DbId) -> StoreResult<Discussion> {
        self.pause().await;
        let state = self.state.read().await;
        require("Discussion", id, state.discussions.get(&id).cloned())
    }

    async fn create_discussion(&self, input: &CreateDiscussion) -> StoreResult<DbId> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let existing = state.discussions.values().find(|d| {
            d.owner_type == input.owner.entity_type() && d.owner_id == input.owner.entity_id()
        });
        if let Some(existing) = existing {
            return Ok(existing.id);
        }
        let id = bump(&mut state.ids.discussion);
        let now = Utc::now();
        state.discussions.insert(
            id,
            Discussion {
                id,
                owner_type: input.owner.entity_type().to_string(),
                owner_id: input.owner.entity_id(),
                idea_id: input.idea_id,
                context: input.context.clone(),
                locked: false,
                participants: input.participants.clone(),
                last_activity_at: now,
                created_at: now,
            },
        );
        Ok(id)
    }

    async fn set_discussion_locked(&self, id: DbId, locked: bool) -> StoreResult<()> {
        self.write_guard().await?;
        if self
            .fail_locks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&id)
        {
            return Err(StoreError::Unavailable(format!(
                "injected lock failure for discussion {id}"
            )));
        }
        let mut state = self.state.write().await;
        let discussion = require("Discussion", id, state.discussions.get_mut(&id))?;
        discussion.locked = locked;
        Ok(())
    }

    async fn list_messages(&self, discussion_id: DbId) -> StoreResult<Vec<DiscussionMessage>> {
        self.pause().await;
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.discussion_id == discussion_id)
            .cloned()
            .collect())
    }

    async fn append_message(&self, input: &CreateMessage) -> StoreResult<DiscussionMessage> {
        self.write_guard().await?;
        let mut state = self.state.write().await;
        let now = Utc::now();
        let discussion = require(
            "Discussion",
            input.discussion_id,
            state.discussions.get_mut(&input.discussion_id),
        )?;
        discussion.last_activity_at = now;
        if !discussion.participants.contains(&input.author_id) {
            discussion.participants.push(input.author_id);
        }
        let message = DiscussionMessage {
            id: bump(&mut state.ids.message),
            discussion_id: input.discussion_id,
            author_id: input.author_id,
            author_name: input.author_name.clone(),
            body: input.body.clone(),
            is_question: input.is_question,
            attachments: input.attachments.clone(),
            created_at: now,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn upload_attachment(
        &self,
        entity_id: DbId,
        file: FileUpload,
    ) -> StoreResult<Attachment> {
        self.write_guard().await?;
        let url = format!(
            "memory://{entity_id}/{}-{}",
            uuid::Uuid::new_v4(),
            sanitize_file_name(&file.file_name)
        );
        self.state
            .write()
            .await
            .files
            .insert(url.clone(), file.bytes);
        Ok(Attachment {
            file_name: file.file_name,
            url,
        })
    }
}

#[async_trait]
impl TrailStore for MemoryStore {
    async fn append_event(&self, event: &CreateTrailEvent) -> StoreResult<DbId> {
        self.pause().await;
        if self.fail_trail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected trail failure".into()));
        }
        let mut state = self.state.write().await;
        let id = bump(&mut state.ids.trail);
        state.trail.push(TrailEvent {
            id,
            idea_id: event.idea_id,
            task_id: event.task_id,
            discussion_id: event.discussion_id,
            event_type: event.event_type.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            actor: event.actor.clone(),
            previous_status: event.previous_status.clone(),
            new_status: event.new_status.clone(),
            metadata: event.metadata.clone(),
            integrity_hash: event.integrity_hash.clone(),
            timestamp: event.timestamp,
        });
        Ok(id)
    }

    async fn last_integrity_hash(&self) -> StoreResult<Option<String>> {
        self.pause().await;
        let state = self.state.read().await;
        Ok(state.trail.last().and_then(|e| e.integrity_hash.clone()))
    }

    fn stream_events(&self, query: TrailQuery) -> BoxStream<'_, StoreResult<TrailEvent>> {
        stream::once(async move {
            self.pause().await;
            let state = self.state.read().await;
            let mut events: Vec<TrailEvent> = state
                .trail
                .iter()
                .filter(|e| query.idea_id.map_or(true, |id| e.idea_id == id))
                .cloned()
                .collect();
            events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
            events.truncate(usize::try_from(query.limit).unwrap_or(0));
            stream::iter(events.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    fn stream_chain(&self) -> BoxStream<'_, StoreResult<TrailEvent>> {
        stream::once(async move {
            self.pause().await;
            let events = self.state.read().await.trail.clone();
            stream::iter(events.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use futures::TryStreamExt;
    use ideaflow_core::status::Priority;

    use super::*;
    use crate::models::trail_event::ActorRef;

    fn new_idea(title: &str) -> CreateIdea {
        CreateIdea {
            title: title.to_string(),
            description: String::new(),
            category: "process".to_string(),
            priority: Priority::Medium,
            created_by: 1,
        }
    }

    fn event(idea_id: DbId, event_type: &str) -> CreateTrailEvent {
        CreateTrailEvent {
            idea_id,
            task_id: None,
            discussion_id: None,
            event_type: event_type.to_string(),
            title: event_type.to_string(),
            description: String::new(),
            actor: ActorRef {
                id: 1,
                name: "Sam".into(),
            },
            previous_status: None,
            new_status: None,
            metadata: serde_json::json!({}),
            integrity_hash: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ideas_list_oldest_first_and_filter_by_status() {
        let store = MemoryStore::new();
        let a = store.create_idea(&new_idea("a")).await.unwrap();
        let b = store.create_idea(&new_idea("b")).await.unwrap();
        store
            .set_idea_status(
                a,
                &IdeaStatusChange {
                    status: IdeaStatus::Approved,
                    approved_by: Some(9),
                    approved_at: Some(Utc::now()),
                },
            )
            .await
            .unwrap();

        let pending = store
            .list_ideas(&IdeaFilter::with_status(IdeaStatus::PendingApproval))
            .await
            .unwrap();
        assert_eq!(pending.iter().map(|i| i.id).collect::<Vec<_>>(), vec![b]);

        let all = store.list_ideas(&IdeaFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|i| i.id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[tokio::test]
    async fn missing_idea_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            store.get_idea(99).await,
            Err(StoreError::NotFound { entity: "Idea", id: 99 })
        );
    }

    #[tokio::test]
    async fn injected_write_failure_leaves_state_untouched() {
        let store = MemoryStore::new();
        let id = store.create_idea(&new_idea("a")).await.unwrap();
        store.set_fail_writes(true);
        let result = store
            .update_idea(
                id,
                &IdeaUpdate {
                    title: Some("changed".into()),
                    ..IdeaUpdate::default()
                },
            )
            .await;
        assert_matches!(result, Err(StoreError::Unavailable(_)));
        assert_eq!(store.get_idea(id).await.unwrap().title, "a");
    }

    #[tokio::test]
    async fn create_discussion_is_idempotent_per_owner() {
        let store = MemoryStore::new();
        let input = CreateDiscussion {
            owner: DiscussionOwner::Task(7),
            idea_id: 42,
            context: None,
            participants: vec![],
        };
        let first = store.create_discussion(&input).await.unwrap();
        let second = store.create_discussion(&input).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn append_message_tracks_participants() {
        let store = MemoryStore::new();
        let id = store
            .create_discussion(&CreateDiscussion {
                owner: DiscussionOwner::Idea(1),
                idea_id: 1,
                context: None,
                participants: vec![1],
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for author in [2, 2, 1] {
            let message = store
                .append_message(&CreateMessage {
                    discussion_id: id,
                    author_id: author,
                    author_name: "x".into(),
                    body: "hi".into(),
                    is_question: false,
                    attachments: vec![],
                })
                .await
                .unwrap();
            assert_eq!(message.author_id, author);
            ids.push(message.id);
        }
        assert_eq!(ids, vec![1, 2, 3]);
        let discussion = store.get_discussion(id).await.unwrap();
        assert_eq!(discussion.participants, vec![1, 2]);
        assert_eq!(store.list_messages(id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn trail_streams_most_recent_first_with_limit() {
        let store = MemoryStore::new();
        for t in ["submitted", "approved", "task_created"] {
            store.append_event(&event(1, t)).await.unwrap();
        }
        store.append_event(&event(2, "submitted")).await.unwrap();

        let events: Vec<TrailEvent> = store
            .stream_events(TrailQuery {
                idea_id: Some(1),
                limit: 2,
            })
            .try_collect()
            .await
            .unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["task_created", "approved"]);
    }

    #[tokio::test]
    async fn trail_append_failure_is_reported() {
        let store = MemoryStore::new();
        store.set_fail_trail_appends(true);
        assert!(store.append_event(&event(1, "submitted")).await.is_err());
        assert_eq!(store.trail_len().await, 0);
    }
}
