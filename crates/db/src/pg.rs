//! Postgres-backed [`EntityStore`] and [`TrailStore`].

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::types::DbId;

use crate::attachments::LocalAttachmentStorage;
use crate::models::attachment::{Attachment, FileUpload};
use crate::models::discussion::{CreateDiscussion, CreateMessage, Discussion, DiscussionMessage};
use crate::models::idea::{CreateIdea, Idea, IdeaFilter, IdeaStatusChange, IdeaUpdate};
use crate::models::task::{CreateTask, Task, TaskFilter, TaskUpdate};
use crate::models::trail_event::{CreateTrailEvent, TrailEvent, TrailQuery};
use crate::repositories::{DiscussionRepo, IdeaRepo, TaskRepo, TrailEventRepo};
use crate::store::{require, EntityStore, StoreError, StoreResult, TrailStore};
use crate::DbPool;

/// Store adapter over a Postgres pool and local attachment storage.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    attachments: LocalAttachmentStorage,
}

impl PgStore {
    pub fn new(pool: DbPool, attachments: LocalAttachmentStorage) -> Self {
        Self { pool, attachments }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn found(entity: &'static str, id: DbId, updated: bool) -> StoreResult<()> {
    if updated {
        Ok(())
    } else {
        Err(StoreError::NotFound { entity, id })
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn list_ideas(&self, filter: &IdeaFilter) -> StoreResult<Vec<Idea>> {
        Ok(IdeaRepo::list(&self.pool, filter).await?)
    }

    async fn get_idea(&self, id: DbId) -> StoreResult<Idea> {
        require("Idea", id, IdeaRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_idea(&self, input: &CreateIdea) -> StoreResult<DbId> {
        Ok(IdeaRepo::create(&self.pool, input).await?)
    }

    async fn update_idea(&self, id: DbId, update: &IdeaUpdate) -> StoreResult<()> {
        found("Idea", id, IdeaRepo::update(&self.pool, id, update).await?)
    }

    async fn set_idea_status(&self, id: DbId, change: &IdeaStatusChange) -> StoreResult<()> {
        found("Idea", id, IdeaRepo::set_status(&self.pool, id, change).await?)
    }

    async fn add_idea_attachment(&self, id: DbId, attachment: &Attachment) -> StoreResult<()> {
        found(
            "Idea",
            id,
            IdeaRepo::add_attachment(&self.pool, id, attachment).await?,
        )
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(TaskRepo::list(&self.pool, filter).await?)
    }

    async fn get_task(&self, id: DbId) -> StoreResult<Task> {
        require("Task", id, TaskRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_task(&self, input: &CreateTask) -> StoreResult<DbId> {
        Ok(TaskRepo::create(&self.pool, input).await?)
    }

    async fn update_task(&self, id: DbId, update: &TaskUpdate) -> StoreResult<()> {
        found("Task", id, TaskRepo::update(&self.pool, id, update).await?)
    }

    async fn find_discussion(&self, owner: DiscussionOwner) -> StoreResult<Option<Discussion>> {
        Ok(
            DiscussionRepo::find_by_owner(&self.pool, owner.entity_type(), owner.entity_id())
                .await?,
        )
    }

    async fn get_discussion(&self, id: DbId) -> StoreResult<Discussion> {
        require(
            "Discussion",
            id,
            DiscussionRepo::find_by_id(&self.pool, id).await?,
        )
    }

    async fn create_discussion(&self, input: &CreateDiscussion) -> StoreResult<DbId> {
        Ok(DiscussionRepo::create(&self.pool, input).await?)
    }

    async fn set_discussion_locked(&self, id: DbId, locked: bool) -> StoreResult<()> {
        found(
            "Discussion",
            id,
            DiscussionRepo::set_locked(&self.pool, id, locked).await?,
        )
    }

    async fn list_messages(&self, discussion_id: DbId) -> StoreResult<Vec<DiscussionMessage>> {
        Ok(DiscussionRepo::list_messages(&self.pool, discussion_id).await?)
    }

    async fn append_message(&self, input: &CreateMessage) -> StoreResult<DiscussionMessage> {
        Ok(DiscussionRepo::append_message(&self.pool, input).await?)
    }

    async fn upload_attachment(
        &self,
        entity_id: DbId,
        file: FileUpload,
    ) -> StoreResult<Attachment> {
        self.attachments.save(entity_id, file).await
    }
}

#[async_trait]
impl TrailStore for PgStore {
    async fn append_event(&self, event: &CreateTrailEvent) -> StoreResult<DbId> {
        Ok(TrailEventRepo::insert(&self.pool, event).await?)
    }

    async fn last_integrity_hash(&self) -> StoreResult<Option<String>> {
        Ok(TrailEventRepo::find_last_hash(&self.pool).await?)
    }

    fn stream_events(&self, query: TrailQuery) -> BoxStream<'_, StoreResult<TrailEvent>> {
        TrailEventRepo::scan(&self.pool, query.idea_id, query.limit)
            .map_err(StoreError::from)
            .boxed()
    }

    fn stream_chain(&self) -> BoxStream<'_, StoreResult<TrailEvent>> {
        TrailEventRepo::scan_chain(&self.pool)
            .map_err(StoreError::from)
            .boxed()
    }
}
