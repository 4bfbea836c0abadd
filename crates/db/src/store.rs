//! Entity Store Adapter traits.
//!
//! [`EntityStore`] is the CRUD + filtered-list surface over ideas, tasks and
//! discussions; [`TrailStore`] is the append-only surface over trail events.
//! Both are object safe so the workflow can hold `Arc<dyn ...>` and switch
//! between [`PgStore`](crate::pg::PgStore) and
//! [`MemoryStore`](crate::memory::MemoryStore).
//!
//! Updates carry no version token: concurrent writers get last-write-wins.

use async_trait::async_trait;
use futures::stream::BoxStream;
use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::types::DbId;

use crate::models::attachment::{Attachment, FileUpload};
use crate::models::discussion::{
    CreateDiscussion, CreateMessage, Discussion, DiscussionMessage,
};
use crate::models::idea::{CreateIdea, Idea, IdeaFilter, IdeaStatusChange, IdeaUpdate};
use crate::models::task::{CreateTask, Task, TaskFilter, TaskUpdate};
use crate::models::trail_event::{CreateTrailEvent, TrailEvent, TrailQuery};

/// Failure of an underlying store call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Map `Ok(None)` from a lookup to [`StoreError::NotFound`].
pub(crate) fn require<T>(entity: &'static str, id: DbId, found: Option<T>) -> StoreResult<T> {
    found.ok_or(StoreError::NotFound { entity, id })
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    // --- Ideas ---

    /// Ideas matching `filter`, oldest first.
    async fn list_ideas(&self, filter: &IdeaFilter) -> StoreResult<Vec<Idea>>;

    async fn get_idea(&self, id: DbId) -> StoreResult<Idea>;

    /// Insert an idea in `PendingApproval` and return its id.
    async fn create_idea(&self, input: &CreateIdea) -> StoreResult<DbId>;

    async fn update_idea(&self, id: DbId, update: &IdeaUpdate) -> StoreResult<()>;

    async fn set_idea_status(&self, id: DbId, change: &IdeaStatusChange) -> StoreResult<()>;

    async fn add_idea_attachment(&self, id: DbId, attachment: &Attachment) -> StoreResult<()>;

    // --- Tasks ---

    /// Tasks matching `filter`, oldest first.
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    async fn get_task(&self, id: DbId) -> StoreResult<Task>;

    async fn create_task(&self, input: &CreateTask) -> StoreResult<DbId>;

    async fn update_task(&self, id: DbId, update: &TaskUpdate) -> StoreResult<()>;

    // --- Discussions ---

    async fn find_discussion(&self, owner: DiscussionOwner) -> StoreResult<Option<Discussion>>;

    async fn get_discussion(&self, id: DbId) -> StoreResult<Discussion>;

    /// Return the id of the owner's thread, inserting it if none exists.
    async fn create_discussion(&self, input: &CreateDiscussion) -> StoreResult<DbId>;

    async fn set_discussion_locked(&self, id: DbId, locked: bool) -> StoreResult<()>;

    /// Messages of a thread, oldest first.
    async fn list_messages(&self, discussion_id: DbId) -> StoreResult<Vec<DiscussionMessage>>;

    /// Insert a message, bump `last_activity_at` and add the author to the
    /// participants. Returns the stored message.
    async fn append_message(&self, input: &CreateMessage) -> StoreResult<DiscussionMessage>;

    // --- Attachments ---

    async fn upload_attachment(&self, entity_id: DbId, file: FileUpload)
        -> StoreResult<Attachment>;
}

#[async_trait]
pub trait TrailStore: Send + Sync {
    /// Insert one event. No update or delete is exposed for trail events.
    async fn append_event(&self, event: &CreateTrailEvent) -> StoreResult<DbId>;

    /// Integrity hash of the most recently appended event.
    async fn last_integrity_hash(&self) -> StoreResult<Option<String>>;

    /// Lazily stream events most-recent-first, capped at `query.limit` rows.
    fn stream_events(&self, query: TrailQuery) -> BoxStream<'_, StoreResult<TrailEvent>>;

    /// Stream the whole trail in append order for chain verification.
    fn stream_chain(&self) -> BoxStream<'_, StoreResult<TrailEvent>>;
}
