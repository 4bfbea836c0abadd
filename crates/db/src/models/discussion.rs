//! Discussion thread and message models.

use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::error::CoreError;
use ideaflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::attachment::Attachment;

/// A row from the `discussions` table.
///
/// `idea_id` is denormalised from the owner so trail events can always be
/// attributed to an idea, even for task threads.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Discussion {
    pub id: DbId,
    pub owner_type: String,
    pub owner_id: DbId,
    pub idea_id: DbId,
    pub context: Option<String>,
    pub locked: bool,
    pub participants: Vec<DbId>,
    pub last_activity_at: Timestamp,
    pub created_at: Timestamp,
}

impl Discussion {
    pub fn owner(&self) -> Result<DiscussionOwner, CoreError> {
        DiscussionOwner::from_parts(&self.owner_type, self.owner_id)
    }

    /// Task id when the thread belongs to a task.
    pub fn task_id(&self) -> Option<DbId> {
        (self.owner_type == "task").then_some(self.owner_id)
    }
}

/// Insert DTO for the `discussions` table.
#[derive(Debug, Clone)]
pub struct CreateDiscussion {
    pub owner: DiscussionOwner,
    pub idea_id: DbId,
    pub context: Option<String>,
    pub participants: Vec<DbId>,
}

/// A row from the `discussion_messages` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DiscussionMessage {
    pub id: DbId,
    pub discussion_id: DbId,
    pub author_id: DbId,
    pub author_name: String,
    pub body: String,
    pub is_question: bool,
    #[sqlx(json)]
    pub attachments: Vec<Attachment>,
    pub created_at: Timestamp,
}

/// Request body for posting a message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub body: String,
    #[serde(default)]
    pub is_question: bool,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Insert DTO for the `discussion_messages` table.
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub discussion_id: DbId,
    pub author_id: DbId,
    pub author_name: String,
    pub body: String,
    pub is_question: bool,
    pub attachments: Vec<Attachment>,
}

/// A thread together with its messages, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionThread {
    #[serde(flatten)]
    pub discussion: Discussion,
    pub messages: Vec<DiscussionMessage>,
}
