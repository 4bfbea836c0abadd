//! Discussion owners and message validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of a single message body, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// The entity a discussion thread belongs to. At most one thread per owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DiscussionOwner {
    Idea(DbId),
    Task(DbId),
}

impl DiscussionOwner {
    pub fn entity_type(self) -> &'static str {
        match self {
            DiscussionOwner::Idea(_) => "idea",
            DiscussionOwner::Task(_) => "task",
        }
    }

    pub fn entity_id(self) -> DbId {
        match self {
            DiscussionOwner::Idea(id) | DiscussionOwner::Task(id) => id,
        }
    }

    /// Rebuild an owner from its stored `(owner_type, owner_id)` pair.
    pub fn from_parts(owner_type: &str, owner_id: DbId) -> Result<Self, CoreError> {
        match owner_type {
            "idea" => Ok(DiscussionOwner::Idea(owner_id)),
            "task" => Ok(DiscussionOwner::Task(owner_id)),
            other => Err(CoreError::Validation(format!(
                "Invalid discussion owner type '{other}'"
            ))),
        }
    }
}

/// Validate a message body: non-blank and within [`MAX_MESSAGE_LENGTH`].
pub fn validate_message_body(body: &str) -> Result<(), CoreError> {
    if body.trim().is_empty() {
        return Err(CoreError::Validation("Message body must not be empty".into()));
    }
    let len = body.chars().count();
    if len > MAX_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Message body is {len} characters, maximum is {MAX_MESSAGE_LENGTH}"
        )));
    }
    Ok(())
}
