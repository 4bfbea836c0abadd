use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Invalid {entity} transition from {from} to {to}: {reason}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
        reason: String,
    },

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Discussion {discussion_id} is locked")]
    DiscussionLocked { discussion_id: DbId },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
