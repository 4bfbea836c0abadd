//! Idea entity model and DTOs.

use ideaflow_core::status::{IdeaStatus, Priority};
use ideaflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::attachment::Attachment;

/// A row from the `ideas` table.
///
/// `approved_by` is set if and only if `status` is `Approved` or `Rejected`;
/// the table carries a CHECK constraint for it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Idea {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub category: String,
    #[sqlx(rename = "priority_id", try_from = "i16")]
    pub priority: Priority,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: IdeaStatus,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    #[sqlx(json)]
    pub attachments: Vec<Attachment>,
}

/// Request body for submitting a new idea.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewIdea {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 10000, message = "description is limited to 10000 characters"))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "category must be 1-100 characters"))]
    pub category: String,
    pub priority: Option<Priority>,
}

/// Insert DTO built by the workflow engine from a [`NewIdea`].
#[derive(Debug, Clone)]
pub struct CreateIdea {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub created_by: DbId,
}

impl CreateIdea {
    pub fn from_submission(input: NewIdea, created_by: DbId) -> Self {
        Self {
            title: input.title,
            description: input.description,
            category: input.category,
            priority: input.priority.unwrap_or_default(),
            created_by,
        }
    }
}

/// Content patch for an idea. Status is never changed through this DTO.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct IdeaUpdate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 10000, message = "description is limited to 10000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "category must be 1-100 characters"))]
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

impl IdeaUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
    }
}

/// Full status write applied by a workflow transition.
///
/// The review columns are always written together with the status so the
/// `approved_by` invariant holds after every transition, including undo.
#[derive(Debug, Clone)]
pub struct IdeaStatusChange {
    pub status: IdeaStatus,
    pub approved_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
}

/// Filter for listing ideas.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaFilter {
    pub status: Option<IdeaStatus>,
    pub created_by: Option<DbId>,
    pub category: Option<String>,
}

impl IdeaFilter {
    pub fn with_status(status: IdeaStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, idea: &Idea) -> bool {
        self.status.map_or(true, |s| s == idea.status)
            && self.created_by.map_or(true, |c| c == idea.created_by)
            && self
                .category
                .as_deref()
                .map_or(true, |c| c == idea.category)
    }
}
