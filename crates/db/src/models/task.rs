//! Task entity model and DTOs.

use ideaflow_core::status::{Priority, TaskStatus};
use ideaflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `tasks` table. Every task belongs to exactly one idea.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: DbId,
    pub idea_id: DbId,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: TaskStatus,
    #[sqlx(rename = "priority_id", try_from = "i16")]
    pub priority: Priority,
    pub percent_complete: i16,
    pub assigned_to: Vec<DbId>,
    pub start_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl Task {
    pub fn is_assigned_to(&self, user_id: DbId) -> bool {
        self.assigned_to.contains(&user_id)
    }
}

/// Request body for creating a task under an approved idea.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTask {
    pub idea_id: DbId,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000, message = "description is limited to 10000 characters"))]
    pub description: String,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assigned_to: Vec<DbId>,
    pub start_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
}

/// Insert DTO for the `tasks` table. New tasks start `NotStarted` at 0%.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub idea_id: DbId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assigned_to: Vec<DbId>,
    pub start_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
}

impl From<NewTask> for CreateTask {
    fn from(input: NewTask) -> Self {
        Self {
            idea_id: input.idea_id,
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or_default(),
            assigned_to: input.assigned_to,
            start_date: input.start_date,
            due_date: input.due_date,
        }
    }
}

/// Partial update for a task. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 10000, message = "description is limited to 10000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub percent_complete: Option<i16>,
    pub assigned_to: Option<Vec<DbId>>,
    pub start_date: Option<Timestamp>,
    pub due_date: Option<Timestamp>,
}

impl TaskUpdate {
    /// Names of the fields this update touches.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.percent_complete.is_some() {
            fields.push("percent_complete");
        }
        if self.assigned_to.is_some() {
            fields.push("assigned_to");
        }
        if self.start_date.is_some() {
            fields.push("start_date");
        }
        if self.due_date.is_some() {
            fields.push("due_date");
        }
        fields
    }

    /// Apply the patch to an in-memory task (used by the memory store).
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(pct) = self.percent_complete {
            task.percent_complete = pct;
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        if self.start_date.is_some() {
            task.start_date = self.start_date;
        }
        if self.due_date.is_some() {
            task.due_date = self.due_date;
        }
    }
}

/// Filter for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub idea_id: Option<DbId>,
    pub assignee: Option<DbId>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn for_idea(idea_id: DbId) -> Self {
        Self {
            idea_id: Some(idea_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.idea_id.map_or(true, |id| id == task.idea_id)
            && self.assignee.map_or(true, |u| task.is_assigned_to(u))
            && self.status.map_or(true, |s| s == task.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_fields_lists_only_present_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            percent_complete: Some(100),
            ..TaskUpdate::default()
        };
        assert_eq!(update.changed_fields(), vec!["status", "percent_complete"]);
        assert!(TaskUpdate::default().changed_fields().is_empty());
    }

    #[test]
    fn new_task_defaults_priority() {
        let input = NewTask {
            idea_id: 42,
            title: "Draft checklist".into(),
            description: String::new(),
            priority: None,
            assigned_to: vec![3],
            start_date: None,
            due_date: None,
        };
        let create = CreateTask::from(input);
        assert_eq!(create.priority, Priority::Medium);
        assert_eq!(create.assigned_to, vec![3]);
    }
}
