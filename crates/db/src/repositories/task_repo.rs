//! Repository for the `tasks` table.

use ideaflow_core::status::TaskStatus;
use ideaflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task, TaskFilter, TaskUpdate};

/// Column list for `tasks` SELECT queries.
const COLUMNS: &str = "\
    id, idea_id, title, description, status_id, priority_id, percent_complete, \
    assigned_to, start_date, due_date, created_at, modified_at";

/// Provides CRUD operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task (`NotStarted`, 0%), returning its id.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO tasks (idea_id, title, description, status_id, priority_id, \
                percent_complete, assigned_to, start_date, due_date) \
             VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $8) \
             RETURNING id",
        )
        .bind(input.idea_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(TaskStatus::NotStarted.id())
        .bind(input.priority.id())
        .bind(&input.assigned_to)
        .bind(input.start_date)
        .bind(input.due_date)
        .fetch_one(pool)
        .await
    }

    /// Find a task by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tasks matching the filter, oldest first.
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE ($1::BIGINT IS NULL OR idea_id = $1) \
               AND ($2::BIGINT IS NULL OR $2 = ANY(assigned_to)) \
               AND ($3::SMALLINT IS NULL OR status_id = $3) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(filter.idea_id)
            .bind(filter.assignee)
            .bind(filter.status.map(|s| s.id()))
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Returns `false` if the task does not exist.
    pub async fn update(pool: &PgPool, id: DbId, update: &TaskUpdate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                status_id = COALESCE($4, status_id), \
                priority_id = COALESCE($5, priority_id), \
                percent_complete = COALESCE($6, percent_complete), \
                assigned_to = COALESCE($7, assigned_to), \
                start_date = COALESCE($8, start_date), \
                due_date = COALESCE($9, due_date), \
                modified_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.status.map(|s| s.id()))
        .bind(update.priority.map(|p| p.id()))
        .bind(update.percent_complete)
        .bind(&update.assigned_to)
        .bind(update.start_date)
        .bind(update.due_date)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
