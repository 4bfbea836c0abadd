//! Repository for the `ideas` table.

use ideaflow_core::status::IdeaStatus;
use ideaflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::attachment::Attachment;
use crate::models::idea::{CreateIdea, Idea, IdeaFilter, IdeaStatusChange, IdeaUpdate};

/// Column list for `ideas` SELECT queries.
const COLUMNS: &str = "\
    id, title, description, category, priority_id, status_id, created_by, \
    created_at, modified_at, approved_by, approved_at, attachments";

/// Provides CRUD operations for ideas.
pub struct IdeaRepo;

impl IdeaRepo {
    /// Insert a new idea in `PendingApproval`, returning its id.
    pub async fn create(pool: &PgPool, input: &CreateIdea) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO ideas (title, description, category, priority_id, status_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.priority.id())
        .bind(IdeaStatus::PendingApproval.id())
        .bind(input.created_by)
        .fetch_one(pool)
        .await
    }

    /// Find an idea by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Idea>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ideas WHERE id = $1");
        sqlx::query_as::<_, Idea>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List ideas matching the filter, oldest first.
    pub async fn list(pool: &PgPool, filter: &IdeaFilter) -> Result<Vec<Idea>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ideas \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
               AND ($2::BIGINT IS NULL OR created_by = $2) \
               AND ($3::TEXT IS NULL OR category = $3) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Idea>(&query)
            .bind(filter.status.map(|s| s.id()))
            .bind(filter.created_by)
            .bind(&filter.category)
            .fetch_all(pool)
            .await
    }

    /// Patch content fields. Returns `false` if the idea does not exist.
    pub async fn update(pool: &PgPool, id: DbId, update: &IdeaUpdate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ideas SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                priority_id = COALESCE($5, priority_id), \
                modified_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.category)
        .bind(update.priority.map(|p| p.id()))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Write status and review columns together.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        change: &IdeaStatusChange,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ideas SET status_id = $2, approved_by = $3, approved_at = $4, \
                modified_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(change.status.id())
        .bind(change.approved_by)
        .bind(change.approved_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append an attachment reference to the idea's JSONB list.
    pub async fn add_attachment(
        pool: &PgPool,
        id: DbId,
        attachment: &Attachment,
    ) -> Result<bool, sqlx::Error> {
        let value = serde_json::json!([attachment]);
        let result = sqlx::query(
            "UPDATE ideas SET attachments = attachments || $2::JSONB, modified_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
