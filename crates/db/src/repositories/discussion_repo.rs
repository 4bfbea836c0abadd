//! Repository for the `discussions` and `discussion_messages` tables.

use ideaflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::discussion::{CreateDiscussion, CreateMessage, Discussion, DiscussionMessage};

/// Column list for `discussions` SELECT queries.
const COLUMNS: &str = "\
    id, owner_type, owner_id, idea_id, context, locked, participants, \
    last_activity_at, created_at";

/// Column list for `discussion_messages` SELECT queries.
const MESSAGE_COLUMNS: &str = "\
    id, discussion_id, author_id, author_name, body, is_question, attachments, created_at";

/// Provides thread, lock and message operations for discussions.
pub struct DiscussionRepo;

impl DiscussionRepo {
    /// Insert a thread unless the owner already has one.
    ///
    /// Uses `INSERT ... ON CONFLICT DO NOTHING` against the unique owner
    /// index; on conflict the existing thread id is returned instead.
    pub async fn create(pool: &PgPool, input: &CreateDiscussion) -> Result<DbId, sqlx::Error> {
        let inserted = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO discussions (owner_type, owner_id, idea_id, context, participants) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (owner_type, owner_id) DO NOTHING \
             RETURNING id",
        )
        .bind(input.owner.entity_type())
        .bind(input.owner.entity_id())
        .bind(input.idea_id)
        .bind(&input.context)
        .bind(&input.participants)
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(id) => Ok(id),
            None => {
                sqlx::query_scalar::<_, DbId>(
                    "SELECT id FROM discussions WHERE owner_type = $1 AND owner_id = $2",
                )
                .bind(input.owner.entity_type())
                .bind(input.owner.entity_id())
                .fetch_one(pool)
                .await
            }
        }
    }

    /// Find a thread by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Discussion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM discussions WHERE id = $1");
        sqlx::query_as::<_, Discussion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the thread of an owner entity.
    pub async fn find_by_owner(
        pool: &PgPool,
        owner_type: &str,
        owner_id: DbId,
    ) -> Result<Option<Discussion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM discussions WHERE owner_type = $1 AND owner_id = $2"
        );
        sqlx::query_as::<_, Discussion>(&query)
            .bind(owner_type)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Flip the lock flag. Returns `false` if the thread does not exist.
    pub async fn set_locked(pool: &PgPool, id: DbId, locked: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE discussions SET locked = $2 WHERE id = $1")
            .bind(id)
            .bind(locked)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List messages of a thread, oldest first.
    pub async fn list_messages(
        pool: &PgPool,
        discussion_id: DbId,
    ) -> Result<Vec<DiscussionMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM discussion_messages \
             WHERE discussion_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, DiscussionMessage>(&query)
            .bind(discussion_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a message and touch the thread in one transaction. Returns the
    /// stored row.
    pub async fn append_message(
        pool: &PgPool,
        input: &CreateMessage,
    ) -> Result<DiscussionMessage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO discussion_messages \
                (discussion_id, author_id, author_name, body, is_question, attachments) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let message = sqlx::query_as::<_, DiscussionMessage>(&query)
            .bind(input.discussion_id)
            .bind(input.author_id)
            .bind(&input.author_name)
            .bind(&input.body)
            .bind(input.is_question)
            .bind(sqlx::types::Json(&input.attachments))
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE discussions SET last_activity_at = NOW(), \
                participants = CASE WHEN $2 = ANY(participants) THEN participants \
                                    ELSE array_append(participants, $2) END \
             WHERE id = $1",
        )
        .bind(input.discussion_id)
        .bind(input.author_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(message)
    }
}
