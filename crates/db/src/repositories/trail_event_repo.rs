//! Repository for the append-only `trail_events` table.

use futures::stream::BoxStream;
use ideaflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::trail_event::{CreateTrailEvent, TrailEvent};

/// Most-recent-first scan, optionally restricted to one idea.
///
/// Kept as a literal so the returned row stream can borrow it for `'static`.
const SCAN_QUERY: &str = "\
    SELECT id, idea_id, task_id, discussion_id, event_type, title, description, \
           actor_id, actor_name, previous_status, new_status, metadata, \
           integrity_hash, timestamp \
    FROM trail_events \
    WHERE ($1::BIGINT IS NULL OR idea_id = $1) \
    ORDER BY timestamp DESC, id DESC \
    LIMIT $2";

/// Whole trail in append order, for integrity verification.
const CHAIN_QUERY: &str = "\
    SELECT id, idea_id, task_id, discussion_id, event_type, title, description, \
           actor_id, actor_name, previous_status, new_status, metadata, \
           integrity_hash, timestamp \
    FROM trail_events \
    ORDER BY id ASC";

/// Provides insert and scan operations for trail events. There is no
/// update or delete; the table trigger rejects both.
pub struct TrailEventRepo;

impl TrailEventRepo {
    /// Insert a single event, returning its id.
    pub async fn insert(pool: &PgPool, event: &CreateTrailEvent) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO trail_events \
                (idea_id, task_id, discussion_id, event_type, title, description, \
                 actor_id, actor_name, previous_status, new_status, metadata, \
                 integrity_hash, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING id",
        )
        .bind(event.idea_id)
        .bind(event.task_id)
        .bind(event.discussion_id)
        .bind(&event.event_type)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.actor.id)
        .bind(&event.actor.name)
        .bind(&event.previous_status)
        .bind(&event.new_status)
        .bind(&event.metadata)
        .bind(&event.integrity_hash)
        .bind(event.timestamp)
        .fetch_one(pool)
        .await
    }

    /// Find the integrity hash of the most recent event.
    pub async fn find_last_hash(pool: &PgPool) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT integrity_hash FROM trail_events ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await
        .map(|opt| opt.flatten())
    }

    /// Stream events most-recent-first without buffering the result set.
    pub fn scan(
        pool: &PgPool,
        idea_id: Option<DbId>,
        limit: i64,
    ) -> BoxStream<'_, Result<TrailEvent, sqlx::Error>> {
        sqlx::query_as::<_, TrailEvent>(SCAN_QUERY)
            .bind(idea_id)
            .bind(limit)
            .fetch(pool)
    }

    /// Stream the whole trail in append order.
    pub fn scan_chain(pool: &PgPool) -> BoxStream<'_, Result<TrailEvent, sqlx::Error>> {
        sqlx::query_as::<_, TrailEvent>(CHAIN_QUERY).fetch(pool)
    }
}
