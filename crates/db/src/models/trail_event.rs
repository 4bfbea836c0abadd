//! Trail event models and DTOs.
//!
//! Trail events are immutable once created: there is no update DTO and the
//! table rejects UPDATE and DELETE with a trigger.

use ideaflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The user recorded on a trail event.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ActorRef {
    #[sqlx(rename = "actor_id")]
    pub id: DbId,
    #[sqlx(rename = "actor_name")]
    pub name: String,
}

/// A row from the `trail_events` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TrailEvent {
    pub id: DbId,
    pub idea_id: DbId,
    pub task_id: Option<DbId>,
    pub discussion_id: Option<DbId>,
    pub event_type: String,
    pub title: String,
    pub description: String,
    #[sqlx(flatten)]
    pub actor: ActorRef,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub metadata: serde_json::Value,
    pub integrity_hash: Option<String>,
    pub timestamp: Timestamp,
}

/// Insert DTO for a trail event.
#[derive(Debug, Clone)]
pub struct CreateTrailEvent {
    pub idea_id: DbId,
    pub task_id: Option<DbId>,
    pub discussion_id: Option<DbId>,
    pub event_type: String,
    pub title: String,
    pub description: String,
    pub actor: ActorRef,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub metadata: serde_json::Value,
    pub integrity_hash: Option<String>,
    pub timestamp: Timestamp,
}

/// Parameters for a most-recent-first trail scan.
#[derive(Debug, Clone, Copy)]
pub struct TrailQuery {
    /// Restrict to one idea; `None` scans the global trail.
    pub idea_id: Option<DbId>,
    /// Upper bound on rows scanned.
    pub limit: i64,
}

/// Result of a trail integrity verification.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityCheckResult {
    /// Number of events verified.
    pub verified_entries: i64,
    /// Whether the entire chain is valid.
    pub chain_valid: bool,
    /// ID of the first event where the chain breaks, if any.
    pub first_break: Option<DbId>,
}
