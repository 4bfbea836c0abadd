//! Trail event constants and utility functions.
//!
//! Trail events are the append-only audit record of the idea workflow. This
//! module holds the event vocabulary, the integrity hash chain and metadata
//! redaction so the store adapter, the logger and the HTTP layer agree on them.

use crate::hashing;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Event type constants
// ---------------------------------------------------------------------------

/// Known trail event types.
pub mod event_types {
    pub const SUBMITTED: &str = "submitted";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
    pub const STATUS_CHANGED: &str = "status_changed";
    pub const IDEA_UPDATED: &str = "idea_updated";
    pub const ATTACHMENT_ADDED: &str = "attachment_added";
    pub const TASK_CREATED: &str = "task_created";
    pub const TASK_UPDATED: &str = "task_updated";
    pub const COMMENTED: &str = "commented";
    pub const DISCUSSION_LOCKED: &str = "discussion_locked";
    pub const DISCUSSION_UNLOCKED: &str = "discussion_unlocked";
}

/// Human-readable title for an event type, used when the caller has none.
pub fn default_title(event_type: &str) -> &'static str {
    match event_type {
        event_types::SUBMITTED => "Idea submitted",
        event_types::APPROVED => "Idea approved",
        event_types::REJECTED => "Idea rejected",
        event_types::STATUS_CHANGED => "Status changed",
        event_types::IDEA_UPDATED => "Idea updated",
        event_types::ATTACHMENT_ADDED => "Attachment added",
        event_types::TASK_CREATED => "Task created",
        event_types::TASK_UPDATED => "Task updated",
        event_types::COMMENTED => "Comment added",
        event_types::DISCUSSION_LOCKED => "Discussion locked",
        event_types::DISCUSSION_UNLOCKED => "Discussion unlocked",
        _ => "Workflow event",
    }
}

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "IDEA_TRAIL_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for a trail event.
///
/// `prev_hash` is the integrity hash of the previous event, or `None` for the
/// first event in the chain (which uses a known seed value).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Fields that make up the canonical hashed representation of an event.
///
/// Store-assigned ids are excluded so the hash can be computed before the
/// insert.
pub struct CanonicalEvent<'a> {
    pub idea_id: DbId,
    pub task_id: Option<DbId>,
    pub discussion_id: Option<DbId>,
    pub event_type: &'a str,
    pub actor_id: DbId,
    pub previous_status: Option<&'a str>,
    pub new_status: Option<&'a str>,
    pub timestamp_rfc3339: String,
}

impl CanonicalEvent<'_> {
    /// Pipe-separated canonical string fed to [`compute_integrity_hash`].
    pub fn to_canonical_string(&self) -> String {
        fn opt_id(v: Option<DbId>) -> String {
            v.map_or(String::new(), |id| id.to_string())
        }
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.timestamp_rfc3339,
            self.idea_id,
            opt_id(self.task_id),
            opt_id(self.discussion_id),
            self.event_type,
            self.actor_id,
            self.previous_status.unwrap_or(""),
            self.new_status.unwrap_or(""),
        )
    }
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Metadata keys that are redacted before a trail event is stored.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "private_key",
    "authorization",
    "credential",
];

/// Redact sensitive fields from a JSON value, recursing into objects and arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}
