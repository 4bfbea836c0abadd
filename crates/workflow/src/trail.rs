//! Audit Trail Logger.
//!
//! Appends run after the triggering mutation has committed. An append that
//! fails is logged, counted and dropped; it never reaches the caller and
//! never undoes the mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, SubsecRound, Utc};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use ideaflow_core::identity::Actor;
use ideaflow_core::trail::{
    compute_integrity_hash, default_title, redact_sensitive_fields, CanonicalEvent,
};
use ideaflow_core::types::{DbId, Timestamp};
use ideaflow_db::models::trail_event::{
    ActorRef, CreateTrailEvent, IntegrityCheckResult, TrailEvent, TrailQuery,
};
use ideaflow_db::{StoreResult, TrailStore};

use crate::error::WorkflowResult;

// ---------------------------------------------------------------------------
// TrailEntry
// ---------------------------------------------------------------------------

/// What happened, before the logger stamps actor, time and hash onto it.
#[derive(Debug, Clone)]
pub struct TrailEntry {
    pub idea_id: DbId,
    pub task_id: Option<DbId>,
    pub discussion_id: Option<DbId>,
    pub event_type: &'static str,
    pub title: Option<String>,
    pub description: String,
    pub previous_status: Option<String>,
    pub new_status: Option<String>,
    pub metadata: serde_json::Value,
}

impl TrailEntry {
    pub fn new(idea_id: DbId, event_type: &'static str) -> Self {
        Self {
            idea_id,
            task_id: None,
            discussion_id: None,
            event_type,
            title: None,
            description: String::new(),
            previous_status: None,
            new_status: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn task(mut self, task_id: DbId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn discussion(mut self, discussion_id: DbId) -> Self {
        self.discussion_id = Some(discussion_id);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn statuses(mut self, previous: impl ToString, new: impl ToString) -> Self {
        self.previous_status = Some(previous.to_string());
        self.new_status = Some(new.to_string());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

// ---------------------------------------------------------------------------
// AuditTrailLogger
// ---------------------------------------------------------------------------

pub struct AuditTrailLogger {
    store: Arc<dyn TrailStore>,
    /// Serializes read-last-hash + insert so the chain stays linear.
    chain: tokio::sync::Mutex<()>,
    scan_limit: i64,
    failures: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

impl AuditTrailLogger {
    pub fn new(store: Arc<dyn TrailStore>, scan_limit: i64) -> Self {
        Self {
            store,
            chain: tokio::sync::Mutex::new(()),
            scan_limit,
            failures: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    /// Append one event. Returns the new id, or `None` if the append failed.
    pub async fn append(&self, actor: &Actor, entry: TrailEntry) -> Option<DbId> {
        let idea_id = entry.idea_id;
        let event_type = entry.event_type;
        match self.try_append(actor, entry).await {
            Ok(id) => {
                tracing::debug!(trail_event_id = id, idea_id, event_type, "Trail event appended");
                Some(id)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                *self.last_failure.lock().unwrap_or_else(|p| p.into_inner()) = Some(e.to_string());
                tracing::error!(error = %e, idea_id, event_type, "Failed to append trail event");
                None
            }
        }
    }

    async fn try_append(&self, actor: &Actor, entry: TrailEntry) -> StoreResult<DbId> {
        let _chain = self.chain.lock().await;

        // Postgres keeps microseconds; hash what will be read back.
        let timestamp = Utc::now().trunc_subsecs(6);
        let prev_hash = self.store.last_integrity_hash().await?;
        let canonical = CanonicalEvent {
            idea_id: entry.idea_id,
            task_id: entry.task_id,
            discussion_id: entry.discussion_id,
            event_type: entry.event_type,
            actor_id: actor.id,
            previous_status: entry.previous_status.as_deref(),
            new_status: entry.new_status.as_deref(),
            timestamp_rfc3339: canonical_timestamp(timestamp),
        }
        .to_canonical_string();

        let event = CreateTrailEvent {
            idea_id: entry.idea_id,
            task_id: entry.task_id,
            discussion_id: entry.discussion_id,
            event_type: entry.event_type.to_string(),
            title: entry
                .title
                .unwrap_or_else(|| default_title(entry.event_type).to_string()),
            description: entry.description,
            actor: ActorRef {
                id: actor.id,
                name: actor.name.clone(),
            },
            previous_status: entry.previous_status,
            new_status: entry.new_status,
            metadata: redact_sensitive_fields(&entry.metadata),
            integrity_hash: Some(compute_integrity_hash(prev_hash.as_deref(), &canonical)),
            timestamp,
        };
        self.store.append_event(&event).await
    }

    /// Lazy most-recent-first scan, optionally for one idea, capped at the
    /// configured scan limit.
    pub fn query(&self, idea_id: Option<DbId>) -> BoxStream<'_, StoreResult<TrailEvent>> {
        self.store.stream_events(TrailQuery {
            idea_id,
            limit: self.scan_limit,
        })
    }

    /// Collect up to `take` events from [`query`](Self::query).
    pub async fn recent(&self, idea_id: Option<DbId>, take: usize) -> WorkflowResult<Vec<TrailEvent>> {
        let events: Vec<TrailEvent> = self.query(idea_id).take(take).try_collect().await?;
        Ok(events)
    }

    /// Walk the chain in append order and recompute every hash.
    ///
    /// Events without a hash are counted but not checked.
    pub async fn verify_integrity(&self) -> WorkflowResult<IntegrityCheckResult> {
        let mut events = self.store.stream_chain();
        let mut verified: i64 = 0;
        let mut prev_hash: Option<String> = None;
        let mut first_break: Option<DbId> = None;

        while let Some(event) = events.try_next().await? {
            let expected = compute_integrity_hash(prev_hash.as_deref(), &canonical_of(&event));
            if let Some(stored) = &event.integrity_hash {
                if *stored != expected {
                    first_break = Some(event.id);
                    break;
                }
            }
            verified += 1;
            prev_hash = event.integrity_hash.clone();
        }

        if let Some(id) = first_break {
            tracing::warn!(trail_event_id = id, verified, "Trail integrity chain broken");
        }

        Ok(IntegrityCheckResult {
            verified_entries: verified,
            chain_valid: first_break.is_none(),
            first_break,
        })
    }

    /// Appends that failed since startup.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn last_failure(&self) -> Option<String> {
        self.last_failure
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

fn canonical_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn canonical_of(event: &TrailEvent) -> String {
    CanonicalEvent {
        idea_id: event.idea_id,
        task_id: event.task_id,
        discussion_id: event.discussion_id,
        event_type: &event.event_type,
        actor_id: event.actor.id,
        previous_status: event.previous_status.as_deref(),
        new_status: event.new_status.as_deref(),
        timestamp_rfc3339: canonical_timestamp(event.timestamp),
    }
    .to_canonical_string()
}
