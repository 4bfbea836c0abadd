//! Undo Cache: the single retained approve/reject compensation.
//!
//! The slot is persisted under [`UNDO_STORAGE_KEY`] so it survives a
//! restart. A persisted record is read once when the cache is loaded and
//! dropped if it is already outside the window at that moment.

use std::sync::Arc;

use chrono::{Duration, Utc};
use ideaflow_core::status::IdeaStatus;
use ideaflow_core::types::{DbId, Timestamp};
use ideaflow_core::undo::{is_within_window, ApprovalAction, UNDO_STORAGE_KEY};
use ideaflow_db::kv::KeyValueStore;
use ideaflow_db::models::idea::Idea;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Compensation for the most recent approve/reject.
///
/// Persisted as `{ideaId, action, originalStatus, ideaTitle, timestamp}`;
/// the full pre-action snapshot only lives in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRecord {
    pub idea_id: DbId,
    pub action: ApprovalAction,
    pub original_status: IdeaStatus,
    pub idea_title: String,
    pub timestamp: Timestamp,
    #[serde(skip)]
    pub snapshot: Option<Idea>,
}

impl UndoRecord {
    /// Capture `idea` as it is before `action` touches it.
    pub fn snapshot(idea: &Idea, action: ApprovalAction, at: Timestamp) -> Self {
        Self {
            idea_id: idea.id,
            action,
            original_status: idea.status,
            idea_title: idea.title.clone(),
            timestamp: at,
            snapshot: Some(idea.clone()),
        }
    }

    pub fn is_live(&self, now: Timestamp, window_secs: i64) -> bool {
        is_within_window(self.timestamp, now, window_secs)
    }

    pub fn expires_at(&self, window_secs: i64) -> Timestamp {
        self.timestamp + Duration::seconds(window_secs)
    }
}

pub struct UndoCache {
    kv: Arc<dyn KeyValueStore>,
    slot: Mutex<Option<UndoRecord>>,
    window_secs: i64,
}

impl UndoCache {
    pub fn empty(kv: Arc<dyn KeyValueStore>, window_secs: i64) -> Self {
        Self {
            kv,
            slot: Mutex::new(None),
            window_secs,
        }
    }

    /// Restore the persisted slot, discarding it if expired or unreadable.
    pub async fn load(kv: Arc<dyn KeyValueStore>, window_secs: i64) -> Self {
        Self::load_at(kv, window_secs, Utc::now()).await
    }

    /// [`load`](Self::load) with an explicit clock reading.
    pub async fn load_at(kv: Arc<dyn KeyValueStore>, window_secs: i64, now: Timestamp) -> Self {
        let cache = Self::empty(kv, window_secs);
        let raw = match cache.kv.get(UNDO_STORAGE_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted undo record");
                return cache;
            }
        };
        let Some(raw) = raw else {
            return cache;
        };

        match serde_json::from_str::<UndoRecord>(&raw) {
            Ok(record) if record.is_live(now, window_secs) => {
                tracing::info!(idea_id = record.idea_id, action = record.action.as_str(), "Undo record restored");
                *cache.slot.lock().await = Some(record);
            }
            Ok(record) => {
                tracing::info!(idea_id = record.idea_id, "Persisted undo record expired, discarding");
                cache.forget().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted undo record is unreadable, discarding");
                cache.forget().await;
            }
        }
        cache
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Replace whatever the slot holds.
    pub async fn store(&self, record: UndoRecord) {
        let mut slot = self.slot.lock().await;
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = self.kv.put(UNDO_STORAGE_KEY, &json).await {
                    tracing::warn!(error = %e, "Failed to persist undo record");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize undo record"),
        }
        *slot = Some(record);
    }

    /// Empty the slot and return what it held.
    pub async fn take(&self) -> Option<UndoRecord> {
        let mut slot = self.slot.lock().await;
        let record = slot.take();
        self.forget().await;
        record
    }

    pub async fn peek(&self) -> Option<UndoRecord> {
        self.slot.lock().await.clone()
    }

    async fn forget(&self) {
        if let Err(e) = self.kv.remove(UNDO_STORAGE_KEY).await {
            tracing::warn!(error = %e, "Failed to clear persisted undo record");
        }
    }
}

#[cfg(test)]
mod tests {
    use ideaflow_core::status::Priority;
    use ideaflow_core::undo::UNDO_WINDOW_SECS;
    use ideaflow_db::kv::MemoryKeyValueStore;

    use super::*;

    fn idea() -> Idea {
        let now = Utc::now();
        Idea {
            id: 42,
            title: "Reduce onboarding time".into(),
            description: String::new(),
            category: "process".into(),
            priority: Priority::High,
            status: IdeaStatus::PendingApproval,
            created_by: 5,
            created_at: now,
            modified_at: now,
            approved_by: None,
            approved_at: None,
            attachments: vec![],
        }
    }

    #[test]
    fn persisted_shape_omits_snapshot() {
        let record = UndoRecord::snapshot(&idea(), ApprovalAction::Approve, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ideaId"], 42);
        assert_eq!(json["action"], "approve");
        assert_eq!(json["originalStatus"], "pending_approval");
        assert_eq!(json["ideaTitle"], "Reduce onboarding time");
        assert!(json.get("snapshot").is_none());
    }

    #[tokio::test]
    async fn store_persists_and_take_clears() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let cache = UndoCache::empty(kv.clone(), UNDO_WINDOW_SECS);

        cache
            .store(UndoRecord::snapshot(&idea(), ApprovalAction::Reject, Utc::now()))
            .await;
        assert!(kv.get(UNDO_STORAGE_KEY).await.unwrap().is_some());

        let taken = cache.take().await.unwrap();
        assert_eq!(taken.action, ApprovalAction::Reject);
        assert!(cache.peek().await.is_none());
        assert!(kv.get(UNDO_STORAGE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn new_record_overwrites_previous() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let cache = UndoCache::empty(kv, UNDO_WINDOW_SECS);
        let mut other = idea();
        other.id = 43;

        cache
            .store(UndoRecord::snapshot(&idea(), ApprovalAction::Approve, Utc::now()))
            .await;
        cache
            .store(UndoRecord::snapshot(&other, ApprovalAction::Approve, Utc::now()))
            .await;
        assert_eq!(cache.peek().await.unwrap().idea_id, 43);
    }

    #[tokio::test]
    async fn load_keeps_record_inside_window() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let t = Utc::now();
        UndoCache::empty(kv.clone(), UNDO_WINDOW_SECS)
            .store(UndoRecord::snapshot(&idea(), ApprovalAction::Approve, t))
            .await;

        let cache = UndoCache::load_at(kv, UNDO_WINDOW_SECS, t + Duration::seconds(299)).await;
        let record = cache.peek().await.unwrap();
        assert_eq!(record.idea_id, 42);
        assert!(record.snapshot.is_none());
    }

    #[tokio::test]
    async fn load_discards_expired_record() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let t = Utc::now();
        UndoCache::empty(kv.clone(), UNDO_WINDOW_SECS)
            .store(UndoRecord::snapshot(&idea(), ApprovalAction::Approve, t))
            .await;

        let cache = UndoCache::load_at(kv.clone(), UNDO_WINDOW_SECS, t + Duration::seconds(301)).await;
        assert!(cache.peek().await.is_none());
        assert!(kv.get(UNDO_STORAGE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_discards_garbage() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.put(UNDO_STORAGE_KEY, "not json").await.unwrap();
        let cache = UndoCache::load(kv.clone(), UNDO_WINDOW_SECS).await;
        assert!(cache.peek().await.is_none());
        assert!(kv.get(UNDO_STORAGE_KEY).await.unwrap().is_none());
    }
}
