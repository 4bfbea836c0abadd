//! Shared fixtures for workflow integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ideaflow_core::identity::Actor;
use ideaflow_core::roles::{ROLE_ADMIN, ROLE_APPROVER, ROLE_CONTRIBUTOR};
use ideaflow_core::status::{IdeaStatus, Priority};
use ideaflow_core::types::DbId;
use ideaflow_db::kv::{KeyValueStore, MemoryKeyValueStore};
use ideaflow_db::models::idea::{Idea, NewIdea};
use ideaflow_db::models::task::NewTask;
use ideaflow_db::models::trail_event::TrailEvent;
use ideaflow_db::MemoryStore;
use ideaflow_events::{BroadcastNotifier, EventBus, Notification};
use ideaflow_workflow::{
    ActionNotifier, ApprovalCoordinator, AuditTrailLogger, UndoCache, WorkflowConfig,
    WorkflowEngine,
};

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

pub fn admin() -> Actor {
    Actor::new(1, "Alex Admin", "alex@example.com", ROLE_ADMIN)
}

pub fn approver() -> Actor {
    Actor::new(2, "Sam Reviewer", "sam@example.com", ROLE_APPROVER)
}

pub fn contributor() -> Actor {
    Actor::new(3, "Casey Contributor", "casey@example.com", ROLE_CONTRIBUTOR)
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub kv: Arc<MemoryKeyValueStore>,
    pub bus: Arc<EventBus>,
    pub notifier: Arc<BroadcastNotifier>,
    pub trail: Arc<AuditTrailLogger>,
    pub engine: Arc<WorkflowEngine>,
    pub coordinator: ApprovalCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), WorkflowConfig::default())
    }

    /// Every store call sleeps for `latency`, so concurrent calls overlap.
    pub fn with_latency(latency: Duration) -> Self {
        Self::with_store(MemoryStore::new().with_latency(latency), WorkflowConfig::default())
    }

    pub fn with_store(store: MemoryStore, config: WorkflowConfig) -> Self {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let undo = UndoCache::empty(kv.clone(), config.undo_window_secs);
        Self::assemble(Arc::new(store), kv, undo, config)
    }

    pub fn assemble(
        store: Arc<MemoryStore>,
        kv: Arc<MemoryKeyValueStore>,
        undo: UndoCache,
        config: WorkflowConfig,
    ) -> Self {
        let bus = Arc::new(EventBus::default());
        let notifier = Arc::new(BroadcastNotifier::default());
        let trail = Arc::new(AuditTrailLogger::new(store.clone(), config.trail_scan_limit));
        let engine = Arc::new(WorkflowEngine::new(
            store.clone(),
            Arc::clone(&trail),
            Arc::clone(&bus),
            ActionNotifier::new(notifier.clone(), &config),
        ));
        let coordinator =
            ApprovalCoordinator::new(Arc::clone(&engine), undo, notifier.clone(), config);
        Self {
            store,
            kv,
            bus,
            notifier,
            trail,
            engine,
            coordinator,
        }
    }

    pub async fn submit(&self, title: &str) -> Idea {
        self.engine
            .submit_idea(
                &contributor(),
                NewIdea {
                    title: title.to_string(),
                    description: "details".to_string(),
                    category: "process".to_string(),
                    priority: Some(Priority::High),
                },
            )
            .await
            .expect("submit idea")
    }

    /// Submit and approve through the coordinator.
    pub async fn approved(&self, title: &str) -> Idea {
        let idea = self.submit(title).await;
        self.coordinator
            .handle_approval_action(&idea, ideaflow_core::undo::ApprovalAction::Approve, &approver())
            .await
            .expect("approve idea")
    }

    pub async fn task_for(&self, idea_id: DbId, title: &str, assignees: Vec<DbId>) -> DbId {
        self.engine
            .create_task(
                &admin(),
                NewTask {
                    idea_id,
                    title: title.to_string(),
                    description: String::new(),
                    priority: None,
                    assigned_to: assignees,
                    start_date: None,
                    due_date: None,
                },
            )
            .await
            .expect("create task")
            .id
    }

    pub async fn trail_for(&self, idea_id: DbId) -> Vec<TrailEvent> {
        self.trail.recent(Some(idea_id), 100).await.expect("trail query")
    }

    pub async fn status_of(&self, idea_id: DbId) -> IdeaStatus {
        self.engine.get_idea(idea_id).await.expect("idea").status
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.recent()
    }
}

/// A pending idea with a fixed id, for fixtures that name their ids.
pub fn pending_idea(id: DbId, title: &str) -> Idea {
    let now = Utc::now();
    Idea {
        id,
        title: title.to_string(),
        description: String::new(),
        category: "process".to_string(),
        priority: Priority::High,
        status: IdeaStatus::PendingApproval,
        created_by: contributor().id,
        created_at: now,
        modified_at: now,
        approved_by: None,
        approved_at: None,
        attachments: vec![],
    }
}

pub async fn kv_value(kv: &MemoryKeyValueStore, key: &str) -> Option<String> {
    kv.get(key).await.expect("kv read")
}
