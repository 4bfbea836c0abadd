use std::sync::Arc;

use ideaflow_db::kv::KeyValueStore;
use ideaflow_db::{DbPool, EntityStore, TrailStore};
use ideaflow_events::{BroadcastNotifier, EventBus};
use ideaflow_workflow::{
    ActionNotifier, ApprovalCoordinator, AuditTrailLogger, UndoCache, WorkflowEngine,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    /// Single reviewer session: one approve/reject/undo in flight at a time.
    pub coordinator: Arc<ApprovalCoordinator>,
    pub notifier: Arc<BroadcastNotifier>,
    pub event_bus: Arc<EventBus>,
    pub config: Arc<ServerConfig>,
    /// Present only on the Postgres backend; used by the health check.
    pub pool: Option<DbPool>,
}

impl AppState {
    /// Wire the workflow services over the given stores.
    ///
    /// The undo slot is loaded from `kv`; an expired record is discarded here.
    pub async fn build(
        entities: Arc<dyn EntityStore>,
        trail_store: Arc<dyn TrailStore>,
        kv: Arc<dyn KeyValueStore>,
        event_bus: Arc<EventBus>,
        config: ServerConfig,
        pool: Option<DbPool>,
    ) -> Self {
        let workflow = config.workflow.clone();
        let trail = Arc::new(AuditTrailLogger::new(trail_store, workflow.trail_scan_limit));
        let notifier = Arc::new(BroadcastNotifier::default());
        let engine = Arc::new(WorkflowEngine::new(
            entities,
            trail,
            Arc::clone(&event_bus),
            ActionNotifier::new(notifier.clone(), &workflow),
        ));

        let undo = UndoCache::load(kv, workflow.undo_window_secs).await;
        let coordinator = Arc::new(ApprovalCoordinator::new(
            Arc::clone(&engine),
            undo,
            notifier.clone(),
            workflow,
        ));

        Self {
            engine,
            coordinator,
            notifier,
            event_bus,
            config: Arc::new(config),
            pool,
        }
    }
}
