//! Handlers for reading the audit trail.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use ideaflow_core::types::DbId;
use ideaflow_db::models::trail_event::IntegrityCheckResult;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::TrailParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IntegrityResponse {
    #[serde(flatten)]
    pub integrity: IntegrityCheckResult,
    /// Trail appends that failed since the server started.
    pub append_failures: u64,
    pub last_failure: Option<String>,
}

/// GET /api/v1/ideas/{id}/trail
///
/// The idea's events, most recent first.
pub async fn idea_trail(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(idea_id): Path<DbId>,
    Query(params): Query<TrailParams>,
) -> AppResult<impl IntoResponse> {
    let take = params.page_size(state.config.workflow.trail_scan_limit);
    let events = state.engine.trail().recent(Some(idea_id), take).await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/trail
///
/// The global trail, most recent first. `?idea_id=` narrows to one idea.
pub async fn global_trail(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TrailParams>,
) -> AppResult<impl IntoResponse> {
    let take = params.page_size(state.config.workflow.trail_scan_limit);
    let events = state.engine.trail().recent(params.idea_id, take).await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/trail/integrity
///
/// Recompute the hash chain over the whole trail.
pub async fn verify_integrity(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let trail = state.engine.trail();
    let integrity = trail.verify_integrity().await?;
    Ok(Json(DataResponse {
        data: IntegrityResponse {
            integrity,
            append_failures: trail.failure_count(),
            last_failure: trail.last_failure(),
        },
    }))
}
