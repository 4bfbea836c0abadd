//! Handlers for the review queue: approve, reject and undo.
//!
//! All three go through the shared [`ApprovalCoordinator`](ideaflow_workflow::ApprovalCoordinator),
//! so a second request arriving while one is in flight gets `409 BUSY`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use ideaflow_core::types::{DbId, Timestamp};
use ideaflow_core::undo::ApprovalAction;
use ideaflow_db::models::idea::Idea;
use ideaflow_workflow::UndoRecord;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UndoStatusResponse {
    pub available: bool,
    pub record: Option<UndoRecord>,
    pub expires_at: Option<Timestamp>,
    pub window_secs: i64,
}

/// POST /api/v1/ideas/{id}/approve
pub async fn approve_idea(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    decide(auth, state, id, ApprovalAction::Approve).await
}

/// POST /api/v1/ideas/{id}/reject
pub async fn reject_idea(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    decide(auth, state, id, ApprovalAction::Reject).await
}

async fn decide(
    auth: AuthUser,
    state: AppState,
    id: DbId,
    action: ApprovalAction,
) -> AppResult<Json<DataResponse<Idea>>> {
    let idea = state
        .coordinator
        .handle_approval_by_id(id, action, &auth.actor())
        .await?;
    Ok(Json(DataResponse { data: idea }))
}

/// POST /api/v1/approvals/undo
///
/// Reverse the most recent approve/reject if it is still inside the window.
pub async fn undo_last_action(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let idea = state.coordinator.handle_undo(&auth.actor()).await?;
    Ok(Json(DataResponse { data: idea }))
}

/// GET /api/v1/approvals/undo
pub async fn undo_status(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let window_secs = state.coordinator.undo_window_secs();
    let record = state.coordinator.undo_status().await;
    let response = UndoStatusResponse {
        available: record.is_some(),
        expires_at: record.as_ref().map(|r| r.expires_at(window_secs)),
        record,
        window_secs,
    };
    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/approvals/pending
///
/// The in-memory review queue, head first.
pub async fn list_pending(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.coordinator.pending(),
    }))
}

/// POST /api/v1/approvals/pending/refresh
///
/// Reload the review queue from the store, oldest first.
pub async fn refresh_pending(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let pending = state.coordinator.refresh_pending().await?;
    Ok(Json(DataResponse { data: pending }))
}
