//! Handlers for tasks under approved ideas.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ideaflow_core::types::DbId;
use ideaflow_db::models::task::{NewTask, TaskFilter, TaskUpdate};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tasks
///
/// Filters: `idea_id`, `assignee`, `status`.
pub async fn list_tasks(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<impl IntoResponse> {
    let tasks = state.engine.list_tasks(&filter).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/ideas/{id}/tasks
pub async fn list_idea_tasks(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(idea_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.get_idea(idea_id).await?;
    let tasks = state.engine.list_tasks(&TaskFilter::for_idea(idea_id)).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = state.engine.get_task(id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /api/v1/tasks
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewTask>,
) -> AppResult<impl IntoResponse> {
    let task = state.engine.create_task(&auth.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// PATCH /api/v1/tasks/{id}
///
/// Assignees may change `status` and `percent_complete`; task managers may
/// change every field.
pub async fn update_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TaskUpdate>,
) -> AppResult<impl IntoResponse> {
    let task = state.engine.update_task(&auth.actor(), id, input).await?;
    Ok(Json(DataResponse { data: task }))
}
