//! Handlers for discussion threads attached to ideas and tasks.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::error::CoreError;
use ideaflow_core::types::DbId;
use ideaflow_db::models::discussion::NewMessage;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of the thread-opening endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct OpenDiscussionRequest {
    #[serde(default)]
    pub context: Option<String>,
}

/// POST /api/v1/ideas/{id}/discussion
///
/// Open the idea's thread, or return the existing one.
pub async fn open_idea_discussion(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(idea_id): Path<DbId>,
    Json(input): Json<OpenDiscussionRequest>,
) -> AppResult<impl IntoResponse> {
    let discussion = state
        .engine
        .open_discussion(&auth.actor(), DiscussionOwner::Idea(idea_id), input.context)
        .await?;
    Ok(Json(DataResponse { data: discussion }))
}

/// POST /api/v1/tasks/{id}/discussion
pub async fn open_task_discussion(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<OpenDiscussionRequest>,
) -> AppResult<impl IntoResponse> {
    let discussion = state
        .engine
        .open_discussion(&auth.actor(), DiscussionOwner::Task(task_id), input.context)
        .await?;
    Ok(Json(DataResponse { data: discussion }))
}

/// GET /api/v1/ideas/{id}/discussion
pub async fn get_idea_discussion(
    auth: AuthUser,
    state: State<AppState>,
    Path(idea_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    thread_for_owner(auth, state, DiscussionOwner::Idea(idea_id)).await
}

/// GET /api/v1/tasks/{id}/discussion
pub async fn get_task_discussion(
    auth: AuthUser,
    state: State<AppState>,
    Path(task_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    thread_for_owner(auth, state, DiscussionOwner::Task(task_id)).await
}

async fn thread_for_owner(
    _auth: AuthUser,
    State(state): State<AppState>,
    owner: DiscussionOwner,
) -> AppResult<impl IntoResponse> {
    let discussion = state
        .engine
        .discussions()
        .thread_for(owner)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Discussion",
                id: owner.entity_id(),
            })
        })?;
    let thread = state.engine.discussion(discussion.id).await?;
    Ok(Json(DataResponse { data: thread }))
}

/// GET /api/v1/discussions/{id}
///
/// The thread with its messages, oldest first.
pub async fn get_discussion(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let thread = state.engine.discussion(id).await?;
    Ok(Json(DataResponse { data: thread }))
}

/// POST /api/v1/discussions/{id}/lock
pub async fn lock_discussion(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let discussion = state
        .engine
        .set_discussion_locked(&auth.actor(), id, true)
        .await?;
    Ok(Json(DataResponse { data: discussion }))
}

/// POST /api/v1/discussions/{id}/unlock
pub async fn unlock_discussion(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let discussion = state
        .engine
        .set_discussion_locked(&auth.actor(), id, false)
        .await?;
    Ok(Json(DataResponse { data: discussion }))
}

/// POST /api/v1/discussions/{id}/messages
///
/// Fails with `423 DISCUSSION_LOCKED` while the thread is locked.
pub async fn post_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<NewMessage>,
) -> AppResult<impl IntoResponse> {
    let message = state.engine.add_message(&auth.actor(), id, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}
