//! Handlers for idea submission, editing, status changes and attachments.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ideaflow_core::status::IdeaStatus;
use ideaflow_core::types::DbId;
use ideaflow_db::models::attachment::FileUpload;
use ideaflow_db::models::idea::{IdeaFilter, IdeaUpdate, NewIdea};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /ideas/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: IdeaStatus,
}

/// GET /api/v1/ideas
///
/// List ideas, oldest first. Filters: `status`, `created_by`, `category`.
pub async fn list_ideas(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<IdeaFilter>,
) -> AppResult<impl IntoResponse> {
    let ideas = state.engine.list_ideas(&filter).await?;
    Ok(Json(DataResponse { data: ideas }))
}

/// GET /api/v1/ideas/{id}
pub async fn get_idea(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let idea = state.engine.get_idea(id).await?;
    Ok(Json(DataResponse { data: idea }))
}

/// POST /api/v1/ideas
pub async fn submit_idea(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewIdea>,
) -> AppResult<impl IntoResponse> {
    let idea = state.engine.submit_idea(&auth.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: idea })))
}

/// PATCH /api/v1/ideas/{id}
///
/// Edit title, description, category or priority. Never changes status.
pub async fn update_idea(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<IdeaUpdate>,
) -> AppResult<impl IntoResponse> {
    let idea = state.engine.update_idea(&auth.actor(), id, input).await?;
    Ok(Json(DataResponse { data: idea }))
}

/// POST /api/v1/ideas/{id}/status
///
/// Direct status change; only completion is accepted. Approve and reject
/// targets are refused with 409 and must use the approve/reject endpoints.
pub async fn transition_idea(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let idea = state
        .engine
        .transition_idea(&auth.actor(), id, input.status)
        .await?;
    Ok(Json(DataResponse { data: idea }))
}

/// POST /api/v1/ideas/{id}/attachments
///
/// Multipart upload with a single `file` field.
pub async fn upload_attachment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut upload: Option<FileUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("attachment").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some(FileUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let file = upload.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let attachment = state.engine.attach_to_idea(&auth.actor(), id, file).await?;

    tracing::info!(idea_id = id, user_id = auth.user_id, file_name = %attachment.file_name, "Attachment uploaded");
    Ok((StatusCode::CREATED, Json(DataResponse { data: attachment })))
}
