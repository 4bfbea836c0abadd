//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use ideaflow_api::error::AppError;
use ideaflow_core::error::CoreError;
use ideaflow_db::StoreError;
use ideaflow_workflow::WorkflowError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(AppError::Core(CoreError::NotFound {
        entity: "Idea",
        id: 42,
    }))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Idea with id 42 not found");
}

#[tokio::test]
async fn invalid_transition_returns_409() {
    let (status, json) = error_to_response(AppError::Core(CoreError::InvalidTransition {
        entity: "idea",
        from: "rejected".into(),
        to: "completed".into(),
        reason: "not allowed".into(),
    }))
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert!(json["error"].as_str().unwrap().contains("rejected"));
}

#[tokio::test]
async fn busy_returns_409_with_busy_code() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Busy("in progress".into()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "BUSY");
}

#[tokio::test]
async fn discussion_locked_returns_423() {
    let (status, json) = error_to_response(AppError::Core(CoreError::DiscussionLocked {
        discussion_id: 7,
    }))
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(json["code"], "DISCUSSION_LOCKED");
}

#[tokio::test]
async fn nothing_to_undo_returns_404() {
    let (status, json) = error_to_response(AppError::Core(CoreError::NothingToUndo)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOTHING_TO_UNDO");
}

#[tokio::test]
async fn validation_and_permission_errors() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Validation("title required".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "title required");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("nope".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, _) =
        error_to_response(AppError::Core(CoreError::Unauthorized("who".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn store_failure_returns_503_without_details() {
    let err: AppError =
        WorkflowError::from(StoreError::Unavailable("connection reset".into())).into();
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "STORE_UNAVAILABLE");
    assert!(!json["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn store_miss_through_workflow_is_not_found() {
    let err: AppError = WorkflowError::from(StoreError::NotFound {
        entity: "Task",
        id: 7,
    })
    .into();
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Task with id 7 not found");
}

#[tokio::test]
async fn internal_error_hides_message() {
    let (status, json) =
        error_to_response(AppError::InternalError("stack trace here".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
