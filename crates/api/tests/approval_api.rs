//! Approve, reject, undo and the review queue over HTTP.

mod common;

use axum::http::StatusCode;
use common::{admin, approver, body_json, contributor, submit_idea, TestApp};
use serde_json::json;

#[tokio::test]
async fn approve_then_undo_round_trip() {
    let app = TestApp::new().await;
    let id = submit_idea(&app, "Reduce onboarding time").await;

    let response = app.post("/api/v1/approvals/pending/refresh", &approver()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let pending = body_json(response).await;
    assert_eq!(pending["data"][0]["id"], id);

    let response = app
        .post(&format!("/api/v1/ideas/{id}/approve"), &approver())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "approved");
    assert_eq!(json["data"]["approved_by"], approver().id);

    let response = app.get("/api/v1/approvals/pending", &approver()).await;
    assert_eq!(body_json(response).await["data"], json!([]));

    let response = app.get("/api/v1/approvals/undo", &approver()).await;
    let status = body_json(response).await;
    assert_eq!(status["data"]["available"], true);
    assert_eq!(status["data"]["record"]["ideaId"], id);
    assert_eq!(status["data"]["record"]["action"], "approve");
    assert_eq!(status["data"]["window_secs"], 300);

    let response = app.post("/api/v1/approvals/undo", &approver()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending_approval");
    assert!(json["data"]["approved_by"].is_null());

    let response = app.get("/api/v1/approvals/pending", &approver()).await;
    assert_eq!(body_json(response).await["data"][0]["id"], id);

    let response = app.post("/api/v1/approvals/undo", &approver()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOTHING_TO_UNDO");
}

#[tokio::test]
async fn contributor_cannot_approve() {
    let app = TestApp::new().await;
    let id = submit_idea(&app, "Self review").await;

    let response = app
        .post(&format!("/api/v1/ideas/{id}/approve"), &contributor())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get(&format!("/api/v1/ideas/{id}"), &contributor()).await;
    assert_eq!(body_json(response).await["data"]["status"], "pending_approval");
}

#[tokio::test]
async fn rejecting_an_approved_idea_is_a_conflict() {
    let app = TestApp::new().await;
    let id = submit_idea(&app, "Twice reviewed").await;
    app.post(&format!("/api/v1/ideas/{id}/approve"), &approver())
        .await;

    let response = app
        .post(&format!("/api/v1/ideas/{id}/reject"), &approver())
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn approving_missing_idea_is_not_found() {
    let app = TestApp::new().await;
    let response = app.post("/api/v1/ideas/999/approve", &approver()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notifications_follow_each_action() {
    let app = TestApp::new().await;
    let id = submit_idea(&app, "Noisy").await;
    app.post(&format!("/api/v1/ideas/{id}/reject"), &approver())
        .await;
    app.post("/api/v1/approvals/undo", &approver()).await;

    let response = app.get("/api/v1/notifications/recent", &admin()).await;
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Action undone", "Idea rejected", "Idea submitted"]);
    assert_eq!(json["data"][0]["type"], "success");
}

#[tokio::test]
async fn review_is_recorded_in_the_trail() {
    let app = TestApp::new().await;
    let id = submit_idea(&app, "Audited").await;
    app.post(&format!("/api/v1/ideas/{id}/approve"), &approver())
        .await;

    let response = app
        .get(&format!("/api/v1/ideas/{id}/trail"), &admin())
        .await;
    let json = body_json(response).await;
    let events = json["data"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_type"], "approved");
    assert_eq!(events[0]["previous_status"], "pending_approval");
    assert_eq!(events[0]["new_status"], "approved");
    assert_eq!(events[0]["actor"]["id"], approver().id);
    assert_eq!(events[1]["event_type"], "submitted");
}
