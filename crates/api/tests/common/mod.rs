#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use ideaflow_core::identity::Actor;
use ideaflow_core::roles::{ROLE_ADMIN, ROLE_APPROVER, ROLE_CONTRIBUTOR};
use ideaflow_db::kv::MemoryKeyValueStore;
use ideaflow_db::MemoryStore;
use ideaflow_events::EventBus;
use ideaflow_workflow::WorkflowConfig;
use tower::ServiceExt;

use ideaflow_api::config::{ServerConfig, StoreBackend};
use ideaflow_api::router::build_app_router;
use ideaflow_api::state::AppState;

/// Build a test `ServerConfig` on the memory backend.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        attachment_dir: std::env::temp_dir().join("ideaflow-test-attachments"),
        state_dir: std::env::temp_dir().join("ideaflow-test-state"),
        workflow: WorkflowConfig::default(),
    }
}

/// The application under test plus handles to its in-memory backing stores.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    pub async fn with_store(store: MemoryStore) -> Self {
        let config = test_config();
        let store = Arc::new(store);
        let state = AppState::build(
            store.clone(),
            store.clone(),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(EventBus::default()),
            config.clone(),
            None,
        )
        .await;
        let router = build_app_router(state.clone(), &config);
        Self {
            router,
            state,
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, user: &Actor) -> Response {
        self.send(request(Method::GET, uri, Some(user), None)).await
    }

    pub async fn post_json(&self, uri: &str, user: &Actor, body: serde_json::Value) -> Response {
        self.send(request(Method::POST, uri, Some(user), Some(body)))
            .await
    }

    pub async fn patch_json(&self, uri: &str, user: &Actor, body: serde_json::Value) -> Response {
        self.send(request(Method::PATCH, uri, Some(user), Some(body)))
            .await
    }

    /// POST with no body.
    pub async fn post(&self, uri: &str, user: &Actor) -> Response {
        self.send(request(Method::POST, uri, Some(user), None)).await
    }
}

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
// Request / response helpers
// ---------------------------------------------------------------------------

pub fn request(
    method: Method,
    uri: &str,
    user: Option<&Actor>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder
            .header("x-user-id", user.id.to_string())
            .header("x-user-name", user.name.as_str())
            .header("x-user-email", user.email.as_str())
            .header("x-user-role", user.role.as_str());
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Submit an idea as the contributor and return its id.
pub async fn submit_idea(app: &TestApp, title: &str) -> i64 {
    let response = app
        .post_json(
            "/api/v1/ideas",
            &contributor(),
            serde_json::json!({
                "title": title,
                "description": "details",
                "category": "process",
                "priority": "high",
            }),
        )
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
