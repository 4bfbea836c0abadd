pub mod approvals;
pub mod discussions;
pub mod health;
pub mod ideas;
pub mod notifications;
pub mod tasks;
pub mod trail;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ideas                                 list, submit
/// /ideas/{id}                            get, edit (PATCH)
/// /ideas/{id}/status                     direct status change (POST)
/// /ideas/{id}/approve                    approve (POST)
/// /ideas/{id}/reject                     reject (POST)
/// /ideas/{id}/attachments                upload (POST, multipart)
/// /ideas/{id}/tasks                      tasks of the idea
/// /ideas/{id}/discussion                 get, open
/// /ideas/{id}/trail                      idea trail, most recent first
///
/// /approvals/pending                     review queue
/// /approvals/pending/refresh             reload queue from store (POST)
/// /approvals/undo                        undo status (GET), undo (POST)
///
/// /tasks                                 list, create
/// /tasks/{id}                            get, update (PATCH)
/// /tasks/{id}/discussion                 get, open
///
/// /discussions/{id}                      thread with messages
/// /discussions/{id}/lock                 lock (POST)
/// /discussions/{id}/unlock               unlock (POST)
/// /discussions/{id}/messages             post message (POST)
///
/// /trail                                 global trail
/// /trail/integrity                       hash chain verification
///
/// /notifications/recent                  recent notifications
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/ideas", ideas::router())
        .nest("/approvals", approvals::router())
        .nest("/tasks", tasks::router())
        .nest("/discussions", discussions::router())
        .nest("/trail", trail::router())
        .nest("/notifications", notifications::router())
}
