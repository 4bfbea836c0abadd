//! Route definitions for ideas and their sub-resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{approvals, discussions, ideas, tasks, trail};
use crate::state::AppState;

/// Routes mounted at `/ideas`.
///
/// ```text
/// GET    /                     list_ideas
/// POST   /                     submit_idea
/// GET    /{id}                 get_idea
/// PATCH  /{id}                 update_idea
/// POST   /{id}/status          transition_idea
/// POST   /{id}/approve         approve_idea
/// POST   /{id}/reject          reject_idea
/// POST   /{id}/attachments     upload_attachment
/// GET    /{id}/tasks           list_idea_tasks
/// GET    /{id}/discussion      get_idea_discussion
/// POST   /{id}/discussion      open_idea_discussion
/// GET    /{id}/trail           idea_trail
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ideas::list_ideas).post(ideas::submit_idea))
        .route("/{id}", get(ideas::get_idea).patch(ideas::update_idea))
        .route("/{id}/status", post(ideas::transition_idea))
        .route("/{id}/approve", post(approvals::approve_idea))
        .route("/{id}/reject", post(approvals::reject_idea))
        .route("/{id}/attachments", post(ideas::upload_attachment))
        .route("/{id}/tasks", get(tasks::list_idea_tasks))
        .route(
            "/{id}/discussion",
            get(discussions::get_idea_discussion).post(discussions::open_idea_discussion),
        )
        .route("/{id}/trail", get(trail::idea_trail))
}
