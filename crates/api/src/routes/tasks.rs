use axum::routing::get;
use axum::Router;

use crate::handlers::{discussions, tasks};
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                     list_tasks
/// POST   /                     create_task
/// GET    /{id}                 get_task
/// PATCH  /{id}                 update_task
/// GET    /{id}/discussion      get_task_discussion
/// POST   /{id}/discussion      open_task_discussion
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/{id}", get(tasks::get_task).patch(tasks::update_task))
        .route(
            "/{id}/discussion",
            get(discussions::get_task_discussion).post(discussions::open_task_discussion),
        )
}
