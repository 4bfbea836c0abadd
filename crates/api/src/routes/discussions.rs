use axum::routing::{get, post};
use axum::Router;

use crate::handlers::discussions;
use crate::state::AppState;

/// Routes mounted at `/discussions`.
///
/// ```text
/// GET    /{id}                 get_discussion
/// POST   /{id}/lock            lock_discussion
/// POST   /{id}/unlock          unlock_discussion
/// POST   /{id}/messages        post_message
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(discussions::get_discussion))
        .route("/{id}/lock", post(discussions::lock_discussion))
        .route("/{id}/unlock", post(discussions::unlock_discussion))
        .route("/{id}/messages", post(discussions::post_message))
}
