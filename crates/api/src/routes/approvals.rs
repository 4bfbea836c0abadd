use axum::routing::{get, post};
use axum::Router;

use crate::handlers::approvals;
use crate::state::AppState;

/// Routes mounted at `/approvals`.
///
/// ```text
/// GET    /pending              list_pending
/// POST   /pending/refresh      refresh_pending
/// GET    /undo                 undo_status
/// POST   /undo                 undo_last_action
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(approvals::list_pending))
        .route("/pending/refresh", post(approvals::refresh_pending))
        .route(
            "/undo",
            get(approvals::undo_status).post(approvals::undo_last_action),
        )
}
