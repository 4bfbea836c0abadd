use axum::routing::get;
use axum::Router;

use crate::handlers::trail;
use crate::state::AppState;

/// Routes mounted at `/trail`.
///
/// ```text
/// GET    /                     global_trail
/// GET    /integrity            verify_integrity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trail::global_trail))
        .route("/integrity", get(trail::verify_integrity))
}
