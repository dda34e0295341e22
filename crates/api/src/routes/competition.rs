use axum::routing::get;
use axum::Router;

use crate::handlers::competition;
use crate::state::AppState;

/// Routes mounted at `/competitions`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(competition::list))
        .route("/{id}", get(competition::get_by_id))
}
