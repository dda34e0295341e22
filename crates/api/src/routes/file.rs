use axum::routing::get;
use axum::Router;

use crate::handlers::file;
use crate::state::AppState;

/// Routes mounted at `/files`.
///
/// ```text
/// GET    /{id}/content    -> content
/// GET    /{id}/download   -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/content", get(file::content))
        .route("/{id}/download", get(file::download))
}
