//! Route definitions for the `/projects` resource, including the
//! project-scoped file, log, and generation routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{file, generation, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
///
/// POST   /{id}/generate                     -> generate_all
/// GET    /{id}/files                        -> list_by_project
/// GET    /{id}/files/archive                -> archive
/// POST   /{id}/files/{filename}/generate    -> generate_file
/// GET    /{id}/logs                         -> list_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/generate", post(generation::generate_all))
        .route("/{id}/files", get(file::list_by_project))
        .route("/{id}/files/archive", get(file::archive))
        .route(
            "/{id}/files/{filename}/generate",
            post(generation::generate_file),
        )
        .route("/{id}/logs", get(generation::list_logs))
}
