pub mod auth;
pub mod competition;
pub mod file;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /competitions                                    list (public)
/// /competitions/{id}                               get (public)
///
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/generate                          start full run (POST)
/// /projects/{id}/files                             file metadata
/// /projects/{id}/files/archive                     ZIP of completed files
/// /projects/{id}/files/{filename}/generate         start single-file run (POST)
/// /projects/{id}/logs                              generation log trail
///
/// /files/{id}/content                              file content
/// /files/{id}/download                             file attachment
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/competitions", competition::router())
        .nest("/projects", project::router())
        .nest("/files", file::router())
}
