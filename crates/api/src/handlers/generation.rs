//! Handlers that start generation jobs and expose their log trail.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use launchkit_core::error::CoreError;
use launchkit_core::generation::validate_filename;
use launchkit_core::types::DbId;
use launchkit_db::models::generation_log::GenerationLog;
use launchkit_db::repositories::GenerationLogRepo;
use serde::Serialize;

use crate::engine::{spawn_generation, GenerationJob, GenerationRequest, PgGenerationStore};
use crate::error::{AppError, AppResult};
use crate::handlers::project::find_owned;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Acknowledgement returned with `202 Accepted`.
#[derive(Debug, Serialize)]
pub struct GenerationAccepted {
    pub status: &'static str,
    pub project_id: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// POST /api/v1/projects/{id}/generate
pub async fn generate_all(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<GenerationAccepted>>)> {
    find_owned(&state, project_id, auth.user_id).await?;
    start(&state, GenerationRequest::Full { project_id })
}

/// POST /api/v1/projects/{id}/files/{filename}/generate
pub async fn generate_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, filename)): Path<(DbId, String)>,
) -> AppResult<(StatusCode, Json<DataResponse<GenerationAccepted>>)> {
    validate_filename(&filename)?;
    find_owned(&state, project_id, auth.user_id).await?;
    start(
        &state,
        GenerationRequest::Single {
            project_id,
            filename: filename.trim().to_string(),
        },
    )
}

/// GET /api/v1/projects/{id}/logs
pub async fn list_logs(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<GenerationLog>>>> {
    find_owned(&state, project_id, auth.user_id).await?;
    let logs = GenerationLogRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// Claim the project and spawn the job. The response does not wait for it.
fn start(
    state: &AppState,
    request: GenerationRequest,
) -> AppResult<(StatusCode, Json<DataResponse<GenerationAccepted>>)> {
    let project_id = request.project_id();
    let guard = state.locks.try_acquire(project_id).ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "Generation already in progress for project {project_id}"
        )))
    })?;

    let filename = match &request {
        GenerationRequest::Single { filename, .. } => Some(filename.clone()),
        GenerationRequest::Full { .. } => None,
    };

    let store = Arc::new(PgGenerationStore::new(state.pool.clone()));
    let job = GenerationJob::new(store, state.generator.clone());
    spawn_generation(job, request, guard);

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: GenerationAccepted {
                status: "generating",
                project_id,
                filename,
            },
        }),
    ))
}
