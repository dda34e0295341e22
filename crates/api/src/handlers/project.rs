//! Handlers for the `/projects` resource.
//!
//! Every lookup is scoped to the caller; another user's project reads as
//! not found.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use launchkit_core::error::CoreError;
use launchkit_core::types::DbId;
use launchkit_db::models::project::{CreateProject, Project, UpdateProject};
use launchkit_db::repositories::{CompetitionRepo, ProjectRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /projects`. Text fields are trimmed before
/// validation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub idea_description: String,
    pub competition_id: Option<DbId>,
}

/// Request body for `PUT /projects/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub idea_description: Option<String>,
    pub competition_id: Option<DbId>,
}

/// Load a project the caller owns, or 404.
pub(crate) async fn find_owned(
    state: &AppState,
    project_id: DbId,
    owner_id: DbId,
) -> AppResult<Project> {
    ProjectRepo::find_for_owner(&state.pool, project_id, owner_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))
}

async fn ensure_competition_exists(state: &AppState, competition_id: Option<DbId>) -> AppResult<()> {
    if let Some(id) = competition_id {
        if !CompetitionRepo::exists(&state.pool, id).await? {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Competition",
                id,
            }));
        }
    }
    Ok(())
}

fn trimmed(s: &str) -> String {
    s.trim().to_string()
}

/// POST /api/v1/projects
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let input = CreateProjectRequest {
        name: trimmed(&input.name),
        description: input.description.as_deref().map(trimmed).filter(|d| !d.is_empty()),
        idea_description: trimmed(&input.idea_description),
        competition_id: input.competition_id,
    };
    input.validate()?;
    ensure_competition_exists(&state, input.competition_id).await?;

    let project = ProjectRepo::create(
        &state.pool,
        auth.user_id,
        &CreateProject {
            name: input.name,
            description: input.description,
            idea_description: input.idea_description,
            competition_id: input.competition_id,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, user_id = auth.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_owned(&state, id, auth.user_id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let input = UpdateProjectRequest {
        name: input.name.as_deref().map(trimmed),
        description: input.description.as_deref().map(trimmed),
        idea_description: input.idea_description.as_deref().map(trimmed),
        competition_id: input.competition_id,
    };
    input.validate()?;
    ensure_competition_exists(&state, input.competition_id).await?;

    let update = UpdateProject {
        name: input.name,
        description: input.description,
        idea_description: input.idea_description,
        competition_id: input.competition_id,
    };
    let project = ProjectRepo::update(&state.pool, id, auth.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Removes the project with its files and logs. Refused while a generation
/// job is running for it.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned(&state, id, auth.user_id).await?;
    let _guard = state.locks.try_acquire(id).ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!(
            "Generation in progress for project {id}"
        )))
    })?;

    if ProjectRepo::delete_cascade(&state.pool, id, auth.user_id).await? {
        tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}
