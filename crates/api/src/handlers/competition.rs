//! Handlers for the read-only `/competitions` resource.

use axum::extract::{Path, State};
use axum::Json;
use launchkit_core::error::CoreError;
use launchkit_core::types::DbId;
use launchkit_db::models::competition::Competition;
use launchkit_db::repositories::CompetitionRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/competitions
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Competition>>>> {
    let competitions = CompetitionRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: competitions }))
}

/// GET /api/v1/competitions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Competition>>> {
    let competition = CompetitionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Competition",
            id,
        }))?;
    Ok(Json(DataResponse { data: competition }))
}
