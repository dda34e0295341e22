//! Handlers for generated files: listing, content, download, ZIP export.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use launchkit_core::error::CoreError;
use launchkit_core::generation::content_type_for;
use launchkit_core::types::DbId;
use launchkit_db::models::generated_file::{GeneratedFile, GeneratedFileSummary};
use launchkit_db::repositories::GeneratedFileRepo;
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{AppError, AppResult};
use crate::handlers::project::find_owned;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `GET /files/{id}/content`.
#[derive(Debug, Serialize)]
pub struct FileContent {
    pub id: DbId,
    pub filename: String,
    pub file_type: String,
    pub content: String,
}

/// GET /api/v1/projects/{id}/files
pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<GeneratedFileSummary>>>> {
    find_owned(&state, project_id, auth.user_id).await?;
    let files = GeneratedFileRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: files }))
}

/// GET /api/v1/files/{id}/content
pub async fn content(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FileContent>>> {
    let file = find_completed(&state, id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: FileContent {
            id: file.id,
            filename: file.filename,
            file_type: file.file_type,
            content: file.content,
        },
    }))
}

/// GET /api/v1/files/{id}/download
pub async fn download(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let file = find_completed(&state, id, auth.user_id).await?;
    let disposition = attachment(&file.filename);
    Ok((
        [
            (CONTENT_TYPE, content_type_for(&file.file_type).to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    )
        .into_response())
}

/// GET /api/v1/projects/{id}/files/archive
///
/// ZIP of the project's completed files.
pub async fn archive(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Response> {
    find_owned(&state, project_id, auth.user_id).await?;
    let files = GeneratedFileRepo::list_completed_by_project(&state.pool, project_id).await?;
    if files.is_empty() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Completed files for project",
            id: project_id,
        }));
    }

    let bytes = build_archive(&files)
        .map_err(|e| AppError::InternalError(format!("Failed to build archive: {e}")))?;
    tracing::debug!(project_id, files = files.len(), bytes = bytes.len(), "Built file archive");

    Ok((
        [
            (CONTENT_TYPE, "application/zip".to_string()),
            (
                CONTENT_DISPOSITION,
                attachment(&format!("project_{project_id}_files.zip")),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_completed(state: &AppState, id: DbId, owner_id: DbId) -> AppResult<GeneratedFile> {
    let file = GeneratedFileRepo::find_by_id_for_owner(&state.pool, id, owner_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "File",
            id,
        }))?;
    if !file.is_completed() {
        return Err(AppError::BadRequest(format!(
            "File is not ready (status: {})",
            file.status
        )));
    }
    Ok(file)
}

fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// Write `files` into an in-memory ZIP. Entry names are flattened to a single
/// path component and made unique.
pub fn build_archive(files: &[GeneratedFile]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();

    for file in files {
        writer.start_file(entry_name(&file.filename, &mut used), options)?;
        writer.write_all(file.content.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

fn entry_name(filename: &str, used: &mut HashSet<String>) -> String {
    let flat: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let flat = if flat.trim().is_empty() {
        "unnamed".to_string()
    } else {
        flat
    };

    if used.insert(flat.clone()) {
        return flat;
    }
    let (stem, ext) = match flat.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
        _ => (flat.clone(), String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
