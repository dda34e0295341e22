//! Generated document rows.

use launchkit_core::generation::FileStatus;
use launchkit_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A full row from the `generated_files` table, content included.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeneratedFile {
    pub id: DbId,
    pub project_id: DbId,
    pub filename: String,
    pub content: String,
    pub file_type: String,
    /// One of [`FileStatus`]'s lowercase names.
    pub status: String,
    pub created_at: Timestamp,
}

impl GeneratedFile {
    pub fn is_completed(&self) -> bool {
        self.status == FileStatus::Completed.as_str()
    }
}

/// File metadata for listings. Omits the content column.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeneratedFileSummary {
    pub id: DbId,
    pub project_id: DbId,
    pub filename: String,
    pub file_type: String,
    pub status: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a generated file.
#[derive(Debug, Clone)]
pub struct CreateGeneratedFile {
    pub project_id: DbId,
    pub filename: String,
    pub content: String,
    pub file_type: String,
    pub status: FileStatus,
}
