use launchkit_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A progress entry from the `generation_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationLog {
    pub id: DbId,
    pub project_id: DbId,
    pub message: String,
    /// One of `LogType`'s lowercase names.
    pub log_type: String,
    pub created_at: Timestamp,
}
