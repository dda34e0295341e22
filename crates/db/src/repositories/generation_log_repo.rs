//! Repository for the `generation_logs` table.

use launchkit_core::generation::LogType;
use launchkit_core::types::DbId;
use sqlx::PgPool;

use crate::models::generation_log::GenerationLog;

const COLUMNS: &str = "id, project_id, message, log_type, created_at";

pub struct GenerationLogRepo;

impl GenerationLogRepo {
    /// Append one entry. Runs as its own statement so it is visible to
    /// pollers as soon as this returns.
    pub async fn append(
        pool: &PgPool,
        project_id: DbId,
        log_type: LogType,
        message: &str,
    ) -> Result<GenerationLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_logs (project_id, message, log_type)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationLog>(&query)
            .bind(project_id)
            .bind(message)
            .bind(log_type.as_str())
            .fetch_one(pool)
            .await
    }

    /// The project's log trail, oldest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<GenerationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_logs
             WHERE project_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, GenerationLog>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Delete the project's entries written before the entry `marker_id`.
    pub async fn delete_before(
        pool: &PgPool,
        project_id: DbId,
        marker_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM generation_logs WHERE project_id = $1 AND id < $2")
            .bind(project_id)
            .bind(marker_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
