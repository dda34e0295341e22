//! Repository for the `generated_files` table.

use launchkit_core::generation::FileStatus;
use launchkit_core::types::DbId;
use sqlx::PgPool;

use crate::models::generated_file::{CreateGeneratedFile, GeneratedFile, GeneratedFileSummary};

const COLUMNS: &str = "id, project_id, filename, content, file_type, status, created_at";
const SUMMARY_COLUMNS: &str = "id, project_id, filename, file_type, status, created_at";

pub struct GeneratedFileRepo;

impl GeneratedFileRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateGeneratedFile,
    ) -> Result<GeneratedFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO generated_files (project_id, filename, content, file_type, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedFile>(&query)
            .bind(input.project_id)
            .bind(&input.filename)
            .bind(&input.content)
            .bind(&input.file_type)
            .bind(input.status.as_str())
            .fetch_one(pool)
            .await
    }

    /// File metadata for a project in creation order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<GeneratedFileSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM generated_files
             WHERE project_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, GeneratedFileSummary>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Completed files with content, for archive export.
    pub async fn list_completed_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<GeneratedFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generated_files
             WHERE project_id = $1 AND status = $2
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, GeneratedFile>(&query)
            .bind(project_id)
            .bind(FileStatus::Completed.as_str())
            .fetch_all(pool)
            .await
    }

    /// Find a file by id, only if its project is owned by `owner_id`.
    pub async fn find_by_id_for_owner(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<GeneratedFile>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM generated_files f
             JOIN projects p ON p.id = f.project_id
             WHERE f.id = $1 AND p.owner_id = $2",
            prefixed("f", COLUMNS)
        );
        sqlx::query_as::<_, GeneratedFile>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Remove every file of a project. Returns the number of rows removed.
    pub async fn delete_by_project(pool: &PgPool, project_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM generated_files WHERE project_id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove every file of a project with the given name.
    pub async fn delete_by_name(
        pool: &PgPool,
        project_id: DbId,
        filename: &str,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM generated_files WHERE project_id = $1 AND filename = $2")
                .bind(project_id)
                .bind(filename)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}

/// Qualify each column of a `COLUMNS` list with a table alias.
fn prefixed(alias: &str, columns: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
