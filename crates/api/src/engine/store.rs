//! Persistence seam for the generation job.

use async_trait::async_trait;
use launchkit_core::generation::LogType;
use launchkit_core::types::DbId;
use launchkit_db::models::competition::Competition;
use launchkit_db::models::generated_file::CreateGeneratedFile;
use launchkit_db::models::project::Project;
use launchkit_db::repositories::{
    CompetitionRepo, GeneratedFileRepo, GenerationLogRepo, ProjectRepo,
};
use launchkit_db::DbPool;

/// Everything the job reads or writes. Each call is its own committed
/// statement, so pollers see progress as it happens.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn load_project(&self, project_id: DbId) -> Result<Option<Project>, sqlx::Error>;

    async fn load_competition(
        &self,
        competition_id: DbId,
    ) -> Result<Option<Competition>, sqlx::Error>;

    /// Append a log entry and return its id.
    async fn append_log(
        &self,
        project_id: DbId,
        log_type: LogType,
        message: &str,
    ) -> Result<DbId, sqlx::Error>;

    /// Delete the project's log entries older than `marker_id`.
    async fn clear_logs_before(&self, project_id: DbId, marker_id: DbId)
        -> Result<u64, sqlx::Error>;

    async fn delete_files(&self, project_id: DbId) -> Result<u64, sqlx::Error>;

    async fn delete_file_named(&self, project_id: DbId, filename: &str)
        -> Result<u64, sqlx::Error>;

    async fn insert_file(&self, file: &CreateGeneratedFile) -> Result<DbId, sqlx::Error>;
}

/// [`GenerationStore`] over the Postgres pool. Owns its own pool handle so
/// the job does not depend on the request that started it.
#[derive(Clone)]
pub struct PgGenerationStore {
    pool: DbPool,
}

impl PgGenerationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn load_project(&self, project_id: DbId) -> Result<Option<Project>, sqlx::Error> {
        ProjectRepo::find_by_id(&self.pool, project_id).await
    }

    async fn load_competition(
        &self,
        competition_id: DbId,
    ) -> Result<Option<Competition>, sqlx::Error> {
        CompetitionRepo::find_by_id(&self.pool, competition_id).await
    }

    async fn append_log(
        &self,
        project_id: DbId,
        log_type: LogType,
        message: &str,
    ) -> Result<DbId, sqlx::Error> {
        let log = GenerationLogRepo::append(&self.pool, project_id, log_type, message).await?;
        Ok(log.id)
    }

    async fn clear_logs_before(
        &self,
        project_id: DbId,
        marker_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        GenerationLogRepo::delete_before(&self.pool, project_id, marker_id).await
    }

    async fn delete_files(&self, project_id: DbId) -> Result<u64, sqlx::Error> {
        GeneratedFileRepo::delete_by_project(&self.pool, project_id).await
    }

    async fn delete_file_named(
        &self,
        project_id: DbId,
        filename: &str,
    ) -> Result<u64, sqlx::Error> {
        GeneratedFileRepo::delete_by_name(&self.pool, project_id, filename).await
    }

    async fn insert_file(&self, file: &CreateGeneratedFile) -> Result<DbId, sqlx::Error> {
        let row = GeneratedFileRepo::create(&self.pool, file).await?;
        Ok(row.id)
    }
}
