//! Repository for the `competitions` table.

use launchkit_core::types::DbId;
use sqlx::PgPool;

use crate::models::competition::Competition;

const COLUMNS: &str =
    "id, name, description, advice_prompt, file_generation_prompt, created_at, updated_at";

/// Read access to competition templates.
pub struct CompetitionRepo;

impl CompetitionRepo {
    /// List every competition in seed order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Competition>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM competitions ORDER BY id");
        sqlx::query_as::<_, Competition>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Competition>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM competitions WHERE id = $1");
        sqlx::query_as::<_, Competition>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM competitions WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }
}
