//! Competition templates. Read-only from the API.

use launchkit_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A competition row from the `competitions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Competition {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Guidance shown to users while they write their idea.
    pub advice_prompt: Option<String>,
    /// Replaces the default generation instruction when non-blank.
    pub file_generation_prompt: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
