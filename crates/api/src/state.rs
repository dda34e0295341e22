use std::sync::Arc;

use launchkit_textgen::TextGenerator;

use crate::config::ServerConfig;
use crate::engine::ProjectLocks;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is a pool handle or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: launchkit_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Text-generation client. `None` when no API key is configured; jobs
    /// then fail with a missing-key error instead of calling out.
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// One in-flight generation per project.
    pub locks: Arc<ProjectLocks>,
}
