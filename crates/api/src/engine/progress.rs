use std::sync::Arc;

use launchkit_core::generation::LogType;
use launchkit_core::types::DbId;

use super::store::GenerationStore;

/// Writes one run's progress entries. A failed write is reported through
/// `tracing` and otherwise ignored so narration never aborts the run.
pub struct ProgressLog {
    store: Arc<dyn GenerationStore>,
    project_id: DbId,
}

impl ProgressLog {
    pub fn new(store: Arc<dyn GenerationStore>, project_id: DbId) -> Self {
        Self { store, project_id }
    }

    /// Append an entry; returns whether it was stored.
    pub async fn emit(&self, log_type: LogType, message: &str) -> bool {
        match self
            .store
            .append_log(self.project_id, log_type, message)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    project_id = self.project_id,
                    %log_type,
                    error = %e,
                    "Failed to write generation log entry",
                );
                false
            }
        }
    }

    pub async fn info(&self, message: &str) -> bool {
        self.emit(LogType::Info, message).await
    }

    pub async fn success(&self, message: &str) -> bool {
        self.emit(LogType::Success, message).await
    }

    pub async fn warning(&self, message: &str) -> bool {
        self.emit(LogType::Warning, message).await
    }

    pub async fn error(&self, message: &str) -> bool {
        self.emit(LogType::Error, message).await
    }
}
