use tokio::task::JoinHandle;
use tracing::Instrument;

use super::job::{GenerationError, GenerationJob, GenerationRequest};
use super::locks::ProjectLockGuard;

/// Run `job` as a detached task. The project lock is held for the task's
/// lifetime and released however it ends.
///
/// Failures were already narrated by the job; they are reported here through
/// `tracing`. A failure whose error entry the job could not store gets one
/// more attempt, except a missing project, which has no trail to write to.
pub fn spawn_generation(
    job: GenerationJob,
    request: GenerationRequest,
    guard: ProjectLockGuard,
) -> JoinHandle<()> {
    let project_id = request.project_id();
    let span = tracing::info_span!("generation", project_id);

    tokio::spawn(
        async move {
            let _guard = guard;
            tracing::info!(?request, "Generation job started");

            match job.run(&request).await {
                Ok(files) => tracing::info!(files, "Generation job finished"),
                Err(err) => {
                    tracing::error!(kind = err.kind(), error = %err, "Generation job failed");
                    if !job.error_logged() && !matches!(err, GenerationError::MissingProject(_)) {
                        job.report_unlogged_failure(project_id, &err).await;
                    }
                }
            }
        }
        .instrument(span),
    )
}
