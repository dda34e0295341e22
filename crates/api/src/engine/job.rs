//! The generation job: one linear pass over a project with error branches.
//!
//! A run always leaves the project's files reflecting only itself, and its
//! log trail ends with exactly one terminal entry: the success summary or
//! the error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use launchkit_core::extract::{extract_json, parse_files_payload, FileSpec, ParseError};
use launchkit_core::generation::{
    file_type_for_filename, truncate_chars, FileStatus, LogType, DEFAULT_FILE_TYPE,
    ERROR_FILENAME, RESPONSE_SNIPPET_CHARS,
};
use launchkit_core::prompt::{
    build_single_file_prompt, build_user_prompt, resolve_system_prompt, ProjectBrief,
    DEFAULT_SYSTEM_PROMPT,
};
use launchkit_core::types::DbId;
use launchkit_db::models::generated_file::CreateGeneratedFile;
use launchkit_db::models::project::Project;
use launchkit_textgen::{TextGenError, TextGenerator};

use super::progress::ProgressLog;
use super::store::GenerationStore;

// ---------------------------------------------------------------------------
// Requests and errors
// ---------------------------------------------------------------------------

/// What a spawned job should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    /// Regenerate the whole document set.
    Full { project_id: DbId },
    /// Regenerate one named file.
    Single { project_id: DbId, filename: String },
}

impl GenerationRequest {
    pub fn project_id(&self) -> DbId {
        match self {
            GenerationRequest::Full { project_id } | GenerationRequest::Single { project_id, .. } => {
                *project_id
            }
        }
    }
}

/// Terminal failures of a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Project {0} not found")]
    MissingProject(DbId),

    #[error("Text-generation API key not configured")]
    MissingApiKey,

    #[error("Text-generation request failed: {0}")]
    Upstream(#[from] TextGenError),

    #[error("Failed to parse JSON response: {reason}")]
    ResponseParse { reason: ParseError, snippet: String },

    #[error("File {0} not found in response")]
    FileNotFoundInResponse(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl GenerationError {
    /// Stable label for log fields and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::MissingProject(_) => "missing-project",
            GenerationError::MissingApiKey => "missing-api-key",
            GenerationError::Upstream(_) => "upstream-failure",
            GenerationError::ResponseParse { .. } => "response-parse-failure",
            GenerationError::FileNotFoundInResponse(_) => "file-not-found-in-response",
            GenerationError::Persistence(_) => "persistence-failure",
        }
    }

    /// Full description stored in the error log and failure artifact. Parse
    /// failures carry the start of the raw response.
    pub fn detail(&self) -> String {
        match self {
            GenerationError::ResponseParse { snippet, .. } => format!(
                "{self}\n\nResponse (first {RESPONSE_SNIPPET_CHARS} chars):\n{snippet}"
            ),
            _ => self.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One generation run over a project.
pub struct GenerationJob {
    store: Arc<dyn GenerationStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    error_logged: AtomicBool,
}

impl GenerationJob {
    pub fn new(store: Arc<dyn GenerationStore>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            store,
            generator,
            error_logged: AtomicBool::new(false),
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<usize, GenerationError> {
        match request {
            GenerationRequest::Full { project_id } => self.run_full(*project_id).await,
            GenerationRequest::Single {
                project_id,
                filename,
            } => self.run_single(*project_id, filename).await,
        }
    }

    /// Regenerate the project's entire document set. Returns the number of
    /// files created.
    pub async fn run_full(&self, project_id: DbId) -> Result<usize, GenerationError> {
        let project = self.load_project(project_id).await?;
        let progress = ProgressLog::new(Arc::clone(&self.store), project_id);

        match self.full_steps(&project, &progress).await {
            Ok(created) => Ok(created),
            Err(err) => {
                self.record_full_failure(project_id, &progress, &err).await;
                Err(err)
            }
        }
    }

    /// Regenerate one file, leaving the project's other files untouched.
    pub async fn run_single(
        &self,
        project_id: DbId,
        filename: &str,
    ) -> Result<usize, GenerationError> {
        let project = self.load_project(project_id).await?;
        let progress = ProgressLog::new(Arc::clone(&self.store), project_id);

        match self.single_steps(&project, filename, &progress).await {
            Ok(()) => Ok(1),
            Err(err) => {
                self.record_single_failure(project_id, filename, &progress, &err)
                    .await;
                Err(err)
            }
        }
    }

    /// Whether the terminal error entry of the last failed run was stored.
    pub fn error_logged(&self) -> bool {
        self.error_logged.load(Ordering::Acquire)
    }

    /// One attempt to record a failure the run could not log itself.
    pub async fn report_unlogged_failure(&self, project_id: DbId, err: &GenerationError) {
        let message = format!("Error: {}", err.detail());
        if let Err(e) = self
            .store
            .append_log(project_id, LogType::Error, &message)
            .await
        {
            tracing::error!(project_id, error = %e, "Could not record generation failure");
        }
    }

    // -- steps --------------------------------------------------------------

    async fn full_steps(
        &self,
        project: &Project,
        progress: &ProgressLog,
    ) -> Result<usize, GenerationError> {
        let project_id = project.id;

        self.start_run(project_id, "Starting file generation...").await?;
        let removed = self.store.delete_files(project_id).await?;
        progress
            .info(&format!("Cleared {removed} previous file(s)"))
            .await;
        progress
            .info(&format!("Loaded project: {}", project.name))
            .await;

        let generator = self.generator()?;
        let system = self.system_prompt(project, progress).await?;
        let user = build_user_prompt(&brief(project));
        let raw = call_generator(generator.as_ref(), &system, &user, progress).await?;

        let files = parse_response(&raw)?;
        let total = files.len();
        progress
            .success(&format!("Parsed response. Found {total} file(s)"))
            .await;
        if total == 0 {
            progress
                .warning("Response listed no files; nothing to create")
                .await;
        }

        for (idx, spec) in files.iter().enumerate() {
            let filename = spec.filename();
            progress
                .info(&format!("Creating file {}/{total}: {filename}", idx + 1))
                .await;
            self.store
                .insert_file(&CreateGeneratedFile {
                    project_id,
                    filename: filename.to_string(),
                    content: spec.content.clone(),
                    file_type: spec.file_type_or(DEFAULT_FILE_TYPE).to_string(),
                    status: FileStatus::Completed,
                })
                .await?;
            progress.success(&format!("File created: {filename}")).await;
        }

        progress
            .success(&format!(
                "File generation completed. Generated {total} file(s)"
            ))
            .await;
        tracing::info!(project_id, files = total, "Full generation run completed");
        Ok(total)
    }

    async fn single_steps(
        &self,
        project: &Project,
        filename: &str,
        progress: &ProgressLog,
    ) -> Result<(), GenerationError> {
        let project_id = project.id;

        self.start_run(project_id, &format!("Starting regeneration of {filename}..."))
            .await?;
        if self.store.delete_file_named(project_id, filename).await? > 0 {
            progress
                .info(&format!("Removed previous version of {filename}"))
                .await;
        }

        let generator = self.generator()?;
        let system = self.system_prompt(project, progress).await?;
        let user = build_single_file_prompt(&brief(project), filename);
        let raw = call_generator(generator.as_ref(), &system, &user, progress).await?;

        let files = parse_response(&raw)?;
        let spec = files
            .iter()
            .find(|f| f.filename.as_deref() == Some(filename))
            .ok_or_else(|| GenerationError::FileNotFoundInResponse(filename.to_string()))?;

        self.store
            .insert_file(&CreateGeneratedFile {
                project_id,
                filename: filename.to_string(),
                content: spec.content.clone(),
                file_type: spec.file_type_or(file_type_for_filename(filename)).to_string(),
                status: FileStatus::Completed,
            })
            .await?;

        progress
            .success(&format!("File regenerated: {filename}"))
            .await;
        tracing::info!(project_id, filename, "Single-file generation run completed");
        Ok(())
    }

    // -- helpers ------------------------------------------------------------

    async fn load_project(&self, project_id: DbId) -> Result<Project, GenerationError> {
        self.store
            .load_project(project_id)
            .await?
            .ok_or(GenerationError::MissingProject(project_id))
    }

    /// Write the start marker, then drop every older entry so the trail
    /// narrates this run only.
    async fn start_run(&self, project_id: DbId, message: &str) -> Result<(), GenerationError> {
        let marker = self
            .store
            .append_log(project_id, LogType::Info, message)
            .await?;
        let cleared = self.store.clear_logs_before(project_id, marker).await?;
        tracing::debug!(project_id, cleared, "Cleared previous log entries");
        Ok(())
    }

    fn generator(&self) -> Result<&Arc<dyn TextGenerator>, GenerationError> {
        self.generator.as_ref().ok_or(GenerationError::MissingApiKey)
    }

    async fn system_prompt(
        &self,
        project: &Project,
        progress: &ProgressLog,
    ) -> Result<String, GenerationError> {
        let Some(competition_id) = project.competition_id else {
            progress
                .info("No competition selected, using default prompt")
                .await;
            return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
        };

        let Some(competition) = self.store.load_competition(competition_id).await? else {
            progress
                .warning(&format!(
                    "Competition {competition_id} not found, using default prompt"
                ))
                .await;
            return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
        };

        progress
            .success(&format!("Found competition: {}", competition.name))
            .await;
        let prompt = resolve_system_prompt(competition.file_generation_prompt.as_deref());
        if prompt == DEFAULT_SYSTEM_PROMPT {
            progress
                .warning("Competition has no custom prompt, using default prompt")
                .await;
        } else {
            progress.success("Using competition-specific prompt").await;
        }
        Ok(prompt.to_string())
    }

    async fn record_full_failure(
        &self,
        project_id: DbId,
        progress: &ProgressLog,
        err: &GenerationError,
    ) {
        if matches!(err, GenerationError::ResponseParse { .. }) {
            progress
                .warning("The response may not be in the expected format")
                .await;
        }

        let placeholder = CreateGeneratedFile {
            project_id,
            filename: ERROR_FILENAME.to_string(),
            content: format!("Error generating files: {}", err.detail()),
            file_type: DEFAULT_FILE_TYPE.to_string(),
            status: FileStatus::Failed,
        };
        if let Err(e) = self.store.insert_file(&placeholder).await {
            tracing::warn!(project_id, error = %e, "Failed to store error placeholder file");
        }

        self.log_terminal_error(progress, err).await;
    }

    async fn record_single_failure(
        &self,
        project_id: DbId,
        filename: &str,
        progress: &ProgressLog,
        err: &GenerationError,
    ) {
        // Any row of this name would read as the file's current state.
        if let Err(e) = self.store.delete_file_named(project_id, filename).await {
            tracing::warn!(project_id, filename, error = %e, "Failed to remove stale file");
        }

        let placeholder = CreateGeneratedFile {
            project_id,
            filename: filename.to_string(),
            content: format!("Error regenerating {filename}: {}", err.detail()),
            file_type: file_type_for_filename(filename).to_string(),
            status: FileStatus::Failed,
        };
        if let Err(e) = self.store.insert_file(&placeholder).await {
            tracing::warn!(project_id, filename, error = %e, "Failed to store failed file");
        }

        self.log_terminal_error(progress, err).await;
    }

    async fn log_terminal_error(&self, progress: &ProgressLog, err: &GenerationError) {
        let logged = progress.error(&format!("Error: {}", err.detail())).await;
        self.error_logged.store(logged, Ordering::Release);
    }
}

async fn call_generator(
    generator: &dyn TextGenerator,
    system: &str,
    user: &str,
    progress: &ProgressLog,
) -> Result<String, GenerationError> {
    progress
        .info(&format!(
            "Sending request to text-generation service (model {})...",
            generator.model_name()
        ))
        .await;
    let raw = generator.complete(system, user).await?;
    progress
        .success(&format!(
            "Received response ({} chars). Parsing...",
            raw.chars().count()
        ))
        .await;
    Ok(raw)
}

fn parse_response(raw: &str) -> Result<Vec<FileSpec>, GenerationError> {
    let parse_failure = |reason| GenerationError::ResponseParse {
        reason,
        snippet: truncate_chars(raw, RESPONSE_SNIPPET_CHARS).to_string(),
    };
    let payload = extract_json(raw).map_err(parse_failure)?;
    parse_files_payload(&payload).map_err(parse_failure)
}

fn brief(project: &Project) -> ProjectBrief<'_> {
    ProjectBrief {
        name: &project.name,
        description: project.description.as_deref(),
        idea_description: &project.idea_description,
    }
}
