//! Generation job behaviour against an in-memory store and a scripted text
//! generator. No database or network required.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use launchkit_api::engine::{
    spawn_generation, GenerationError, GenerationJob, GenerationRequest, GenerationStore,
    ProjectLocks,
};
use launchkit_core::generation::{FileStatus, LogType, ERROR_FILENAME};
use launchkit_core::prompt::DEFAULT_SYSTEM_PROMPT;
use launchkit_core::types::DbId;
use launchkit_db::models::competition::Competition;
use launchkit_db::models::generated_file::CreateGeneratedFile;
use launchkit_db::models::project::Project;
use launchkit_textgen::{TextGenError, TextGenerator};

const PROJECT_ID: DbId = 7;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredFile {
    filename: String,
    content: String,
    file_type: String,
    status: FileStatus,
}

#[derive(Debug, Clone)]
struct StoredLog {
    id: DbId,
    log_type: LogType,
    message: String,
}

#[derive(Default)]
struct MemoryState {
    projects: Vec<Project>,
    competitions: Vec<Competition>,
    files: Vec<StoredFile>,
    logs: Vec<StoredLog>,
    next_log_id: DbId,
    fail_log_writes: bool,
    fail_next_error_log: bool,
    fail_file_inserts: bool,
}

#[derive(Default)]
struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    fn with_project(competition_id: Option<DbId>) -> Arc<Self> {
        let store = Self::default();
        store.state.lock().unwrap().projects.push(project(competition_id));
        Arc::new(store)
    }

    fn add_competition(&self, id: DbId, prompt: Option<&str>) {
        self.state.lock().unwrap().competitions.push(Competition {
            id,
            name: "Hult Prize".to_string(),
            description: None,
            advice_prompt: None,
            file_generation_prompt: prompt.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    fn seed_file(&self, filename: &str, content: &str) {
        self.state.lock().unwrap().files.push(StoredFile {
            filename: filename.to_string(),
            content: content.to_string(),
            file_type: "md".to_string(),
            status: FileStatus::Completed,
        });
    }

    fn files(&self) -> Vec<StoredFile> {
        self.state.lock().unwrap().files.clone()
    }

    fn logs(&self) -> Vec<StoredLog> {
        self.state.lock().unwrap().logs.clone()
    }

    fn fail_file_inserts(&self) {
        self.state.lock().unwrap().fail_file_inserts = true;
    }

    fn fail_log_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_log_writes = fail;
    }

    /// Reject the next error-level entry only.
    fn fail_next_error_log(&self) {
        self.state.lock().unwrap().fail_next_error_log = true;
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn load_project(&self, project_id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn load_competition(
        &self,
        competition_id: DbId,
    ) -> Result<Option<Competition>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .competitions
            .iter()
            .find(|c| c.id == competition_id)
            .cloned())
    }

    async fn append_log(
        &self,
        _project_id: DbId,
        log_type: LogType,
        message: &str,
    ) -> Result<DbId, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_log_writes {
            return Err(sqlx::Error::PoolClosed);
        }
        if log_type == LogType::Error && state.fail_next_error_log {
            state.fail_next_error_log = false;
            return Err(sqlx::Error::PoolClosed);
        }
        state.next_log_id += 1;
        let id = state.next_log_id;
        state.logs.push(StoredLog {
            id,
            log_type,
            message: message.to_string(),
        });
        Ok(id)
    }

    async fn clear_logs_before(
        &self,
        _project_id: DbId,
        marker_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let before = state.logs.len();
        state.logs.retain(|l| l.id >= marker_id);
        Ok((before - state.logs.len()) as u64)
    }

    async fn delete_files(&self, _project_id: DbId) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let removed = state.files.len() as u64;
        state.files.clear();
        Ok(removed)
    }

    async fn delete_file_named(
        &self,
        _project_id: DbId,
        filename: &str,
    ) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let before = state.files.len();
        state.files.retain(|f| f.filename != filename);
        Ok((before - state.files.len()) as u64)
    }

    async fn insert_file(&self, file: &CreateGeneratedFile) -> Result<DbId, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_file_inserts {
            return Err(sqlx::Error::PoolClosed);
        }
        state.files.push(StoredFile {
            filename: file.filename.clone(),
            content: file.content.clone(),
            file_type: file.file_type.clone(),
            status: file.status,
        });
        Ok(state.files.len() as DbId)
    }
}

fn project(competition_id: Option<DbId>) -> Project {
    Project {
        id: PROJECT_ID,
        owner_id: 1,
        name: "SolarMesh".to_string(),
        description: Some("Community solar microgrids".to_string()),
        idea_description: "Peer-to-peer energy trading for villages".to_string(),
        competition_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Scripted generator
// ---------------------------------------------------------------------------

/// Returns queued responses in order and records the prompts it was given.
struct ScriptedGenerator {
    responses: Mutex<Vec<Result<String, TextGenError>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String, TextGenError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn replying(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(text.to_string())])
    }

    fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TextGenError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(TextGenError::Malformed("no scripted response".into()));
        }
        responses.remove(0)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn job(store: &Arc<MemoryStore>, generator: Option<Arc<ScriptedGenerator>>) -> GenerationJob {
    GenerationJob::new(
        Arc::clone(store) as Arc<dyn GenerationStore>,
        generator.map(|g| g as Arc<dyn TextGenerator>),
    )
}

fn files_json(names: &[&str]) -> String {
    let files: Vec<_> = names
        .iter()
        .map(|n| serde_json::json!({ "filename": n, "content": format!("# {n}"), "file_type": "md" }))
        .collect();
    serde_json::json!({ "files": files }).to_string()
}

fn terminal_entries(logs: &[StoredLog]) -> usize {
    logs.iter()
        .filter(|l| {
            l.log_type == LogType::Error
                || (l.log_type == LogType::Success
                    && (l.message.starts_with("File generation completed")
                        || l.message.starts_with("File regenerated")))
        })
        .count()
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fenced_response_produces_completed_file() {
    let store = MemoryStore::with_project(None);
    let raw = "Here you go:\n```json\n{\"files\":[{\"filename\":\"a.md\",\"content\":\"# A\",\"file_type\":\"md\"}]}\n```";
    let generator = ScriptedGenerator::replying(raw);

    let created = job(&store, Some(generator)).run_full(PROJECT_ID).await.unwrap();
    assert_eq!(created, 1);

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "a.md");
    assert_eq!(files[0].content, "# A");
    assert_eq!(files[0].file_type, "md");
    assert_eq!(files[0].status, FileStatus::Completed);

    let logs = store.logs();
    assert!(logs[0].message.starts_with("Starting file generation"));
    let last = logs.last().unwrap();
    assert_eq!(last.log_type, LogType::Success);
    assert!(last.message.contains("Generated 1 file(s)"));
    assert_eq!(terminal_entries(&logs), 1);
}

#[tokio::test]
async fn unparseable_response_leaves_failed_error_file() {
    let store = MemoryStore::with_project(None);
    store.seed_file("old.md", "stale");
    let generator = ScriptedGenerator::replying("not json at all");

    let err = job(&store, Some(generator)).run_full(PROJECT_ID).await.unwrap_err();
    assert_matches!(err, GenerationError::ResponseParse { .. });

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, ERROR_FILENAME);
    assert_eq!(files[0].status, FileStatus::Failed);
    assert!(files[0].content.starts_with("Error generating files:"));
    assert!(files[0].content.contains("not json at all"));

    let logs = store.logs();
    let last = logs.last().unwrap();
    assert_eq!(last.log_type, LogType::Error);
    assert!(last.message.starts_with("Error: Failed to parse JSON response"));
    assert!(logs
        .iter()
        .any(|l| l.log_type == LogType::Warning && l.message.contains("expected format")));
    assert_eq!(terminal_entries(&logs), 1);
}

#[tokio::test]
async fn second_run_replaces_files_and_log_trail() {
    let store = MemoryStore::with_project(None);
    let generator = ScriptedGenerator::new(vec![
        Ok(files_json(&["a.md", "b.md"])),
        Ok(files_json(&["c.md"])),
    ]);
    let job = job(&store, Some(generator));

    job.run_full(PROJECT_ID).await.unwrap();
    job.run_full(PROJECT_ID).await.unwrap();

    let names: Vec<_> = store.files().into_iter().map(|f| f.filename).collect();
    assert_eq!(names, ["c.md"]);

    let logs = store.logs();
    assert!(logs[0].message.starts_with("Starting file generation"));
    assert_eq!(
        logs.iter()
            .filter(|l| l.message.starts_with("Starting file generation"))
            .count(),
        1
    );
    assert!(!logs.iter().any(|l| l.message.contains("a.md")));
    assert_eq!(terminal_entries(&logs), 1);
}

#[tokio::test]
async fn empty_file_list_succeeds_with_warning() {
    let store = MemoryStore::with_project(None);
    let generator = ScriptedGenerator::replying("{\"files\": []}");

    let created = job(&store, Some(generator)).run_full(PROJECT_ID).await.unwrap();
    assert_eq!(created, 0);
    assert!(store.files().is_empty());

    let logs = store.logs();
    assert!(logs.iter().any(|l| l.log_type == LogType::Warning));
    assert_eq!(logs.last().unwrap().log_type, LogType::Success);
}

#[tokio::test]
async fn upstream_failure_is_recorded() {
    let store = MemoryStore::with_project(None);
    let generator = ScriptedGenerator::new(vec![Err(TextGenError::Status {
        status: 503,
        body: "overloaded".to_string(),
    })]);

    let err = job(&store, Some(generator)).run_full(PROJECT_ID).await.unwrap_err();
    assert_eq!(err.kind(), "upstream-failure");

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, ERROR_FILENAME);
    let last = store.logs().last().cloned().unwrap();
    assert_eq!(last.log_type, LogType::Error);
    assert!(last.message.contains("overloaded"));
}

#[tokio::test]
async fn missing_api_key_fails_without_calling_out() {
    let store = MemoryStore::with_project(None);
    store.seed_file("old.md", "stale");

    let err = job(&store, None).run_full(PROJECT_ID).await.unwrap_err();
    assert_matches!(err, GenerationError::MissingApiKey);

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, ERROR_FILENAME);
    assert_eq!(files[0].status, FileStatus::Failed);
    let last = store.logs().last().cloned().unwrap();
    assert_eq!(last.log_type, LogType::Error);
    assert!(last.message.contains("API key not configured"));
}

#[tokio::test]
async fn missing_project_writes_nothing() {
    let store = Arc::new(MemoryStore::default());
    let generator = ScriptedGenerator::replying(&files_json(&["a.md"]));

    let err = job(&store, Some(Arc::clone(&generator)))
        .run_full(PROJECT_ID)
        .await
        .unwrap_err();
    assert_matches!(err, GenerationError::MissingProject(PROJECT_ID));
    assert!(store.files().is_empty());
    assert!(store.logs().is_empty());
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn competition_prompt_replaces_default() {
    let store = MemoryStore::with_project(Some(3));
    store.add_competition(3, Some("Write for the Hult Prize judges."));
    let generator = ScriptedGenerator::replying(&files_json(&["a.md"]));

    job(&store, Some(Arc::clone(&generator)))
        .run_full(PROJECT_ID)
        .await
        .unwrap();

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].0, "Write for the Hult Prize judges.");
    assert!(prompts[0].1.contains("SolarMesh"));
    assert!(prompts[0].1.contains("Peer-to-peer energy trading"));
}

#[tokio::test]
async fn blank_or_missing_competition_uses_default_prompt() {
    for competition in [Some(Some("   ")), None] {
        let store = MemoryStore::with_project(Some(3));
        if let Some(prompt) = competition {
            store.add_competition(3, prompt);
        }
        let generator = ScriptedGenerator::replying(&files_json(&["a.md"]));

        job(&store, Some(Arc::clone(&generator)))
            .run_full(PROJECT_ID)
            .await
            .unwrap();

        assert_eq!(generator.prompts()[0].0, DEFAULT_SYSTEM_PROMPT);
        assert!(store
            .logs()
            .iter()
            .any(|l| l.log_type == LogType::Warning && l.message.contains("default prompt")));
    }
}

// ---------------------------------------------------------------------------
// Single-file runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_run_replaces_only_the_named_file() {
    let store = MemoryStore::with_project(None);
    store.seed_file("a.md", "old a");
    store.seed_file("b.md", "old b");
    let generator = ScriptedGenerator::replying(
        &serde_json::json!({ "files": [{ "filename": "b.md", "content": "new b" }] }).to_string(),
    );

    job(&store, Some(Arc::clone(&generator)))
        .run_single(PROJECT_ID, "b.md")
        .await
        .unwrap();

    let files = store.files();
    assert_eq!(files.len(), 2);
    let a = files.iter().find(|f| f.filename == "a.md").unwrap();
    assert_eq!(a.content, "old a");
    let b = files.iter().find(|f| f.filename == "b.md").unwrap();
    assert_eq!(b.content, "new b");
    assert_eq!(b.file_type, "md");
    assert_eq!(b.status, FileStatus::Completed);

    assert!(generator.prompts()[0].1.contains("b.md"));
    let last = store.logs().last().cloned().unwrap();
    assert_eq!(last.log_type, LogType::Success);
    assert_eq!(last.message, "File regenerated: b.md");
}

#[tokio::test]
async fn single_run_without_requested_file_leaves_failed_placeholder() {
    let store = MemoryStore::with_project(None);
    store.seed_file("b.md", "old b");
    let generator = ScriptedGenerator::replying(&files_json(&["other.md"]));

    let err = job(&store, Some(generator))
        .run_single(PROJECT_ID, "b.md")
        .await
        .unwrap_err();
    assert_matches!(err, GenerationError::FileNotFoundInResponse(ref name) if name == "b.md");

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "b.md");
    assert_eq!(files[0].status, FileStatus::Failed);
    assert!(files[0].content.starts_with("Error regenerating b.md:"));
    assert!(!files.iter().any(|f| f.filename == "other.md"));

    let logs = store.logs();
    assert_eq!(logs.last().unwrap().log_type, LogType::Error);
    assert_eq!(terminal_entries(&logs), 1);
}

#[tokio::test]
async fn entry_without_filename_does_not_match_fallback_name() {
    let store = MemoryStore::with_project(None);
    let generator = ScriptedGenerator::replying(
        &serde_json::json!({ "files": [{ "content": "anonymous" }] }).to_string(),
    );

    let err = job(&store, Some(generator))
        .run_single(PROJECT_ID, "unknown.txt")
        .await
        .unwrap_err();
    assert_matches!(err, GenerationError::FileNotFoundInResponse(ref name) if name == "unknown.txt");

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].status, FileStatus::Failed);
    assert!(!files[0].content.contains("anonymous"));
}

// ---------------------------------------------------------------------------
// Persistence failures and spawning
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insert_failure_is_persistence_error_with_log() {
    let store = MemoryStore::with_project(None);
    store.fail_file_inserts();
    let generator = ScriptedGenerator::replying(&files_json(&["a.md"]));

    let job = job(&store, Some(generator));
    let err = job.run_full(PROJECT_ID).await.unwrap_err();
    assert_matches!(err, GenerationError::Persistence(_));
    assert!(job.error_logged());

    assert!(store.files().is_empty());
    assert_eq!(store.logs().last().unwrap().log_type, LogType::Error);
}

#[tokio::test]
async fn unlogged_failure_gets_one_more_attempt() {
    let store = MemoryStore::with_project(None);
    store.fail_log_writes(true);
    let job = job(&store, None);

    let err = job.run_full(PROJECT_ID).await.unwrap_err();
    assert_matches!(err, GenerationError::Persistence(_));
    assert!(!job.error_logged());

    store.fail_log_writes(false);
    job.report_unlogged_failure(PROJECT_ID, &err).await;

    let logs = store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_type, LogType::Error);
    assert!(logs[0].message.starts_with("Error: Database error"));
}

#[tokio::test]
async fn spawned_job_releases_project_lock() {
    let store = MemoryStore::with_project(None);
    let generator = ScriptedGenerator::replying(&files_json(&["a.md"]));
    let locks = Arc::new(ProjectLocks::new());

    let guard = locks.try_acquire(PROJECT_ID).unwrap();
    assert!(locks.try_acquire(PROJECT_ID).is_none());

    let handle = spawn_generation(
        job(&store, Some(generator)),
        GenerationRequest::Full {
            project_id: PROJECT_ID,
        },
        guard,
    );
    handle.await.unwrap();

    assert!(!locks.is_busy(PROJECT_ID));
    assert_eq!(store.files().len(), 1);
}

#[tokio::test]
async fn spawned_job_retries_a_dropped_error_entry() {
    let store = MemoryStore::with_project(None);
    store.fail_next_error_log();
    let generator = ScriptedGenerator::replying("not json at all");
    let locks = Arc::new(ProjectLocks::new());

    let handle = spawn_generation(
        job(&store, Some(generator)),
        GenerationRequest::Full {
            project_id: PROJECT_ID,
        },
        locks.try_acquire(PROJECT_ID).unwrap(),
    );
    handle.await.unwrap();

    let logs = store.logs();
    let last = logs.last().unwrap();
    assert_eq!(last.log_type, LogType::Error);
    assert!(last.message.starts_with("Error: Failed to parse JSON response"));
    assert_eq!(
        logs.iter().filter(|l| l.log_type == LogType::Error).count(),
        1
    );
}

#[tokio::test]
async fn spawned_job_for_missing_project_writes_no_entry() {
    let store = Arc::new(MemoryStore::default());
    let locks = Arc::new(ProjectLocks::new());

    let handle = spawn_generation(
        job(&store, None),
        GenerationRequest::Full {
            project_id: PROJECT_ID,
        },
        locks.try_acquire(PROJECT_ID).unwrap(),
    );
    handle.await.unwrap();

    assert!(store.logs().is_empty());
    assert!(!locks.is_busy(PROJECT_ID));
}
