//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod competition_repo;
pub mod generated_file_repo;
pub mod generation_log_repo;
pub mod project_repo;
pub mod user_repo;

pub use competition_repo::CompetitionRepo;
pub use generated_file_repo::GeneratedFileRepo;
pub use generation_log_repo::GenerationLogRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
