//! Asynchronous document generation.
//!
//! A trigger handler takes the project's [`ProjectLockGuard`], builds a
//! [`GenerationJob`] over a [`GenerationStore`], and hands both to
//! [`spawn_generation`]. The job narrates its progress into the project's
//! log trail and leaves the project's files reflecting only its own run.

pub mod job;
pub mod locks;
pub mod progress;
pub mod runner;
pub mod store;

pub use job::{GenerationError, GenerationJob, GenerationRequest};
pub use locks::{ProjectLockGuard, ProjectLocks};
pub use runner::spawn_generation;
pub use store::{GenerationStore, PgGenerationStore};
