pub mod competition;
pub mod generated_file;
pub mod generation_log;
pub mod project;
pub mod user;
