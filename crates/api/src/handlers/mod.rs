pub mod auth;
pub mod competition;
pub mod file;
pub mod generation;
pub mod project;
