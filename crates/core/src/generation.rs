//! Status vocabularies and naming helpers for generated documents.
//!
//! File and log rows store their status / type as lowercase text; the enums
//! here are the only place those strings are spelled out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Filename of the placeholder artifact written when a full run fails.
pub const ERROR_FILENAME: &str = "error.txt";
/// Filename used when a response entry omits `filename`.
pub const UNKNOWN_FILENAME: &str = "unknown.txt";
/// File type used when neither the response nor the filename supplies one.
pub const DEFAULT_FILE_TYPE: &str = "txt";
/// Maximum number of characters of a raw response quoted in error output.
pub const RESPONSE_SNIPPET_CHARS: usize = 500;

// ---------------------------------------------------------------------------
// File status
// ---------------------------------------------------------------------------

/// Lifecycle of a generated file.
///
/// `Pending` and `Generating` are reserved: the current job writes every row
/// directly as `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Generating => "generating",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FileStatus::Pending),
            "generating" => Ok(FileStatus::Generating),
            "completed" => Ok(FileStatus::Completed),
            "failed" => Ok(FileStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid file status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Log type
// ---------------------------------------------------------------------------

/// Severity tag of a generation log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Info,
    Success,
    Warning,
    Error,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Info => "info",
            LogType::Success => "success",
            LogType::Warning => "warning",
            LogType::Error => "error",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(LogType::Info),
            "success" => Ok(LogType::Success),
            "warning" => Ok(LogType::Warning),
            "error" => Ok(LogType::Error),
            other => Err(CoreError::Validation(format!("Invalid log type '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Naming helpers
// ---------------------------------------------------------------------------

/// Derive the file type tag from a filename's last extension.
///
/// `"plan.md"` -> `"md"`, `"archive.tar.gz"` -> `"gz"`, `"README"` -> `"txt"`.
pub fn file_type_for_filename(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => DEFAULT_FILE_TYPE,
    }
}

/// MIME type served for a stored file type.
pub fn content_type_for(file_type: &str) -> &'static str {
    match file_type {
        "txt" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

/// Validate a filename requested for single-file regeneration.
///
/// Rejects empty names and anything that could escape an archive root.
pub fn validate_filename(filename: &str) -> Result<(), CoreError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Filename must not be empty".into()));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
        return Err(CoreError::Validation(format!(
            "Invalid filename '{filename}'"
        )));
    }
    Ok(())
}

/// Truncate `s` to at most `max_chars` characters without splitting a
/// UTF-8 code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
