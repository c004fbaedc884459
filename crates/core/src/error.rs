//! Core error types for roomsync.
//!
//! All errors are explicit and typed; nothing in this crate panics.

use std::path::PathBuf;

use thiserror::Error;

/// The standard Result type for roomsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type, mostly produced while loading the mapping.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("mapping is missing the '{column}' column")]
    MissingColumn { column: String },

    #[error("invalid mapping record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("group '{group}' is mapped more than once (line {line})")]
    DuplicateGroup { group: String, line: u64 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(line: u64, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create a duplicate group error.
    pub fn duplicate_group(group: impl Into<String>, line: u64) -> Self {
        Self::DuplicateGroup {
            group: group.into(),
            line,
        }
    }
}
