//! # Error Module
//!
//! Error types for the photo archiver.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Per-file errors stay local** - a file that cannot be read is recorded
//!   in the plan with an error status; only a failure to enumerate the input
//!   sets at all aborts the run
//! - **Include context** - paths, file names, what went wrong

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum ArchiverError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Plan construction error: {0}")]
    Plan(#[from] PlanError),

    #[error("Evaluation log error: {0}")]
    Export(#[from] ExportError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while enumerating media files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while reading file content for hashing or
/// fingerprinting
///
/// All variants mean the same thing to the engine: the file is excluded from
/// duplicate grouping and its record gets an error status.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

impl HashError {
    /// The file the failure applies to
    pub fn path(&self) -> &PathBuf {
        match self {
            HashError::Unreadable { path, .. } => path,
            HashError::Decode { path, .. } => path,
        }
    }
}

/// Errors raised while composing the evaluation plan
#[derive(Error, Debug)]
pub enum PlanError {
    /// Internal invariant violation: the deterministic tie-break rules could
    /// not pick a single survivor. Surfaced rather than guessed.
    #[error("Ambiguous survivor in duplicate group containing {path}")]
    AmbiguousSurvivor { path: PathBuf },

    #[error("No input files to evaluate")]
    EmptyInput,
}

/// Errors that occur while writing or reading the evaluation log
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write evaluation log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read evaluation log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed evaluation log row {line} in {path}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Errors that occur during the processing stage
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Evaluation log not found at {path}. Run evaluation first.")]
    LogNotFound { path: PathBuf },

    #[error("Failed to create destination folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {source_path} to {target}: {source}")]
    Copy {
        source_path: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion of {source_path} failed: {reason}")]
    Convert { source_path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, ArchiverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/raw"),
        };
        assert!(error.to_string().contains("/photos/raw"));
    }

    #[test]
    fn hash_error_exposes_path() {
        let error = HashError::Decode {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        assert_eq!(error.path(), &PathBuf::from("/photos/broken.jpg"));
        assert!(error.to_string().contains("invalid JPEG"));
    }

    #[test]
    fn process_error_suggests_evaluation() {
        let error = ProcessError::LogNotFound {
            path: PathBuf::from("evaluation_log.csv"),
        };
        assert!(error.to_string().contains("Run evaluation first"));
    }
}
