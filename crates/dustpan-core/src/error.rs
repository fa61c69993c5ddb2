//! Error types for scanning and analysis.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while analyzing records.
///
/// None of these abort a run. Callers turn them into [`SkippedRecord`]s or
/// treat the affected rule as not matching.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// File could not be opened or read for hashing.
    #[error("Unreadable file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule needed a field the record does not carry.
    #[error("Missing {field} for {path}")]
    MissingMetadata { path: PathBuf, field: &'static str },

    /// Record rejected before analysis.
    #[error("Invalid record {path}: {message}")]
    InvalidInput { path: PathBuf, message: String },

    /// The run was cancelled.
    #[error("Analysis interrupted")]
    Interrupted,
}

impl AnalysisError {
    /// Create an unreadable-file error with path context.
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convert into a skip-list entry, if this error excludes a record.
    pub fn to_skipped(&self) -> Option<SkippedRecord> {
        match self {
            Self::Unreadable { path, source } => Some(SkippedRecord::new(
                path.clone(),
                SkipReason::Unreadable,
                source.to_string(),
            )),
            Self::InvalidInput { path, message } => Some(SkippedRecord::new(
                path.clone(),
                SkipReason::InvalidInput,
                message.clone(),
            )),
            Self::MissingMetadata { .. } | Self::Interrupted => None,
        }
    }
}

/// Why a record was left out of an analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Content could not be read for hashing.
    Unreadable,
    /// Record failed validation.
    InvalidInput,
}

/// A record excluded from analysis, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Path of the excluded record.
    pub path: PathBuf,
    /// Category of the problem.
    pub reason: SkipReason,
    /// Human-readable detail.
    pub message: String,
}

impl SkippedRecord {
    /// Create a new skip entry.
    pub fn new(path: impl Into<PathBuf>, reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason,
            message: message.into(),
        }
    }
}

/// Errors that abort a directory scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Non-fatal problem with a single entry during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
    }

    #[test]
    fn test_unreadable_becomes_skip_entry() {
        let err = AnalysisError::unreadable(
            "/test/file.bin",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let skipped = err.to_skipped().unwrap();
        assert_eq!(skipped.reason, SkipReason::Unreadable);
        assert_eq!(skipped.path, PathBuf::from("/test/file.bin"));
        assert!(skipped.message.contains("denied"));
    }

    #[test]
    fn test_missing_metadata_is_not_a_skip() {
        let err = AnalysisError::MissingMetadata {
            path: PathBuf::from("/x"),
            field: "modified_at",
        };
        assert!(err.to_skipped().is_none());
        assert!(err.to_string().contains("modified_at"));
    }
}
