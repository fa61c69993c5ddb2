//! Validated record container and statistics.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnalysisError, SkippedRecord};
use crate::record::{FileRecord, SavedRecord};

/// Summary statistics for a record set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStats {
    /// Total size of all files in bytes.
    pub total_size: u64,
    /// Number of file records.
    pub total_files: u64,
    /// Number of directory records.
    pub total_dirs: u64,
    /// Largest file (path, size).
    pub largest_file: Option<(PathBuf, u64)>,
    /// Oldest file (path, time).
    pub oldest_file: Option<(PathBuf, SystemTime)>,
    /// Newest file (path, time).
    pub newest_file: Option<(PathBuf, SystemTime)>,
}

impl RecordStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with one record.
    pub fn record(&mut self, record: &FileRecord) {
        if record.is_dir() {
            self.total_dirs += 1;
            return;
        }

        self.total_files += 1;
        self.total_size += record.size_bytes;

        let size = record.size_bytes;
        if self.largest_file.as_ref().is_none_or(|(_, s)| size > *s) {
            self.largest_file = Some((record.path.clone(), size));
        }

        if let Some(modified) = record.modified_at {
            if self.oldest_file.as_ref().is_none_or(|(_, t)| modified < *t) {
                self.oldest_file = Some((record.path.clone(), modified));
            }
            if self.newest_file.as_ref().is_none_or(|(_, t)| modified > *t) {
                self.newest_file = Some((record.path.clone(), modified));
            }
        }
    }
}

/// A saved scan as read from disk, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedRecords {
    #[serde(default)]
    pub records: Vec<SavedRecord>,
    #[serde(default)]
    pub skipped: Vec<SkippedRecord>,
}

/// Records accepted for analysis, in canonical path order.
///
/// Building a set drops records with empty paths and repeated paths. Each
/// drop is kept in `skipped` so callers can surface it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    /// Accepted records, sorted by path.
    pub records: Vec<FileRecord>,

    /// Records rejected during validation.
    pub skipped: Vec<SkippedRecord>,

    /// Summary statistics over `records`.
    pub stats: RecordStats,
}

impl RecordSet {
    /// Validate and sort a batch of records.
    pub fn new(records: impl IntoIterator<Item = FileRecord>) -> Self {
        let mut accepted: Vec<FileRecord> = Vec::new();
        let mut skipped = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for record in records {
            if record.path.as_os_str().is_empty() {
                skipped.extend(AnalysisError::invalid_input("", "empty path").to_skipped());
                continue;
            }
            if !seen.insert(record.path.clone()) {
                warn!(path = %record.path.display(), "dropping repeated record path");
                skipped.extend(
                    AnalysisError::invalid_input(&record.path, "repeated path").to_skipped(),
                );
                continue;
            }
            accepted.push(record);
        }

        accepted.sort_by(|a, b| a.path.cmp(&b.path));

        let mut stats = RecordStats::new();
        for record in &accepted {
            stats.record(record);
        }

        Self {
            records: accepted,
            skipped,
            stats,
        }
    }

    /// Validate a saved scan. Invalid entries become skip entries.
    pub fn from_saved(saved: SavedRecords) -> Self {
        let mut rejected = saved.skipped;
        let records: Vec<FileRecord> = saved
            .records
            .into_iter()
            .filter_map(|raw| match raw.into_record() {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "dropping invalid saved record");
                    rejected.extend(err.to_skipped());
                    None
                }
            })
            .collect();
        Self::new(records).with_skipped(rejected)
    }

    /// Append records rejected elsewhere (e.g. by the scanner).
    pub fn with_skipped(mut self, skipped: impl IntoIterator<Item = SkippedRecord>) -> Self {
        self.skipped.extend(skipped);
        self
    }

    /// Number of accepted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records were accepted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over accepted file records only.
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.is_file())
    }
}
