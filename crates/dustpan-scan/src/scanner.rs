//! JWalk-based parallel directory scanner.

use std::fs::Metadata;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use dustpan_core::{
    FileRecord, RecordSet, ScanConfig, ScanError, ScanWarning, SkipReason, SkippedRecord,
};

use crate::progress::{ProgressTracker, ScanProgress};

/// Broadcast a progress snapshot every this many records.
const PROGRESS_INTERVAL: u64 = 1000;

/// Records and diagnostics from one scan.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Files and directories found, sorted by path.
    pub records: RecordSet,
    /// Non-fatal problems encountered while walking.
    pub warnings: Vec<ScanWarning>,
    /// Wall-clock scan time.
    pub duration: Duration,
}

/// High-performance scanner using jwalk for parallel traversal.
pub struct JwalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan `config.root` and emit one record per file and directory below it.
    ///
    /// The root itself is not emitted. Directories at the depth limit are
    /// left out because their contents were not listed.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutput, ScanError> {
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let ignore = Arc::new(config.ignore_matcher()?);
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };
        let max_depth = config.max_depth.map(|d| d as usize);

        let walker = WalkDir::new(&root_path)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .sort(true)
            .min_depth(1)
            .max_depth(max_depth.unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                // Pruning here keeps jwalk from descending into ignored dirs.
                children.retain(|child| {
                    child
                        .as_ref()
                        .map_or(true, |entry| !ignore.is_match(entry.file_name()))
                });
            });

        let mut tracker = ProgressTracker::new();
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        let mut warnings = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "walk error");
                    warnings.push(ScanWarning::new(path, err.to_string()));
                    tracker.record_warning();
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_dir() {
                continue;
            }
            if file_type.is_dir() && max_depth.is_some_and(|max| entry.depth() >= max) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "metadata unavailable");
                    if file_type.is_file() {
                        skipped.push(SkippedRecord::new(
                            &path,
                            SkipReason::Unreadable,
                            err.to_string(),
                        ));
                    }
                    warnings.push(ScanWarning::new(&path, err.to_string()));
                    tracker.record_warning();
                    continue;
                }
            };

            let record = if file_type.is_dir() {
                match std::fs::read_dir(&path) {
                    Ok(listing) => {
                        FileRecord::directory(&path, listing.count() as u64, modified(&metadata))
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "directory unreadable");
                        warnings.push(ScanWarning::new(&path, err.to_string()));
                        tracker.record_warning();
                        continue;
                    }
                }
            } else {
                FileRecord::file(&path, metadata.len(), modified(&metadata))
            };

            tracker.record(&record);
            records.push(record);

            if records.len() as u64 % PROGRESS_INTERVAL == 0 {
                let _ = self.progress_tx.send(tracker.snapshot(path));
            }
        }

        let duration = tracker.elapsed();
        let _ = self.progress_tx.send(tracker.snapshot(root_path.clone()));
        debug!(
            root = %root_path.display(),
            records = records.len(),
            skipped = skipped.len(),
            warnings = warnings.len(),
            ?duration,
            "scan finished"
        );

        Ok(ScanOutput {
            records: RecordSet::new(records).with_skipped(skipped),
            warnings,
            duration,
        })
    }
}

impl Default for JwalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn modified(metadata: &Metadata) -> Option<std::time::SystemTime> {
    metadata.modified().ok()
}
