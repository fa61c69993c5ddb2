//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use dustpan_core::FileRecord;

/// Progress snapshot broadcast during a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Number of file records emitted so far.
    pub files_scanned: u64,
    /// Number of directory records emitted so far.
    pub dirs_scanned: u64,
    /// Total file bytes seen so far.
    pub bytes_scanned: u64,
    /// Most recently visited path.
    pub current_path: PathBuf,
    /// Number of warnings so far.
    pub warnings: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files_scanned as f64 / secs
        } else {
            0.0
        }
    }

    /// Records emitted (files + dirs).
    pub fn total_items(&self) -> u64 {
        self.files_scanned + self.dirs_scanned
    }
}

/// Running counters owned by one scan.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    current: ScanProgress,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            current: ScanProgress::default(),
        }
    }

    pub fn record(&mut self, record: &FileRecord) {
        if record.is_dir() {
            self.current.dirs_scanned += 1;
        } else {
            self.current.files_scanned += 1;
            self.current.bytes_scanned += record.size_bytes;
        }
    }

    pub fn record_warning(&mut self) {
        self.current.warnings += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self, current_path: PathBuf) -> ScanProgress {
        ScanProgress {
            current_path,
            elapsed: self.start_time.elapsed(),
            ..self.current.clone()
        }
    }
}
