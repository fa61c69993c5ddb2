//! File system scanner for dustpan.
//!
//! Walks a directory in parallel with jwalk and produces the flat
//! [`RecordSet`] the analyzers consume:
//!
//! - **Parallel traversal** via jwalk/rayon
//! - **Progress updates** via broadcast channels
//! - **Directory entry counts** for the empty-directory rule
//! - **Configurable** depth limit, ignore globs and hidden-file handling
//!
//! # Example
//!
//! ```rust,no_run
//! use dustpan_scan::{JwalkScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let output = JwalkScanner::new().scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", output.records.stats.total_size);
//! println!("Total files: {}", output.records.stats.total_files);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use dustpan_scan::JwalkScanner;
//!
//! let scanner = JwalkScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Scanned {} files", progress.files_scanned);
//!     }
//! });
//! ```

mod progress;
mod scanner;

pub use progress::ScanProgress;
pub use scanner::{JwalkScanner, ScanOutput};

// Re-export core types for convenience
pub use dustpan_core::{FileRecord, RecordSet, ScanConfig, ScanError, ScanWarning};
