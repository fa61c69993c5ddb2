//! Analysis algorithms for dustpan.
//!
//! This crate turns a scanned [`RecordSet`] into two result sets:
//!
//! - **Duplicate detection** - exact duplicates by BLAKE3 content hash and
//!   near-duplicates by normalized file-name similarity
//! - **Cleanup classification** - eight detection rules plus user rules,
//!   aggregated to one prioritized candidate per path
//!
//! # Duplicate Detection
//!
//! 1. Group non-empty files by size (instant)
//! 2. Hash every member of a multi-file size bucket with BLAKE3 (parallel)
//! 3. Compare names of the remaining files within each extension
//!
//! ```rust,no_run
//! use dustpan_analyze::DuplicateFinder;
//! use dustpan_scan::{JwalkScanner, ScanConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let output = JwalkScanner::new().scan(&ScanConfig::new("/path/to/scan"))?;
//! let report = DuplicateFinder::new().find_duplicates(&output.records);
//!
//! println!("Found {} exact groups", report.exact_group_count);
//! println!("Wasted space: {} bytes", report.total_wasted_space);
//! # Ok(())
//! # }
//! ```
//!
//! # Cleanup Classification
//!
//! ```rust,no_run
//! use dustpan_analyze::{CleanupClassifier, DuplicateFinder, SafetyLevel};
//! use dustpan_scan::{JwalkScanner, ScanConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let records = JwalkScanner::new().scan(&ScanConfig::new("/path/to/scan"))?.records;
//! let report = DuplicateFinder::new().find_duplicates(&records);
//!
//! let cleanup = CleanupClassifier::new().classify(&records, &report.groups);
//! for candidate in cleanup.at_least(SafetyLevel::LikelySafe) {
//!     println!("{} ({})", candidate.path.display(), candidate.reason);
//! }
//! # Ok(())
//! # }
//! ```

pub mod age;
pub mod cleanup;
mod duplicates;
pub mod hasher;
pub mod ranking;
pub mod similarity;

pub use age::{days, format_age, is_older_than};
pub use cleanup::{
    CandidateStats, CategoryProfile, CleanupCandidate, CleanupCategory, CleanupClassifier,
    CleanupConfig, CleanupConfigBuilder, CleanupReport, CleanupSummary, CustomRule,
    CustomRuleError, CustomRules, SafetyLevel,
};
pub use duplicates::{
    DEFAULT_SIMILARITY_THRESHOLD, DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder,
    DuplicateGroup, DuplicateKind, DuplicateReport, SimilarGrouping,
};
pub use hasher::{Blake3Hasher, ContentHasher};
pub use similarity::name_similarity;

// Re-export core types
pub use dustpan_core::{ContentHash, FileRecord, RecordSet, SkippedRecord};

/// Find exact and similar duplicates among `records` with default settings.
///
/// Records with an empty or repeated path are reported in `skipped`.
pub fn find_duplicates(records: Vec<FileRecord>) -> DuplicateReport {
    let records = RecordSet::new(records);
    let mut report = DuplicateFinder::new().find_duplicates(&records);
    report.skipped.splice(0..0, records.skipped);
    report
}

/// Classify `records` into cleanup candidates with default settings,
/// running duplicate detection first.
pub fn find_cleanup_candidates(records: Vec<FileRecord>) -> CleanupReport {
    let records = RecordSet::new(records);
    let duplicates = DuplicateFinder::new().find_duplicates(&records);
    let mut report = CleanupClassifier::new().classify(&records, &duplicates.groups);
    report.skipped.extend(duplicates.skipped);
    report
}
