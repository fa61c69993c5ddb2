use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use dustpan_core::FileRecord;

use super::category::{CleanupCategory, SafetyLevel};

/// A path proposed for deletion, with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupCandidate {
    /// Path of the file or directory.
    pub path: PathBuf,

    /// Assigned category.
    pub category: CleanupCategory,

    /// Assigned safety level.
    pub safety_level: SafetyLevel,

    /// Human-readable explanation of the match.
    pub reason: String,

    /// Confidence in [0.1, 1.0], derived from category and safety.
    pub confidence: f64,

    /// Size in bytes (0 for directories).
    pub size_bytes: u64,

    /// Whether the candidate is a directory.
    #[serde(default)]
    pub is_dir: bool,
}

impl CleanupCandidate {
    /// Classify `record` as `category` at `safety_level`.
    pub fn new(
        record: &FileRecord,
        category: CleanupCategory,
        safety_level: SafetyLevel,
        reason: String,
    ) -> Self {
        Self {
            path: record.path.clone(),
            category,
            safety_level,
            reason,
            confidence: category.confidence(safety_level),
            size_bytes: record.size_bytes,
            is_dir: record.is_dir(),
        }
    }
}
