//! Cleanup candidate classification.
//!
//! Every record is run through the eight built-in rules and the custom
//! rule table; members of duplicate groups that are not the recommended
//! keeper are added as duplicate candidates. The raw matches are then
//! aggregated to one candidate per path (see [`aggregate`]).
//!
//! ```rust,ignore
//! use dustpan_analyze::{CleanupClassifier, DuplicateFinder};
//!
//! let duplicates = DuplicateFinder::new().find_duplicates(&records);
//! let report = CleanupClassifier::new().classify(&records, &duplicates.groups);
//!
//! for candidate in &report.candidates {
//!     println!("{} {} {}", candidate.category, candidate.safety_level, candidate.path.display());
//! }
//! ```

mod aggregate;
mod candidate;
mod category;
mod custom;
mod rules;

use std::time::{Duration, SystemTime};

use derive_builder::Builder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use dustpan_core::{FileRecord, RecordSet, SkippedRecord};

use crate::age::days;
use crate::duplicates::DuplicateGroup;

pub use aggregate::{CandidateStats, CleanupSummary, aggregate, display_order};
pub use candidate::CleanupCandidate;
pub use category::{CategoryProfile, CleanupCategory, SafetyLevel};
pub use custom::{CustomRule, CustomRuleError, CustomRules};
pub use rules::{
    detect_backup, detect_cache, detect_duplicates, detect_empty, detect_large_unused, detect_log,
    detect_old_installer, detect_temp,
};

const MIB: u64 = 1024 * 1024;

/// Configuration for the cleanup rules.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct CleanupConfig {
    /// Instant ages are measured against.
    #[builder(default = "SystemTime::now()")]
    #[serde(skip, default = "SystemTime::now")]
    pub reference_time: SystemTime,

    /// Minimum size for the large-unused rule.
    #[builder(default = "100 * MIB")]
    pub large_file_size: u64,

    /// Minimum age for the large-unused rule.
    #[builder(default = "days(90)")]
    #[serde(with = "as_days")]
    pub large_file_age: Duration,

    /// Minimum age for the old-installer rule.
    #[builder(default = "days(30)")]
    #[serde(with = "as_days")]
    pub installer_age: Duration,

    /// Log files at or above this size are LIKELY_SAFE rather than CAUTION.
    #[builder(default = "50 * MIB")]
    pub large_log_size: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            reference_time: SystemTime::now(),
            large_file_size: 100 * MIB,
            large_file_age: days(90),
            installer_age: days(30),
            large_log_size: 50 * MIB,
        }
    }
}

impl CleanupConfig {
    /// Create a new config builder.
    pub fn builder() -> CleanupConfigBuilder {
        CleanupConfigBuilder::default()
    }
}

/// Durations stored as whole days in settings files.
mod as_days {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::age::{DAY, days};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs() / DAY.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(days)
    }
}

/// Results from cleanup classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// One candidate per path, in display order.
    pub candidates: Vec<CleanupCandidate>,

    /// Totals over `candidates`.
    pub summary: CleanupSummary,

    /// Records excluded before classification.
    pub skipped: Vec<SkippedRecord>,
}

impl CleanupReport {
    /// Check if anything was classified.
    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// Candidates at or safer than `level`.
    pub fn at_least(&self, level: SafetyLevel) -> impl Iterator<Item = &CleanupCandidate> {
        self.candidates
            .iter()
            .filter(move |c| c.safety_level.priority() <= level.priority())
    }
}

/// Cleanup candidate classifier.
#[derive(Debug, Clone, Default)]
pub struct CleanupClassifier {
    config: CleanupConfig,
    custom_rules: CustomRules,
}

impl CleanupClassifier {
    /// Create a classifier with default config and no custom rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom config.
    pub fn with_config(config: CleanupConfig) -> Self {
        Self {
            config,
            custom_rules: CustomRules::empty(),
        }
    }

    /// Add a custom rule table.
    pub fn with_custom_rules(mut self, rules: CustomRules) -> Self {
        self.custom_rules = rules;
        self
    }

    /// Get the active configuration.
    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Classify every record, folding in the given duplicate groups.
    pub fn classify(&self, records: &RecordSet, duplicate_groups: &[DuplicateGroup]) -> CleanupReport {
        let mut raw: Vec<CleanupCandidate> = records
            .records
            .par_iter()
            .flat_map_iter(|record| self.raw_candidates(record))
            .collect();
        raw.extend(detect_duplicates(duplicate_groups));

        let raw_count = raw.len();
        let candidates = aggregate(raw);
        let summary = CleanupSummary::from_candidates(&candidates);

        debug!(
            records = records.len(),
            raw = raw_count,
            candidates = candidates.len(),
            reclaimable = summary.reclaimable_safe_size,
            "cleanup classification finished"
        );

        CleanupReport {
            candidates,
            summary,
            skipped: records.skipped.clone(),
        }
    }

    /// Every rule match for one record, in rule order.
    fn raw_candidates(&self, record: &FileRecord) -> Vec<CleanupCandidate> {
        let config = &self.config;
        let mut out: Vec<CleanupCandidate> = [
            detect_temp(record),
            detect_empty(record),
            detect_cache(record),
            detect_log(record, config),
            detect_backup(record),
            detect_old_installer(record, config),
            detect_large_unused(record, config),
        ]
        .into_iter()
        .flatten()
        .collect();

        out.extend(self.custom_rules.matches(record).map(|rule| {
            let reason = rule
                .reason
                .clone()
                .unwrap_or_else(|| format!("matched rule {:?}", rule.name));
            CleanupCandidate::new(record, rule.category, rule.safety, reason)
        }));
        out
    }
}
