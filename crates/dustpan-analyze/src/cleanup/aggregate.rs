//! Merging raw rule output into one candidate per path, plus totals.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::candidate::CleanupCandidate;
use super::category::{CleanupCategory, SafetyLevel};

/// Count and size of a slice of the candidate list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub count: u64,
    pub total_size: u64,
}

impl CandidateStats {
    fn add(&mut self, candidate: &CleanupCandidate) {
        self.count += 1;
        self.total_size += candidate.size_bytes;
    }
}

/// Totals over an aggregated candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupSummary {
    /// Number of candidates.
    pub total_count: u64,

    /// Sum of candidate sizes.
    pub total_size: u64,

    /// Per category, in category priority order.
    pub by_category: BTreeMap<CleanupCategory, CandidateStats>,

    /// Per safety level, most clearly safe first.
    pub by_safety: BTreeMap<SafetyLevel, CandidateStats>,

    /// Bytes held by SAFE and LIKELY_SAFE candidates.
    pub reclaimable_safe_size: u64,
}

impl CleanupSummary {
    /// Compute totals for `candidates`.
    pub fn from_candidates(candidates: &[CleanupCandidate]) -> Self {
        let mut summary = Self::default();
        for candidate in candidates {
            summary.total_count += 1;
            summary.total_size += candidate.size_bytes;
            summary
                .by_category
                .entry(candidate.category)
                .or_default()
                .add(candidate);
            summary
                .by_safety
                .entry(candidate.safety_level)
                .or_default()
                .add(candidate);
            if candidate.safety_level.priority() <= SafetyLevel::LikelySafe.priority() {
                summary.reclaimable_safe_size += candidate.size_bytes;
            }
        }
        summary
    }

    /// Stats for one category (zero if absent).
    pub fn category(&self, category: CleanupCategory) -> CandidateStats {
        self.by_category.get(&category).copied().unwrap_or_default()
    }

    /// Stats for one safety level (zero if absent).
    pub fn safety(&self, safety: SafetyLevel) -> CandidateStats {
        self.by_safety.get(&safety).copied().unwrap_or_default()
    }
}

/// Which of two candidates for the same path survives.
///
/// `Less` means `a` wins: safer level, then earlier category, then higher
/// confidence. Exact ties keep the earlier candidate.
fn preference(a: &CleanupCandidate, b: &CleanupCandidate) -> Ordering {
    a.safety_level
        .priority()
        .cmp(&b.safety_level.priority())
        .then_with(|| a.category.priority().cmp(&b.category.priority()))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}

/// Final list order: category, then safety, then size descending, then path.
pub fn display_order(a: &CleanupCandidate, b: &CleanupCandidate) -> Ordering {
    a.category
        .priority()
        .cmp(&b.category.priority())
        .then_with(|| a.safety_level.priority().cmp(&b.safety_level.priority()))
        .then_with(|| b.size_bytes.cmp(&a.size_bytes))
        .then_with(|| a.path.cmp(&b.path))
}

/// Reduce raw rule output to exactly one candidate per path, sorted for
/// display.
///
/// Applying this to its own output returns the same list.
pub fn aggregate(raw: Vec<CleanupCandidate>) -> Vec<CleanupCandidate> {
    let mut merged: Vec<CleanupCandidate> = raw
        .into_iter()
        .enumerate()
        .sorted_by(|(ia, a), (ib, b)| {
            a.path
                .cmp(&b.path)
                .then_with(|| preference(a, b))
                .then_with(|| ia.cmp(ib))
        })
        .map(|(_, candidate)| candidate)
        .coalesce(|kept, next| {
            if kept.path == next.path {
                Ok(kept)
            } else {
                Err((kept, next))
            }
        })
        .collect();

    merged.sort_by(display_order);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use dustpan_core::FileRecord;

    fn candidate(
        path: &str,
        size: u64,
        category: CleanupCategory,
        safety: SafetyLevel,
    ) -> CleanupCandidate {
        let record = FileRecord::file(path, size, None);
        CleanupCandidate::new(&record, category, safety, format!("{category}"))
    }

    #[test]
    fn test_safest_classification_wins() {
        let raw = vec![
            candidate("/a.bak", 10, CleanupCategory::BackupFiles, SafetyLevel::Caution),
            candidate("/a.bak", 10, CleanupCategory::TempFiles, SafetyLevel::Safe),
        ];
        let merged = aggregate(raw);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].category, CleanupCategory::TempFiles);
        assert_eq!(merged[0].safety_level, SafetyLevel::Safe);
    }

    #[test]
    fn test_equal_safety_prefers_earlier_category() {
        let raw = vec![
            candidate("/p.tmp", 0, CleanupCategory::EmptyFiles, SafetyLevel::Safe),
            candidate("/p.tmp", 0, CleanupCategory::TempFiles, SafetyLevel::Safe),
        ];
        let merged = aggregate(raw);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].category, CleanupCategory::TempFiles);
    }

    #[test]
    fn test_display_order() {
        let raw = vec![
            candidate("/big.mkv", 500, CleanupCategory::LargeUnused, SafetyLevel::UserDecision),
            candidate("/small.tmp", 1, CleanupCategory::TempFiles, SafetyLevel::Safe),
            candidate("/large.tmp", 9, CleanupCategory::TempFiles, SafetyLevel::Safe),
            candidate("/x~", 50, CleanupCategory::TempFiles, SafetyLevel::LikelySafe),
        ];
        let paths: Vec<_> = aggregate(raw)
            .into_iter()
            .map(|c| c.path.display().to_string())
            .collect();
        assert_eq!(paths, vec!["/large.tmp", "/small.tmp", "/x~", "/big.mkv"]);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let raw = vec![
            candidate("/c", 3, CleanupCategory::LogFiles, SafetyLevel::Caution),
            candidate("/a", 3, CleanupCategory::BackupFiles, SafetyLevel::Caution),
            candidate("/a", 3, CleanupCategory::DuplicateFiles, SafetyLevel::LikelySafe),
            candidate("/b", 7, CleanupCategory::CacheFiles, SafetyLevel::Safe),
        ];
        let once = aggregate(raw);
        let twice = aggregate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_summary_totals() {
        let merged = aggregate(vec![
            candidate("/a.tmp", 10, CleanupCategory::TempFiles, SafetyLevel::Safe),
            candidate("/b.tmp", 5, CleanupCategory::TempFiles, SafetyLevel::Safe),
            candidate("/c.log", 7, CleanupCategory::LogFiles, SafetyLevel::Caution),
        ]);
        let summary = CleanupSummary::from_candidates(&merged);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.total_size, 22);
        assert_eq!(summary.reclaimable_safe_size, 15);
        assert_eq!(
            summary.category(CleanupCategory::TempFiles),
            CandidateStats { count: 2, total_size: 15 }
        );
        assert_eq!(summary.safety(SafetyLevel::Caution).count, 1);
        assert_eq!(summary.category(CleanupCategory::Other).count, 0);
    }
}
