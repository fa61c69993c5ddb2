//! Cleanup categories, safety levels and the confidence table.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// How much human judgment a deletion needs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    Safe,
    LikelySafe,
    Caution,
    UserDecision,
}

impl SafetyLevel {
    /// Sort priority; lower means more clearly safe.
    pub fn priority(self) -> u8 {
        match self {
            Self::Safe => 1,
            Self::LikelySafe => 2,
            Self::Caution => 3,
            Self::UserDecision => 4,
        }
    }

    /// Adjust a category's base confidence for this safety level.
    pub fn adjust(self, base: f64) -> f64 {
        match self {
            Self::Safe => (base + 0.1).min(1.0),
            Self::LikelySafe => base,
            Self::Caution => (base - 0.2).max(0.1),
            Self::UserDecision => (base - 0.3).max(0.1),
        }
    }
}

/// What kind of clutter a candidate is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CleanupCategory {
    TempFiles,
    CacheFiles,
    EmptyFiles,
    DuplicateFiles,
    LogFiles,
    BackupFiles,
    OldInstallers,
    LargeUnused,
    Other,
}

/// Static data attached to each category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProfile {
    /// Sort priority in the final list (1 first).
    pub priority: u8,
    /// Confidence before safety adjustment.
    pub base_confidence: f64,
    /// Safety used when a rule has no more specific evidence.
    pub default_safety: SafetyLevel,
    /// Display label.
    pub label: &'static str,
}

const fn profile(
    priority: u8,
    base_confidence: f64,
    default_safety: SafetyLevel,
    label: &'static str,
) -> CategoryProfile {
    CategoryProfile {
        priority,
        base_confidence,
        default_safety,
        label,
    }
}

impl CleanupCategory {
    /// Lookup-table entry for this category.
    pub const fn profile(self) -> CategoryProfile {
        use SafetyLevel::*;
        match self {
            Self::TempFiles => profile(1, 0.9, Safe, "Temporary files"),
            Self::CacheFiles => profile(2, 0.8, Safe, "Cache files"),
            Self::EmptyFiles => profile(3, 0.9, Safe, "Empty files and folders"),
            Self::DuplicateFiles => profile(4, 0.7, LikelySafe, "Duplicate files"),
            Self::LogFiles => profile(5, 0.7, Caution, "Log files"),
            Self::BackupFiles => profile(6, 0.5, Caution, "Backup files"),
            Self::OldInstallers => profile(7, 0.6, UserDecision, "Old installers"),
            Self::LargeUnused => profile(8, 0.4, UserDecision, "Large unused files"),
            Self::Other => profile(9, 0.3, UserDecision, "Other"),
        }
    }

    /// Sort priority; lower comes first.
    pub fn priority(self) -> u8 {
        self.profile().priority
    }

    /// Confidence for a candidate of this category at `safety`.
    pub fn confidence(self, safety: SafetyLevel) -> f64 {
        safety.adjust(self.profile().base_confidence)
    }

    /// All categories in priority order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}
