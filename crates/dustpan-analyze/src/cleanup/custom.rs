//! Caller-supplied categorization rules.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dustpan_core::FileRecord;

use super::category::{CleanupCategory, SafetyLevel};

/// One user-defined rule: a glob and the classification it assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRule {
    /// Rule name, shown in the candidate's reason.
    pub name: String,
    /// Glob matched against the full path and the file name.
    pub pattern: String,
    /// Category assigned on match.
    #[serde(default = "default_category")]
    pub category: CleanupCategory,
    /// Safety assigned on match.
    #[serde(default = "default_safety")]
    pub safety: SafetyLevel,
    /// Optional reason text; defaults to the rule name.
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_category() -> CleanupCategory {
    CleanupCategory::Other
}

fn default_safety() -> SafetyLevel {
    SafetyLevel::UserDecision
}

/// A custom rule pattern failed to compile.
#[derive(Debug, Error)]
#[error("Invalid pattern {pattern:?} in custom rule {rule:?}: {source}")]
pub struct CustomRuleError {
    pub rule: String,
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

/// Immutable, compiled table of custom rules.
#[derive(Debug, Clone)]
pub struct CustomRules {
    rules: Vec<CustomRule>,
    set: GlobSet,
}

impl CustomRules {
    /// A table with no rules.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    /// Compile a list of rules.
    pub fn new(rules: Vec<CustomRule>) -> Result<Self, CustomRuleError> {
        let mut builder = GlobSetBuilder::new();
        for rule in &rules {
            let glob = Glob::new(&rule.pattern).map_err(|source| CustomRuleError {
                rule: rule.name.clone(),
                pattern: rule.pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| CustomRuleError {
            rule: String::new(),
            pattern: String::new(),
            source,
        })?;
        Ok(Self { rules, set })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules matching `record`, in table order.
    pub fn matches<'a>(&'a self, record: &FileRecord) -> impl Iterator<Item = &'a CustomRule> {
        let mut hits = self.set.matches(&record.path);
        hits.extend(self.set.matches(record.file_name.as_str()));
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(move |idx| &self.rules[idx])
    }
}

impl Default for CustomRules {
    fn default() -> Self {
        Self::empty()
    }
}
