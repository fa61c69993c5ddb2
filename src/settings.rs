//! User settings loaded from a TOML file.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dustpan_analyze::{CleanupConfig, CustomRule, CustomRules, DuplicateConfig};
use dustpan_core::ScanConfig;

/// Scanner options that make sense to persist (the root comes from the
/// command line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub follow_symlinks: bool,
    pub include_hidden: bool,
    pub max_depth: Option<u32>,
    pub ignore_patterns: Vec<String>,
    pub threads: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            ignore_patterns: Vec::new(),
            threads: 0,
        }
    }
}

/// Everything read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanSettings,
    pub duplicates: DuplicateConfig,
    pub cleanup: CleanupConfig,
    pub custom_rules: Vec<CustomRule>,
}

impl Settings {
    /// Default settings file location.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dustpan").join("config.toml"))
    }

    /// Load settings from `explicit`, or from the default location.
    ///
    /// An explicit file must exist and parse. A missing default file yields
    /// defaults; a malformed one is reported and ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        let Some(path) = Self::config_path().filter(|p| p.is_file()) else {
            return Ok(Self::default());
        };
        match Self::read(&path) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .wrap_err_with(|| format!("Invalid settings file {}", path.display()))?;
        debug!(
            path = %path.display(),
            custom_rules = settings.custom_rules.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Scanner config for `root`.
    pub fn scan_config(&self, root: &Path) -> ScanConfig {
        ScanConfig {
            root: root.to_path_buf(),
            follow_symlinks: self.scan.follow_symlinks,
            max_depth: self.scan.max_depth,
            ignore_patterns: self.scan.ignore_patterns.clone(),
            threads: self.scan.threads,
            include_hidden: self.scan.include_hidden,
        }
    }

    /// Compile the custom rule table.
    pub fn custom_rules(&self) -> Result<CustomRules> {
        CustomRules::new(self.custom_rules.clone()).wrap_err("Invalid custom rule")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dustpan_analyze::{CleanupCategory, SafetyLevel, SimilarGrouping, days};
    use tempfile::TempDir;

    #[test]
    fn test_load_full_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[scan]
include_hidden = false
ignore_patterns = ["node_modules", ".git"]

[duplicates]
similarity_threshold = 0.8
similar_grouping = "connected"

[cleanup]
installer_age = 14
large_file_size = 1048576

[[custom_rules]]
name = "disk images"
pattern = "*.iso"
category = "LARGE_UNUSED"
safety = "CAUTION"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(!settings.scan.include_hidden);
        assert_eq!(settings.scan.ignore_patterns.len(), 2);
        assert_eq!(settings.duplicates.similarity_threshold, 0.8);
        assert_eq!(settings.duplicates.similar_grouping, SimilarGrouping::Connected);
        assert!(settings.duplicates.detect_similar);
        assert_eq!(settings.cleanup.installer_age, days(14));
        assert_eq!(settings.cleanup.large_file_age, days(90));
        assert_eq!(settings.cleanup.large_file_size, 1048576);

        assert_eq!(settings.custom_rules.len(), 1);
        let rule = &settings.custom_rules[0];
        assert_eq!(rule.category, CleanupCategory::LargeUnused);
        assert_eq!(rule.safety, SafetyLevel::Caution);
        assert_eq!(settings.custom_rules().unwrap().len(), 1);

        let scan = settings.scan_config(Path::new("/data"));
        assert_eq!(scan.root, PathBuf::from("/data"));
        assert!(!scan.include_hidden);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp = TempDir::new().unwrap();
        assert!(Settings::load(Some(&temp.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_malformed_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "[duplicates\nsimilarity_threshold = ").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_bad_custom_pattern_is_reported() {
        let settings = Settings {
            custom_rules: vec![CustomRule {
                name: "broken".into(),
                pattern: "[".into(),
                category: CleanupCategory::Other,
                safety: SafetyLevel::UserDecision,
                reason: None,
            }],
            ..Settings::default()
        };
        assert!(settings.custom_rules().is_err());
    }
}
