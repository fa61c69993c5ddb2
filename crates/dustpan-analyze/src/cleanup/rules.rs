//! The built-in detection rules.
//!
//! Every rule is a pure function of one record (or, for duplicates, the
//! duplicate groups) and the classifier config. A rule that lacks the data
//! it needs simply does not match.

use std::path::{Component, Path};

use chrono::NaiveDate;

use dustpan_core::{FileRecord, RecordKind};

use super::CleanupConfig;
use super::candidate::CleanupCandidate;
use super::category::{CleanupCategory, SafetyLevel};
use crate::age::is_older_than;
use crate::duplicates::{DuplicateGroup, DuplicateKind};

const TEMP_EXTENSIONS: &[&str] = &[
    "tmp", "temp", "bak", "old", "swp", "swo", "crdownload", "part", "partial", "dmp", "chk",
];

const TEMP_FILE_NAMES: &[&str] = &[
    "thumbs.db",
    "ehthumbs.db",
    "desktop.ini",
    ".ds_store",
    ".localized",
    "npm-debug.log",
];

const TEMP_DIR_SEGMENTS: &[&str] = &["temp", "tmp", ".tmp", "temporary internet files"];

const LOG_EXTENSIONS: &[&str] = &["log", "txt"];
const LOG_HINTS: &[&str] = &["log", "error", "debug", "trace"];
/// Words containing "log" that do not name a log.
const LOG_FALSE_FRIENDS: &[&str] = &[
    "catalog", "dialog", "changelog", "blog", "analog", "prologue", "epilogue", "login", "logo",
    "logic", "biology", "technology", "apology",
];

const INSTALLER_EXTENSIONS: &[&str] = &[
    "exe", "msi", "msix", "appx", "dmg", "pkg", "deb", "rpm", "appimage", "apk",
];
const INSTALLER_HINTS: &[&str] = &["setup", "install"];

const BACKUP_EXTENSIONS: &[&str] = &["bak", "bkp", "orig"];
const BACKUP_MARKERS: &[&str] = &["backup", "copy", "복사본", "백업"];

/// Rule 1: temporary files.
pub fn detect_temp(record: &FileRecord) -> Option<CleanupCandidate> {
    if !record.is_file() {
        return None;
    }
    let name = record.lower_name();
    let category = CleanupCategory::TempFiles;

    if TEMP_EXTENSIONS.contains(&record.extension.as_str()) {
        let reason = format!("temporary file extension .{}", record.extension);
        return Some(CleanupCandidate::new(record, category, SafetyLevel::Safe, reason));
    }
    if TEMP_FILE_NAMES.contains(&name.as_str()) {
        let reason = "system-generated temporary file".to_string();
        return Some(CleanupCandidate::new(record, category, SafetyLevel::Safe, reason));
    }
    if let Some(segment) = directory_segment(&record.original_location, |s| {
        TEMP_DIR_SEGMENTS.contains(&s)
    }) {
        let reason = format!("inside temporary directory {segment:?}");
        return Some(CleanupCandidate::new(record, category, SafetyLevel::Safe, reason));
    }
    if name.starts_with("~$") || name.ends_with('~') || name.contains("temp") {
        let reason = "file name looks temporary".to_string();
        return Some(CleanupCandidate::new(record, category, SafetyLevel::LikelySafe, reason));
    }
    None
}

/// Rule 2: empty files and directories.
pub fn detect_empty(record: &FileRecord) -> Option<CleanupCandidate> {
    let category = CleanupCategory::EmptyFiles;
    match record.kind {
        RecordKind::File if record.size_bytes == 0 => Some(CleanupCandidate::new(
            record,
            category,
            SafetyLevel::Safe,
            "empty file".to_string(),
        )),
        RecordKind::Directory { entry_count: 0 } => Some(CleanupCandidate::new(
            record,
            category,
            SafetyLevel::LikelySafe,
            "empty directory".to_string(),
        )),
        _ => None,
    }
}

/// Rule 3: every non-kept member of every duplicate group.
pub fn detect_duplicates(groups: &[DuplicateGroup]) -> Vec<CleanupCandidate> {
    let mut candidates = Vec::new();
    for group in groups {
        let keep = group.recommended_keep.path.display();
        for member in &group.recommended_delete {
            let (safety, reason) = match group.kind {
                DuplicateKind::Exact => (
                    SafetyLevel::LikelySafe,
                    format!("identical content to {keep}"),
                ),
                DuplicateKind::Similar => (
                    SafetyLevel::Caution,
                    format!(
                        "name {:.0}% similar to {keep}, content not compared",
                        group.similarity * 100.0
                    ),
                ),
            };
            candidates.push(CleanupCandidate::new(
                member,
                CleanupCategory::DuplicateFiles,
                safety,
                reason,
            ));
        }
    }
    candidates
}

/// Rule 4: cache files.
pub fn detect_cache(record: &FileRecord) -> Option<CleanupCandidate> {
    if !record.is_file() {
        return None;
    }
    let category = CleanupCategory::CacheFiles;

    if let Some(segment) = directory_segment(&record.original_location, |s| s.contains("cache")) {
        let reason = format!("inside cache directory {segment:?}");
        return Some(CleanupCandidate::new(record, category, SafetyLevel::Safe, reason));
    }
    if record.lower_name().contains("cache") {
        let reason = "file name looks like a cache".to_string();
        return Some(CleanupCandidate::new(record, category, SafetyLevel::LikelySafe, reason));
    }
    None
}

/// Rule 5: log files.
pub fn detect_log(record: &FileRecord, config: &CleanupConfig) -> Option<CleanupCandidate> {
    if !record.is_file() || !LOG_EXTENSIONS.contains(&record.extension.as_str()) {
        return None;
    }

    let mut name = record.lower_name();
    for word in LOG_FALSE_FRIENDS {
        name = name.replace(word, " ");
    }
    let hinted = LOG_HINTS.iter().any(|h| name.contains(h));
    if !hinted && !contains_date(&name) {
        return None;
    }

    let safety = if record.size_bytes >= config.large_log_size {
        SafetyLevel::LikelySafe
    } else {
        SafetyLevel::Caution
    };
    Some(CleanupCandidate::new(
        record,
        CleanupCategory::LogFiles,
        safety,
        "log output".to_string(),
    ))
}

/// Rule 6: installers older than the installer age.
pub fn detect_old_installer(
    record: &FileRecord,
    config: &CleanupConfig,
) -> Option<CleanupCandidate> {
    if !record.is_file()
        || !INSTALLER_EXTENSIONS.contains(&record.extension.as_str())
        || !is_older_than(record, config.reference_time, config.installer_age)
    {
        return None;
    }

    let name = record.lower_name();
    let safety = if INSTALLER_HINTS.iter().any(|h| name.contains(h)) {
        SafetyLevel::Caution
    } else {
        SafetyLevel::UserDecision
    };
    Some(CleanupCandidate::new(
        record,
        CleanupCategory::OldInstallers,
        safety,
        format!("installer package .{} not touched recently", record.extension),
    ))
}

/// Rule 7: backup copies.
pub fn detect_backup(record: &FileRecord) -> Option<CleanupCandidate> {
    if !record.is_file() {
        return None;
    }
    let name = record.lower_name();
    let matched = BACKUP_EXTENSIONS.contains(&record.extension.as_str())
        || name.ends_with('~')
        || BACKUP_MARKERS.iter().any(|m| name.contains(m));

    matched.then(|| {
        CleanupCandidate::new(
            record,
            CleanupCategory::BackupFiles,
            SafetyLevel::Caution,
            "backup or copy of another file".to_string(),
        )
    })
}

/// Rule 8: large files untouched for a long time.
pub fn detect_large_unused(
    record: &FileRecord,
    config: &CleanupConfig,
) -> Option<CleanupCandidate> {
    let matched = record.is_file()
        && record.size_bytes >= config.large_file_size
        && is_older_than(record, config.reference_time, config.large_file_age);

    matched.then(|| {
        CleanupCandidate::new(
            record,
            CleanupCategory::LargeUnused,
            SafetyLevel::UserDecision,
            "large file not modified recently".to_string(),
        )
    })
}

/// First directory segment of `dir` (lowercased) accepted by `pred`.
fn directory_segment(dir: &Path, pred: impl Fn(&str) -> bool) -> Option<String> {
    dir.components().find_map(|component| {
        let Component::Normal(segment) = component else {
            return None;
        };
        let segment = segment.to_string_lossy().to_lowercase();
        pred(&segment).then_some(segment)
    })
}

/// Check for an embedded calendar date: `YYYY-MM-DD`, `YYYY_MM_DD` or
/// a standalone run of eight digits `YYYYMMDD`.
pub(crate) fn contains_date(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();

    let separated = chars.windows(10).any(|w| {
        let sep = w[4];
        (sep == '-' || sep == '_')
            && w[7] == sep
            && is_date(&w[0..4], &w[5..7], &w[8..10])
    });
    if separated {
        return true;
    }

    let mut run_start = None;
    for (i, c) in chars.iter().chain(std::iter::once(&' ')).enumerate() {
        match (c.is_ascii_digit(), run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start == 8 {
                    let run = &chars[start..i];
                    if is_date(&run[0..4], &run[4..6], &run[6..8]) {
                        return true;
                    }
                }
                run_start = None;
            }
            _ => {}
        }
    }
    false
}

fn is_date(year: &[char], month: &[char], day: &[char]) -> bool {
    let parse = |digits: &[char]| -> Option<u32> {
        digits
            .iter()
            .try_fold(0u32, |acc, c| Some(acc * 10 + c.to_digit(10)?))
    };
    match (parse(year), parse(month), parse(day)) {
        (Some(y), Some(m), Some(d)) if (1970..=2100).contains(&y) => {
            NaiveDate::from_ymd_opt(y as i32, m, d).is_some()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::days;
    use std::time::SystemTime;

    const MIB: u64 = 1024 * 1024;

    fn config(now: SystemTime) -> CleanupConfig {
        CleanupConfig {
            reference_time: now,
            ..CleanupConfig::default()
        }
    }

    fn file(path: &str, size: u64) -> FileRecord {
        FileRecord::file(path, size, Some(SystemTime::now()))
    }

    #[test]
    fn test_temp_rule_levels() {
        let hit = detect_temp(&file("/x/data.tmp", 5)).unwrap();
        assert_eq!(hit.safety_level, SafetyLevel::Safe);

        let os = detect_temp(&file("/x/Thumbs.db", 5)).unwrap();
        assert_eq!(os.safety_level, SafetyLevel::Safe);

        let dir = detect_temp(&file("/var/tmp/report.pdf", 5)).unwrap();
        assert_eq!(dir.safety_level, SafetyLevel::Safe);

        let pattern = detect_temp(&file("/x/~$budget.xlsx", 5)).unwrap();
        assert_eq!(pattern.safety_level, SafetyLevel::LikelySafe);
        let tilde = detect_temp(&file("/x/notes.md~", 5)).unwrap();
        assert_eq!(tilde.safety_level, SafetyLevel::LikelySafe);

        assert!(detect_temp(&file("/x/report.pdf", 5)).is_none());
        assert!(detect_temp(&FileRecord::directory("/tmp/x", 0, None)).is_none());
    }

    #[test]
    fn test_empty_rule() {
        let f = detect_empty(&file("/x/placeholder.txt", 0)).unwrap();
        assert_eq!(f.safety_level, SafetyLevel::Safe);
        assert_eq!(f.category, CleanupCategory::EmptyFiles);

        let d = detect_empty(&FileRecord::directory("/x/empty", 0, None)).unwrap();
        assert_eq!(d.safety_level, SafetyLevel::LikelySafe);

        assert!(detect_empty(&FileRecord::directory("/x/full", 2, None)).is_none());
        assert!(detect_empty(&file("/x/a.txt", 1)).is_none());
    }

    #[test]
    fn test_cache_rule() {
        let dir = detect_cache(&file("/home/u/.cache/pip/wheel.whl", 5)).unwrap();
        assert_eq!(dir.safety_level, SafetyLevel::Safe);
        let py = detect_cache(&file("/src/__pycache__/mod.cpython-311.pyc", 5)).unwrap();
        assert_eq!(py.safety_level, SafetyLevel::Safe);
        let name = detect_cache(&file("/data/thumbcache_256.db", 5)).unwrap();
        assert_eq!(name.safety_level, SafetyLevel::LikelySafe);
        assert!(detect_cache(&file("/data/notes.txt", 5)).is_none());
    }

    #[test]
    fn test_log_rule() {
        let cfg = config(SystemTime::now());
        let small = detect_log(&file("/var/app.log", 10), &cfg).unwrap();
        assert_eq!(small.safety_level, SafetyLevel::Caution);
        let big = detect_log(&file("/var/app.log", 60 * MIB), &cfg).unwrap();
        assert_eq!(big.safety_level, SafetyLevel::LikelySafe);

        assert!(detect_log(&file("/x/error_output.txt", 10), &cfg).is_some());
        assert!(detect_log(&file("/x/2024-03-15.txt", 10), &cfg).is_some());
        assert!(detect_log(&file("/x/run_20240315.txt", 10), &cfg).is_some());

        assert!(detect_log(&file("/x/catalog.txt", 10), &cfg).is_none());
        assert!(detect_log(&file("/x/dialog.txt", 10), &cfg).is_none());
        assert!(detect_log(&file("/x/notes.txt", 10), &cfg).is_none());
        assert!(detect_log(&file("/x/debug.rs", 10), &cfg).is_none());
    }

    #[test]
    fn test_contains_date() {
        assert!(contains_date("backup_2023_12_31"));
        assert!(contains_date("20240229"));
        assert!(!contains_date("20230229"));
        assert!(!contains_date("123456789"));
        assert!(!contains_date("2024-13-01"));
    }

    #[test]
    fn test_old_installer_rule() {
        let now = SystemTime::now();
        let cfg = config(now);
        let setup = FileRecord::file("/d/AppSetup.exe", 5, Some(now - days(45)));
        assert_eq!(
            detect_old_installer(&setup, &cfg).unwrap().safety_level,
            SafetyLevel::Caution
        );

        let plain = FileRecord::file("/d/tool.dmg", 5, Some(now - days(45)));
        assert_eq!(
            detect_old_installer(&plain, &cfg).unwrap().safety_level,
            SafetyLevel::UserDecision
        );

        let recent = FileRecord::file("/d/tool.dmg", 5, Some(now - days(3)));
        assert!(detect_old_installer(&recent, &cfg).is_none());
        let undated = FileRecord::file("/d/tool.dmg", 5, None);
        assert!(detect_old_installer(&undated, &cfg).is_none());
    }

    #[test]
    fn test_backup_rule() {
        for path in ["/x/db.bak", "/x/notes.md~", "/x/report - Copy.docx", "/x/site_backup.zip"] {
            let hit = detect_backup(&file(path, 5)).unwrap();
            assert_eq!(hit.safety_level, SafetyLevel::Caution, "{path}");
        }
        assert!(detect_backup(&file("/x/report.docx", 5)).is_none());
    }

    #[test]
    fn test_large_unused_rule() {
        let now = SystemTime::now();
        let cfg = config(now);
        let big_old = FileRecord::file("/v/movie.mkv", 200 * MIB, Some(now - days(120)));
        let hit = detect_large_unused(&big_old, &cfg).unwrap();
        assert_eq!(hit.safety_level, SafetyLevel::UserDecision);

        let big_new = FileRecord::file("/v/movie.mkv", 200 * MIB, Some(now - days(10)));
        assert!(detect_large_unused(&big_new, &cfg).is_none());
        let small_old = FileRecord::file("/v/clip.mkv", 10 * MIB, Some(now - days(120)));
        assert!(detect_large_unused(&small_old, &cfg).is_none());
    }
}
