use dustpan_core::{
    AnalysisError, ContentHash, FileRecord, RecordKind, RecordSet, ScanConfig, SkipReason,
    SkippedRecord,
};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

#[test]
fn test_content_hash_creation_and_hex() {
    let bytes = [0xab; 32];
    let hash = ContentHash::new(bytes);

    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(hex.starts_with("ab"));

    assert_eq!(hash, ContentHash::new(bytes));
    assert_ne!(hash, ContentHash::new([0xcd; 32]));
}

#[test]
fn test_record_kind_discrimination() {
    let file = RecordKind::File;
    assert!(file.is_file());
    assert!(!file.is_dir());

    let dir = RecordKind::Directory { entry_count: 3 };
    assert!(dir.is_dir());
    assert!(!dir.is_file());
}

#[test]
fn test_record_without_extension() {
    let record = FileRecord::file("/etc/hosts", 120, None);
    assert_eq!(record.file_name, "hosts");
    assert_eq!(record.extension, "");
    assert_eq!(record.lower_name(), "hosts");
}

#[test]
fn test_lower_name_folds_case() {
    let record = FileRecord::file("/var/log/Debug_TRACE.Log", 10, None);
    let name: String = record.lower_name();
    assert_eq!(name, "debug_trace.log");
    assert_eq!(record.file_name, "Debug_TRACE.Log");
}

#[test]
fn test_record_json_roundtrip_keeps_identity() {
    let now = SystemTime::now();
    let record = FileRecord::file("/data/photo.JPG", 2048, Some(now));

    let json = serde_json::to_string(&record).unwrap();
    let back: FileRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(back, record);
    assert_eq!(back.extension, "jpg");
    assert_eq!(back.modified_at, Some(now));
    assert_eq!(back.kind, RecordKind::File);
}

#[test]
fn test_record_set_is_input_order_independent() {
    let now = SystemTime::now();
    let records = vec![
        FileRecord::file("/z/last.txt", 3, Some(now)),
        FileRecord::file("/a/first.txt", 1, Some(now - Duration::from_secs(10))),
        FileRecord::directory("/m", 0, None),
    ];
    let mut reversed = records.clone();
    reversed.reverse();

    let a = RecordSet::new(records);
    let b = RecordSet::new(reversed);

    let paths_a: Vec<_> = a.records.iter().map(|r| r.path.clone()).collect();
    let paths_b: Vec<_> = b.records.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths_a, paths_b);
    assert_eq!(paths_a[0], PathBuf::from("/a/first.txt"));
    assert_eq!(a.stats.total_size, 4);
    assert_eq!(
        a.stats.oldest_file.as_ref().map(|(p, _)| p.clone()),
        Some(PathBuf::from("/a/first.txt"))
    );
}

#[test]
fn test_record_set_skips_empty_paths() {
    let set = RecordSet::new(vec![
        FileRecord::file("", 1, None),
        FileRecord::file("/ok.txt", 1, None),
    ]);
    assert_eq!(set.len(), 1);
    assert_eq!(set.skipped.len(), 1);
    assert_eq!(set.skipped[0].reason, SkipReason::InvalidInput);
}

#[test]
fn test_record_set_with_external_skips() {
    let set = RecordSet::new(Vec::new()).with_skipped(vec![SkippedRecord::new(
        "/bad",
        SkipReason::InvalidInput,
        "negative size -4",
    )]);
    assert!(set.is_empty());
    assert_eq!(set.skipped.len(), 1);
}

#[test]
fn test_try_new_error_message() {
    let err = FileRecord::try_new("/x.bin", -4, None).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    assert!(err.to_string().contains("negative size -4"));
}

#[test]
fn test_scan_config_defaults() {
    let config = ScanConfig::default();
    assert_eq!(config.root, PathBuf::from("."));
    assert!(!config.follow_symlinks);
    assert!(config.include_hidden);
    assert!(config.max_depth.is_none());
    assert_eq!(config.threads, 0);
}
