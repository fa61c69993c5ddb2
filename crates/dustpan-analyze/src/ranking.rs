//! Keeper selection for duplicate groups.
//!
//! A group's keeper is the member with the best
//! `(modified time, name quality, size, location)` key, compared in that
//! order. A full tie keeps the earliest member.

use std::path::{Component, Path};
use std::time::SystemTime;

use dustpan_core::FileRecord;

/// Words in a file name that mark it as a copy, backup or scratch file.
pub const COPY_MARKERS: &[&str] = &[
    "copy", "backup", "temp", "tmp", "복사본", "사본", "백업", "임시",
];

const DESKTOP_SEGMENTS: &[&str] = &["desktop", "바탕 화면", "바탕화면"];
const DOCUMENTS_SEGMENTS: &[&str] = &["documents", "my documents", "문서", "내 문서"];
const DOWNLOADS_SEGMENTS: &[&str] = &["downloads", "다운로드"];
const TRASH_SEGMENTS: &[&str] = &[
    "temp", "tmp", "trash", ".trash", ".trashes", "$recycle.bin", "recycle bin", "휴지통",
];

/// Score a file name by how much it looks like an original.
///
/// +10 for a run of three or more letters, -1 per two digits, -20 for a
/// copy marker, +5 for a length of 10 to 50 characters.
pub fn name_quality_score(name: &str) -> i32 {
    let lower = name.to_lowercase();
    let mut score = 0;

    if has_letter_run(name, 3) {
        score += 10;
    }

    let digits = name.chars().filter(char::is_ascii_digit).count();
    score -= i32::try_from(digits / 2).unwrap_or(i32::MAX);

    if COPY_MARKERS.iter().any(|m| lower.contains(m)) {
        score -= 20;
    }

    let len = name.chars().count();
    if (10..=50).contains(&len) {
        score += 5;
    }

    score
}

/// Score a path by how likely its location holds the copy worth keeping.
///
/// Desktop +10, Documents +8, Downloads +5, temp or trash -10, plus up to
/// 10 for shallow paths.
pub fn location_score(path: &Path) -> i32 {
    let mut score = 0;
    let mut separators = 0i32;

    for component in path.components() {
        let Component::Normal(segment) = component else {
            continue;
        };
        separators += 1;
        let segment = segment.to_string_lossy().to_lowercase();
        let segment = segment.as_str();

        if DESKTOP_SEGMENTS.contains(&segment) {
            score += 10;
        } else if DOCUMENTS_SEGMENTS.contains(&segment) {
            score += 8;
        } else if DOWNLOADS_SEGMENTS.contains(&segment) {
            score += 5;
        } else if TRASH_SEGMENTS.contains(&segment) {
            score -= 10;
        }
    }

    score + (10 - separators).max(0)
}

/// Ordering key for keeper selection; larger is better.
type KeeperKey = (Option<SystemTime>, i32, u64, i32);

fn keeper_key(record: &FileRecord) -> KeeperKey {
    (
        record.modified_at,
        name_quality_score(&record.file_name),
        record.size_bytes,
        location_score(&record.path),
    )
}

/// Index of the member to keep, or `None` for an empty slice.
pub fn recommend_keeper(members: &[FileRecord]) -> Option<usize> {
    members
        .iter()
        .map(keeper_key)
        .enumerate()
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .map(|(idx, _)| idx)
}

fn has_letter_run(name: &str, min_run: usize) -> bool {
    let mut run = 0;
    for c in name.chars() {
        if c.is_alphabetic() {
            run += 1;
            if run >= min_run {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_name_quality_score() {
        // letters +10, length 10 +5
        assert_eq!(name_quality_score("report.txt"), 15);
        // letters +10, copy -20, length 15 +5
        assert_eq!(name_quality_score("report_copy.txt"), -5);
        // "jpg" run +10, 8 digits -4, length 12 +5
        assert_eq!(name_quality_score("20240101.jpg"), 11);
        assert_eq!(name_quality_score("ab"), 0);
        assert_eq!(name_quality_score("보고서 사본.hwp"), -5);
    }

    #[test]
    fn test_location_score() {
        // 4 normal components: Documents +8, depth bonus 6
        assert_eq!(location_score(Path::new("/home/u/Documents/a.txt")), 14);
        assert_eq!(location_score(Path::new("/home/u/Downloads/a.txt")), 11);
        assert_eq!(location_score(Path::new("/home/u/Desktop/a.txt")), 16);
        assert_eq!(location_score(Path::new("/tmp/a.txt")), -2);
        let deep = Path::new("/a/b/c/d/e/f/g/h/i/j/k/l.txt");
        assert_eq!(location_score(deep), 0);
    }

    #[test]
    fn test_newest_wins_first() {
        let now = SystemTime::now();
        let members = vec![
            FileRecord::file("/home/u/Desktop/report.txt", 10, Some(now - Duration::from_secs(100))),
            FileRecord::file("/tmp/x_copy.txt", 5, Some(now)),
        ];
        assert_eq!(recommend_keeper(&members), Some(1));
    }

    #[test]
    fn test_falls_through_to_name_then_size_then_location() {
        let t = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
        let by_name = vec![
            FileRecord::file("/a/report_copy.txt", 10, t),
            FileRecord::file("/a/report.txt", 10, t),
        ];
        assert_eq!(recommend_keeper(&by_name), Some(1));

        let by_size = vec![
            FileRecord::file("/a/report.txt", 10, t),
            FileRecord::file("/b/report.txt", 20, t),
        ];
        assert_eq!(recommend_keeper(&by_size), Some(1));

        let by_location = vec![
            FileRecord::file("/x/Downloads/report.txt", 10, t),
            FileRecord::file("/x/Desktop/report.txt", 10, t),
        ];
        assert_eq!(recommend_keeper(&by_location), Some(1));
    }

    #[test]
    fn test_full_tie_keeps_first() {
        let members = vec![
            FileRecord::file("/a/report.txt", 10, None),
            FileRecord::file("/b/report.txt", 10, None),
        ];
        assert_eq!(recommend_keeper(&members), Some(0));
        assert_eq!(recommend_keeper(&[]), None);
    }

    #[test]
    fn test_missing_time_loses_to_known_time() {
        let members = vec![
            FileRecord::file("/a/report.txt", 10, None),
            FileRecord::file("/b/report.txt", 10, Some(SystemTime::UNIX_EPOCH)),
        ];
        assert_eq!(recommend_keeper(&members), Some(1));
    }
}
