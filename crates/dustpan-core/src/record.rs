//! File record types consumed by every analysis pass.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// BLAKE3 content hash for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// What kind of file system entry a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    /// Regular file.
    File,
    /// Directory, with the number of direct entries it held at scan time.
    Directory {
        /// Direct children (files, directories, links).
        entry_count: u64,
    },
}

impl RecordKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, RecordKind::Directory { .. })
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, RecordKind::File)
    }
}

/// Immutable snapshot of one scanned file.
///
/// Two records are equal only when their paths are equal; size, name and
/// timestamps play no part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path, unique within one analysis run.
    pub path: PathBuf,

    /// Final path component.
    pub file_name: CompactString,

    /// Lowercased extension without the dot (empty if none).
    pub extension: CompactString,

    /// Size in bytes (0 for directories).
    pub size_bytes: u64,

    /// Last modification time, if the scanner could read it.
    #[serde(default)]
    pub modified_at: Option<SystemTime>,

    /// Directory the entry lived in at scan time.
    pub original_location: PathBuf,

    /// File or directory.
    #[serde(default = "default_kind")]
    pub kind: RecordKind,
}

fn default_kind() -> RecordKind {
    RecordKind::File
}

/// A record as read back from a saved scan, before validation.
///
/// Sizes are signed and the path may be missing so that one bad entry
/// can be rejected on its own instead of failing the whole file. Derived
/// fields (`file_name`, `extension`, `original_location`) are recomputed.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedRecord {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub modified_at: Option<SystemTime>,
    #[serde(default = "default_kind")]
    pub kind: RecordKind,
}

impl SavedRecord {
    /// Validate into a [`FileRecord`].
    pub fn into_record(self) -> Result<FileRecord, AnalysisError> {
        let path = self.path.unwrap_or_default();
        match self.kind {
            RecordKind::File => FileRecord::try_new(path, self.size_bytes, self.modified_at),
            RecordKind::Directory { entry_count } => {
                if path.as_os_str().is_empty() {
                    return Err(AnalysisError::invalid_input(path, "empty path"));
                }
                Ok(FileRecord::directory(path, entry_count, self.modified_at))
            }
        }
    }
}

impl FileRecord {
    /// Create a record for a regular file.
    pub fn file(path: impl Into<PathBuf>, size_bytes: u64, modified_at: Option<SystemTime>) -> Self {
        Self::with_kind(path.into(), size_bytes, modified_at, RecordKind::File)
    }

    /// Create a record for a directory.
    pub fn directory(
        path: impl Into<PathBuf>,
        entry_count: u64,
        modified_at: Option<SystemTime>,
    ) -> Self {
        Self::with_kind(
            path.into(),
            0,
            modified_at,
            RecordKind::Directory { entry_count },
        )
    }

    /// Create a file record from untrusted scanner output.
    ///
    /// Rejects empty paths and negative sizes.
    pub fn try_new(
        path: impl Into<PathBuf>,
        size_bytes: i64,
        modified_at: Option<SystemTime>,
    ) -> Result<Self, AnalysisError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(AnalysisError::invalid_input(path, "empty path"));
        }
        let size = u64::try_from(size_bytes).map_err(|_| {
            AnalysisError::invalid_input(&path, format!("negative size {size_bytes}"))
        })?;
        Ok(Self::file(path, size, modified_at))
    }

    fn with_kind(
        path: PathBuf,
        size_bytes: u64,
        modified_at: Option<SystemTime>,
        kind: RecordKind,
    ) -> Self {
        let file_name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        let extension = match kind {
            RecordKind::File => extension_of(&path),
            RecordKind::Directory { .. } => CompactString::default(),
        };
        let original_location = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Self {
            path,
            file_name,
            extension,
            size_bytes,
            modified_at,
            original_location,
            kind,
        }
    }

    /// Check if this record is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Check if this record is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Lowercased file name, used by the name-based heuristics.
    pub fn lower_name(&self) -> String {
        self.file_name.as_str().to_lowercase()
    }

    /// Age of the record relative to `reference`.
    ///
    /// Modification times in the future count as age zero.
    pub fn age_at(&self, reference: SystemTime) -> Result<Duration, AnalysisError> {
        let modified = self.modified_at.ok_or_else(|| AnalysisError::MissingMetadata {
            path: self.path.clone(),
            field: "modified_at",
        })?;
        Ok(reference.duration_since(modified).unwrap_or(Duration::ZERO))
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileRecord {}

impl std::hash::Hash for FileRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

fn extension_of(path: &Path) -> CompactString {
    path.extension()
        .map(|e| CompactString::new(e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
        assert_eq!(hash.to_string(), hash.to_hex());
    }

    #[test]
    fn test_file_record_derived_fields() {
        let record = FileRecord::file("/home/user/Documents/Report.PDF", 1024, None);
        assert_eq!(record.file_name, "Report.PDF");
        assert_eq!(record.extension, "pdf");
        assert_eq!(record.original_location, PathBuf::from("/home/user/Documents"));
        assert!(record.is_file());
    }

    #[test]
    fn test_directory_record_has_no_extension() {
        let record = FileRecord::directory("/data/archive.d", 0, None);
        assert!(record.is_dir());
        assert_eq!(record.extension, "");
        assert_eq!(record.size_bytes, 0);
    }

    #[test]
    fn test_equality_is_by_path() {
        let a = FileRecord::file("/a/x.txt", 10, None);
        let b = FileRecord::file("/a/x.txt", 99, Some(SystemTime::now()));
        let c = FileRecord::file("/b/x.txt", 10, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_try_new_rejects_bad_input() {
        assert!(matches!(
            FileRecord::try_new("/a.txt", -1, None),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            FileRecord::try_new("", 1, None),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(FileRecord::try_new("/a.txt", 0, None).is_ok());
    }

    #[test]
    fn test_age_requires_modified_time() {
        let now = SystemTime::now();
        let record = FileRecord::file("/a.txt", 1, None);
        assert!(matches!(
            record.age_at(now),
            Err(AnalysisError::MissingMetadata { .. })
        ));

        let record = FileRecord::file("/a.txt", 1, Some(now - Duration::from_secs(60)));
        assert_eq!(record.age_at(now).unwrap(), Duration::from_secs(60));
    }
}
