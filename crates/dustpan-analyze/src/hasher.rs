//! Content hashing for exact-duplicate detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;

use dustpan_core::{AnalysisError, ContentHash};

/// Size of each read when streaming a file through the hasher.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Computes a content digest for a file.
///
/// Implementations must return identical digests for identical bytes,
/// whatever the file's name or metadata.
pub trait ContentHasher: Send + Sync {
    /// Hash the full contents of `path`.
    fn hash(&self, path: &Path) -> Result<ContentHash, AnalysisError>;
}

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl Blake3Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self
    }

    /// Hash everything readable from `reader`.
    pub fn hash_reader(&self, mut reader: impl Read) -> std::io::Result<ContentHash> {
        let mut hasher = Hasher::new();
        let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(ContentHash::new(*hasher.finalize().as_bytes()))
    }
}

impl ContentHasher for Blake3Hasher {
    fn hash(&self, path: &Path) -> Result<ContentHash, AnalysisError> {
        let file = File::open(path).map_err(|e| AnalysisError::unreadable(path, e))?;
        self.hash_reader(file)
            .map_err(|e| AnalysisError::unreadable(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_identical_digest() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.txt"), "duplicate content here").unwrap();
        fs::write(root.join("b.bin"), "duplicate content here").unwrap();
        fs::write(root.join("c.txt"), "duplicate content hEre").unwrap();

        let hasher = Blake3Hasher::new();
        let a = hasher.hash(&root.join("a.txt")).unwrap();
        let b = hasher.hash(&root.join("b.bin")).unwrap();
        let c = hasher.hash(&root.join("c.txt")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_matches_one_shot_blake3() {
        let data = vec![7u8; HASH_CHUNK_SIZE * 2 + 17];
        let streamed = Blake3Hasher::new().hash_reader(data.as_slice()).unwrap();
        assert_eq!(streamed.0, *blake3::hash(&data).as_bytes());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let err = Blake3Hasher::new()
            .hash(&temp.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Unreadable { .. }));
    }
}
