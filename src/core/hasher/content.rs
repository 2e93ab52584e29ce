//! Strong content hashing with streaming xxh3-128.

use crate::error::HashError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A 128-bit strong hash of a file's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(u128);

impl ContentHash {
    /// The raw 128-bit value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Hash a file's full content.
///
/// Reads in 64 KiB chunks so multi-gigabyte videos never land in memory
/// whole. Any I/O failure maps to [`HashError::Unreadable`].
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
    let unreadable = |source| HashError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(unreadable)?;
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).map_err(unreadable)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(ContentHash(hasher.digest128()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn identical_content_hashes_equal() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"same bytes");
        let b = write_file(&dir, "b.jpg", b"same bytes");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differ() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"some bytes");
        let b = write_file(&dir, "b.jpg", b"other bytes");

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn hashing_is_stable_across_calls() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"stable");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&a).unwrap());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = hash_file(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(HashError::Unreadable { .. })));
    }

    #[test]
    fn display_is_fixed_width_hex() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"x");
        let hex = hash_file(&a).unwrap().to_string();
        assert_eq!(hex.len(), 32);
    }
}
