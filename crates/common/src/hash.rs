//! Content digest computation.
//!
//! Digests are only compared for equality between a local copy and a remote
//! copy of the same file, so a fast non-cryptographic hash (XXH3-128) is used.

use std::fmt;
use std::io::Read;
use std::path::Path;

use xxhash_rust::xxh3::Xxh3;

use crate::constants::HASH_BUFFER_SIZE;

/// 128-bit content fingerprint.
///
/// Displays as a 32-character lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest(u128);

impl ContentDigest {
    /// Raw 128-bit value.
    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// 32-char lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Compute the digest of a byte slice.
///
/// # Arguments
/// * `data` - Bytes to hash
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest(xxhash_rust::xxh3::xxh3_128(data))
}

/// Compute the digest of a file.
///
/// Reads the file in 64KB chunks so the whole file is never held in memory.
///
/// # Arguments
/// * `path` - Path to the file to hash
///
/// # Errors
/// Returns error if file cannot be read.
pub fn hash_file(path: &Path) -> Result<ContentDigest, std::io::Error> {
    let mut file: std::fs::File = std::fs::File::open(path)?;
    let mut hasher: Xxh3Hasher = Xxh3Hasher::new();
    let mut buffer: Vec<u8> = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let bytes_read: usize = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finish())
}

/// Streaming hasher for incremental XXH3-128 hashing.
///
/// Feed it network chunks as they arrive; the result equals [`hash_bytes`]
/// over the concatenated input.
pub struct Xxh3Hasher {
    inner: Xxh3,
}

impl Xxh3Hasher {
    /// Create a new streaming hasher.
    pub fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    /// Update the hasher with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Return the digest of everything fed so far.
    pub fn finish(&self) -> ContentDigest {
        ContentDigest(self.inner.digest128())
    }
}

impl Default for Xxh3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_bytes_empty() {
        let digest: ContentDigest = hash_bytes(b"");
        assert_eq!(digest.to_hex().len(), 32);
    }

    #[test]
    fn test_hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"hello world"), hash_bytes(b"hello world"));
    }

    #[test]
    fn test_hash_bytes_different_inputs() {
        assert_ne!(hash_bytes(b"hello"), hash_bytes(b"world"));
    }

    #[test]
    fn test_display_matches_hex() {
        let digest: ContentDigest = hash_bytes(b"abc");
        assert_eq!(digest.to_string(), digest.to_hex());
        assert_eq!(digest.to_hex(), format!("{:032x}", digest.as_u128()));
    }

    #[test]
    fn test_xxh3_hasher_incremental() {
        let mut hasher: Xxh3Hasher = Xxh3Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");

        assert_eq!(hasher.finish(), hash_bytes(b"hello world"));
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
        let file_path: std::path::PathBuf = dir.path().join("f1.js");

        let mut file: std::fs::File = std::fs::File::create(&file_path).unwrap();
        file.write_all(b"console.log(1);").unwrap();
        drop(file);

        assert_eq!(hash_file(&file_path).unwrap(), hash_bytes(b"console.log(1);"));
    }

    #[test]
    fn test_hash_file_larger_than_buffer() {
        let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
        let file_path: std::path::PathBuf = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(HASH_BUFFER_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&file_path, &data).unwrap();

        assert_eq!(hash_file(&file_path).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn test_hash_file_not_found() {
        let result: Result<ContentDigest, std::io::Error> =
            hash_file(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }
}
