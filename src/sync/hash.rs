//! Content hashing.
//!
//! The blake3 digest of a file's bytes is its identity: the path index,
//! blocklist, and dedup decisions all key on it.

use blake3::Hasher;
use std::io::Read;
use std::path::Path;

/// Hash a byte slice. Deterministic, 64-char lowercase hex.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Hash a file's contents without loading it whole into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = Hasher::new();

    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_deterministic() {
        let a = hash_bytes(b"same content");
        let b = hash_bytes(b"same content");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // blake3 hex is 64 chars
    }

    #[test]
    fn test_hash_differs_by_content() {
        assert_ne!(hash_bytes(b"one"), hash_bytes(b"two"));
    }

    #[test]
    fn test_hash_empty_bytes() {
        // Zero-byte files hash like any other content
        let hash = hash_bytes(b"");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("note.md");
        fs::write(&path, b"# Note\n\nbody\n").unwrap();

        let from_file = hash_file(&path).unwrap();
        let from_bytes = hash_bytes(b"# Note\n\nbody\n");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_hash_file_missing() {
        let tmp = TempDir::new().unwrap();
        let result = hash_file(&tmp.path().join("missing.md"));
        assert!(result.is_err());
    }
}
