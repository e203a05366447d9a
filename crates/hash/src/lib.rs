#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! MD5 content checksums for cached blobs
//!
//! This crate decides whether a locally cached copy of a remote blob is
//! trustworthy. Cache checksums originate from the object store's entity
//! tags, which some backends wrap in quote characters; expected digests are
//! normalized before comparison and compared case-insensitively.

use md5::{Digest as _, Md5};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use wallsync_errors::{Error, StorageError};

/// Size of chunks for streaming digest computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// A 128-bit MD5 content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum {
    bytes: [u8; 16],
}

impl Checksum {
    /// Create a checksum from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Convert to lowercase hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from a hex string, case-insensitively
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or is not
    /// exactly 32 characters (16 bytes).
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| StorageError::CorruptedData {
            message: format!("invalid hex: {e}"),
        })?;

        if bytes.len() != 16 {
            return Err(StorageError::CorruptedData {
                message: format!("digest must be 16 bytes, got {}", bytes.len()),
            }
            .into());
        }

        let mut array = [0u8; 16];
        array.copy_from_slice(&bytes);
        Ok(Self::from_bytes(array))
    }

    /// Compute the digest of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_bytes(Md5::digest(data).into())
    }

    /// Compute the digest of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut file = fs::File::open(path)
            .await
            .map_err(|_| StorageError::PathNotFound {
                path: path.display().to_string(),
            })?;

        let mut hasher = Md5::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self::from_bytes(hasher.finalize().into()))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Normalize an expected digest string received from a backend
///
/// Strips surrounding whitespace and the quote characters some object
/// stores wrap entity tags in, and lowercases the rest.
#[must_use]
pub fn normalize_expected(expected: &str) -> String {
    expected.trim().trim_matches('"').to_ascii_lowercase()
}

/// Check a cached file against an expected digest string
///
/// Fails closed: a missing file is "not valid" without error, and an
/// expected string that is not a digest at all counts as a mismatch. On
/// mismatch the file is deleted iff `delete_on_mismatch` is set; a partial
/// resumed file legitimately fails a full-content check until complete, so
/// constrained-bandwidth callers pass `false` to keep the bytes they
/// already paid for.
///
/// # Errors
/// Returns an error if reading or deleting the file fails.
pub async fn verify_cached(
    path: &Path,
    expected: &str,
    delete_on_mismatch: bool,
) -> Result<bool, Error> {
    if !fs::try_exists(path).await? {
        return Ok(false);
    }

    let matches = match Checksum::from_hex(&normalize_expected(expected)) {
        Ok(expected) => Checksum::hash_file(path).await? == expected,
        Err(_) => false,
    };

    if !matches && delete_on_mismatch {
        fs::remove_file(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn checksum_basics() {
        let digest = Checksum::from_data(b"hello world");

        // Known MD5 of "hello world"
        assert_eq!(digest.to_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn from_hex_is_case_insensitive() {
        let lower = Checksum::from_hex("5eb63bbbe01eeed093cb22bb8f5acdc3").unwrap();
        let upper = Checksum::from_hex("5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(Checksum::from_hex("not a digest").is_err());
        assert!(Checksum::from_hex("abcd").is_err());
    }

    #[test]
    fn normalize_strips_quotes() {
        assert_eq!(
            normalize_expected("\"5EB63BBBE01EEED093CB22BB8F5ACDC3\""),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[tokio::test]
    async fn hash_file_matches_from_data() {
        let mut temp = NamedTempFile::new().unwrap();
        let data = b"test file content";
        temp.write_all(data).unwrap();

        let digest = Checksum::hash_file(temp.path()).await.unwrap();
        assert_eq!(digest, Checksum::from_data(data));
    }

    #[tokio::test]
    async fn verify_missing_file_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let valid = verify_cached(&path, "5eb63bbbe01eeed093cb22bb8f5acdc3", true)
            .await
            .unwrap();
        assert!(!valid);
    }

    #[tokio::test]
    async fn verify_accepts_quoted_uppercase_digest() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"hello world").unwrap();

        let valid = verify_cached(temp.path(), "\"5EB63BBBE01EEED093CB22BB8F5ACDC3\"", true)
            .await
            .unwrap();
        assert!(valid);
        assert!(temp.path().exists());
    }

    #[tokio::test]
    async fn verify_mismatch_deletes_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cached.bin");
        tokio::fs::write(&path, b"corrupt content").await.unwrap();

        let expected = Checksum::from_data(b"pristine content").to_hex();
        let valid = verify_cached(&path, &expected, true).await.unwrap();
        assert!(!valid);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn verify_mismatch_keeps_file_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");
        tokio::fs::write(&path, b"partial content").await.unwrap();

        let expected = Checksum::from_data(b"full content").to_hex();
        let valid = verify_cached(&path, &expected, false).await.unwrap();
        assert!(!valid);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn verify_garbage_expected_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cached.bin");
        tokio::fs::write(&path, b"content").await.unwrap();

        let valid = verify_cached(&path, "not-a-digest", false).await.unwrap();
        assert!(!valid);
        assert!(path.exists());
    }
}
