//! Content Hashing
//!
//! TigerStyle: Files are hashed in bounded chunks so fixtures of any size
//! can be checked without loading them into memory.
//!
//! A fixture `foo.wpr` is paired with a sidecar `foo.wpr.sha1` whose first
//! line is the lowercase hex SHA-1 of the fixture. The digest doubles as the
//! object key in storage.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::constants::{HASH_CHUNK_BYTES, SIDECAR_BYTES_MAX, SIDECAR_SUFFIX};
use crate::error::{StorageError, StorageResult};

/// SHA-1 of the file at `path` as lowercase hex.
pub fn get_hash(path: &Path) -> StorageResult<String> {
    get_hash_chunked(path, HASH_CHUNK_BYTES)
}

/// SHA-1 of the file at `path`, reading `chunk_bytes` at a time.
///
/// # Panics
/// Panics if `chunk_bytes` is zero.
pub fn get_hash_chunked(path: &Path, chunk_bytes: usize) -> StorageResult<String> {
    // Precondition
    assert!(chunk_bytes > 0, "chunk_bytes must be positive");

    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; chunk_bytes];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Path of the sidecar hash file for `path`.
#[must_use]
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Expected hash recorded in the sidecar at `sidecar`.
///
/// Reads at most [`SIDECAR_BYTES_MAX`] bytes and trims trailing whitespace.
pub fn read_sidecar(sidecar: &Path) -> StorageResult<String> {
    let file = File::open(sidecar)?;
    let mut bytes = Vec::with_capacity(SIDECAR_BYTES_MAX);
    file.take(SIDECAR_BYTES_MAX as u64).read_to_end(&mut bytes)?;

    let text = String::from_utf8(bytes).map_err(|e| StorageError::InvalidSidecar {
        path: sidecar.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(text.trim_end().to_string())
}

// =============================================================================
// Tests
// =============================================================================
