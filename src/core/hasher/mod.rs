//! # Hasher Module
//!
//! Computes content hashes, the only identity used for deduplication.
//!
//! ## How It Works
//! The file is streamed through SHA-256 in fixed 8 KiB reads, so memory use
//! does not grow with file size. A hash is computed once, when a file is
//! pulled from the device; archived files are moved afterwards, never
//! re-hashed.
//!
//! ## Example
//! ```rust,ignore
//! use dcim_archiver::core::hasher::hash_file;
//!
//! let hash = hash_file(&path)?;
//! println!("{hash}");
//! ```

use crate::error::FilesystemError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Digest length in bytes
pub const DIGEST_LEN: usize = 32;

/// Read size for streaming digests
const READ_CHUNK: usize = 8192;

/// SHA-256 digest of a file's full byte content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; DIGEST_LEN]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Hash an in-memory buffer
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Lowercase hex, the ledger's on-disk form
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Parse 64 hex characters (either case)
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != DIGEST_LEN * 2 || !s.is_ascii() {
            return None;
        }

        let mut bytes = [0u8; DIGEST_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// Stream a file through the digest without buffering it whole
pub fn hash_file(path: &Path) -> Result<ContentHash, FilesystemError> {
    let mut file = File::open(path).map_err(|source| FilesystemError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(FilesystemError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        hasher.update(&buffer[..read]);
    }

    Ok(ContentHash(hasher.finalize().into()))
}
