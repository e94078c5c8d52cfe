//! Plain-text ledger store: one lowercase hex hash per line.

use super::LedgerBackend;
use crate::core::hasher::ContentHash;
use crate::error::LedgerError;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Append-only ledger file
///
/// Lines are only ever appended, so a crash can at worst lose the batch that
/// was being written; everything flushed before it stays.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl LedgerBackend for FileLedger {
    fn load(&self) -> Result<HashSet<ContentHash>, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(self.read_error(e)),
        };

        let mut hashes = HashSet::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let hash = ContentHash::from_hex(line).ok_or_else(|| LedgerError::Corrupted {
                path: self.path.clone(),
                line: i + 1,
            })?;
            hashes.insert(hash);
        }

        Ok(hashes)
    }

    fn record(&self, hashes: &[ContentHash]) -> Result<usize, LedgerError> {
        let mut existing = self.load()?;
        let fresh: Vec<&ContentHash> = hashes.iter().filter(|h| existing.insert(**h)).collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;

        let mut batch = String::with_capacity(fresh.len() * 65);
        for hash in &fresh {
            batch.push_str(&hash.to_hex());
            batch.push('\n');
        }
        file.write_all(batch.as_bytes())
            .map_err(|e| self.write_error(e))?;
        file.sync_data().map_err(|e| self.write_error(e))?;

        tracing::debug!(path = %self.path.display(), appended = fresh.len(), "ledger updated");
        Ok(fresh.len())
    }
}
