//! In-memory ledger backend for testing.

use super::LedgerBackend;
use crate::core::hasher::ContentHash;
use crate::error::LedgerError;
use std::collections::HashSet;
use std::sync::RwLock;

/// In-memory ledger
///
/// Useful for tests and dry runs where persistence isn't wanted.
#[derive(Default)]
pub struct InMemoryLedger {
    hashes: RwLock<HashSet<ContentHash>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded ledger
    pub fn with_hashes(hashes: impl IntoIterator<Item = ContentHash>) -> Self {
        Self {
            hashes: RwLock::new(hashes.into_iter().collect()),
        }
    }
}

impl LedgerBackend for InMemoryLedger {
    fn load(&self) -> Result<HashSet<ContentHash>, LedgerError> {
        let hashes = self.hashes.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(hashes.clone())
    }

    fn record(&self, hashes: &[ContentHash]) -> Result<usize, LedgerError> {
        let mut stored = self.hashes.write().map_err(|_| LedgerError::Poisoned)?;
        Ok(hashes.iter().filter(|h| stored.insert(**h)).count())
    }
}
