//! Ledger backend trait definition.

use crate::core::hasher::ContentHash;
use crate::error::LedgerError;
use std::collections::HashSet;

/// Trait for ledger backends
pub trait LedgerBackend: Send + Sync {
    /// Read every recorded hash. A store that does not exist yet is empty.
    fn load(&self) -> Result<HashSet<ContentHash>, LedgerError>;

    /// Durably append hashes that are not already recorded.
    ///
    /// Duplicates, whether already stored or repeated within `hashes`, are
    /// skipped. Returns the number of entries actually appended.
    fn record(&self, hashes: &[ContentHash]) -> Result<usize, LedgerError>;

    /// Number of distinct recorded hashes
    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.load()?.len())
    }

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}
