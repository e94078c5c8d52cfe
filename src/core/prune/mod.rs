//! # Prune Module
//!
//! Deletes files from the device once their content is safely archived.
//!
//! A remote file is deleted only when a copy pulled during this run hashes
//! to a value already in the ledger. Listing names or sizes are never
//! trusted. Remote deletion cannot be undone, so the run refuses to start
//! unless the caller both confirms and supplies [`CONFIRMATION_PHRASE`].

use crate::core::cancel::CancellationToken;
use crate::core::hasher::hash_file;
use crate::core::ledger::LedgerBackend;
use crate::core::organize::discard;
use crate::core::transfer::StagingArea;
use crate::core::transport::RemoteTransport;
use crate::error::{ArchiveError, PruneError};
use crate::events::{EventSender, Operation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Phrase the user has to type to allow remote deletion
pub const CONFIRMATION_PHRASE: &str = "DELETE FROM DEVICE";

/// Refuse unless `confirmed` is set and `token` matches the phrase exactly
pub fn check_confirmation(confirmed: bool, token: &str) -> Result<(), PruneError> {
    if !confirmed {
        return Err(PruneError::NotConfirmed);
    }
    if token != CONFIRMATION_PHRASE {
        return Err(PruneError::TokenMismatch);
    }
    Ok(())
}

/// Result of a prune run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneResult {
    /// Remote files deleted after verification
    pub deleted: usize,
    /// Remote files whose content is not archived
    pub kept: usize,
    /// Remote files that could not be pulled for verification
    pub skipped: usize,
    /// Verified files whose deletion the device rejected
    pub failed_deletes: usize,
    pub duration_ms: u64,
}

/// Deletes archived content from the device after re-hashing it
pub struct VerifiedPruner<'a> {
    transport: &'a dyn RemoteTransport,
    ledger: &'a dyn LedgerBackend,
    verify_dir: &'a Path,
}

impl<'a> VerifiedPruner<'a> {
    pub fn new(
        transport: &'a dyn RemoteTransport,
        ledger: &'a dyn LedgerBackend,
        verify_dir: &'a Path,
    ) -> Self {
        Self {
            transport,
            ledger,
            verify_dir,
        }
    }

    /// Verify and delete, one remote file at a time.
    ///
    /// The confirmation gate is checked before the device is contacted.
    pub fn run(
        &self,
        confirmed: bool,
        token: &str,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<PruneResult, ArchiveError> {
        check_confirmation(confirmed, token)?;

        let start = Instant::now();
        let known = self.ledger.load()?;
        let entries = self.transport.list_remote_entries()?;
        let total = entries.len();
        let verify = StagingArea::prepare(self.verify_dir)?;

        events.started(Operation::Prune, total);
        tracing::info!(files = total, known = known.len(), "starting verified device cleanup");

        let mut result = PruneResult::default();
        for (i, file) in entries.iter().enumerate() {
            cancel.check()?;

            let Some(local_name) = file.local_name() else {
                events.skipped(Operation::Prune, &file.name, "unusable file name");
                result.skipped += 1;
                events.progress(Operation::Prune, i + 1, total, &file.name);
                continue;
            };

            // A copy from an earlier item must never stand in for this one
            let copy = verify.slot(local_name);
            discard(&copy)?;

            if let Err(e) = self.transport.pull(file, &copy) {
                tracing::debug!(name = %file, error = %e, "pull reported an error");
            }
            if !copy.is_file() {
                tracing::warn!(name = %file, "could not pull for verification, keeping it");
                events.skipped(Operation::Prune, &file.name, "pull failed");
                result.skipped += 1;
                events.progress(Operation::Prune, i + 1, total, &file.name);
                continue;
            }

            let hash = hash_file(&copy);
            discard(&copy)?;
            let hash = hash?;

            if known.contains(&hash) {
                match self.transport.delete_remote(file) {
                    Ok(()) => {
                        tracing::debug!(name = %file, %hash, "deleted from device");
                        result.deleted += 1;
                    }
                    Err(e) => {
                        tracing::warn!(name = %file, error = %e, "device refused deletion");
                        events.skipped(Operation::Prune, &file.name, e.to_string());
                        result.failed_deletes += 1;
                    }
                }
            } else {
                tracing::debug!(name = %file, %hash, "not archived, keeping on device");
                result.kept += 1;
            }

            events.progress(Operation::Prune, i + 1, total, &file.name);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            deleted = result.deleted,
            kept = result.kept,
            skipped = result.skipped,
            failed = result.failed_deletes,
            "device cleanup finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ContentHash;
    use crate::core::ledger::InMemoryLedger;
    use crate::core::transport::{DirectoryTransport, RemoteFile};
    use crate::error::TransportError;
    use crate::events::null_sender;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts calls so tests can prove the gate ran first
    struct CountingTransport {
        inner: DirectoryTransport,
        calls: AtomicUsize,
    }

    impl RemoteTransport for CountingTransport {
        fn is_connected(&self) -> Result<bool, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.is_connected()
        }

        fn list_remote_entries(&self) -> Result<Vec<RemoteFile>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_remote_entries()
        }

        fn pull(&self, file: &RemoteFile, local_dest: &Path) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.pull(file, local_dest)
        }

        fn delete_remote(&self, file: &RemoteFile) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete_remote(file)
        }
    }

    #[test]
    fn gate_requires_confirmation_and_exact_phrase() {
        assert_eq!(check_confirmation(false, CONFIRMATION_PHRASE), Err(PruneError::NotConfirmed));
        assert_eq!(check_confirmation(true, "delete from device"), Err(PruneError::TokenMismatch));
        assert_eq!(check_confirmation(true, "DELETE FROM DEVICE "), Err(PruneError::TokenMismatch));
        assert_eq!(check_confirmation(true, CONFIRMATION_PHRASE), Ok(()));
    }

    #[test]
    fn refused_gate_never_touches_the_device() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"alpha").unwrap();
        let transport = CountingTransport {
            inner: DirectoryTransport::new(temp.path()),
            calls: AtomicUsize::new(0),
        };
        let ledger = InMemoryLedger::with_hashes([ContentHash::of_bytes(b"alpha")]);
        let verify = temp.path().join("verify");

        let result = VerifiedPruner::new(&transport, &ledger, &verify).run(
            true,
            "yes",
            &null_sender(),
            &CancellationToken::new(),
        );

        assert!(matches!(result, Err(ArchiveError::Prune(PruneError::TokenMismatch))));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(temp.path().join("a.jpg").exists());
    }

    #[test]
    fn deletes_only_archived_content() {
        let temp = TempDir::new().unwrap();
        let device = temp.path().join("device");
        fs::create_dir(&device).unwrap();
        fs::write(device.join("archived.jpg"), b"alpha").unwrap();
        fs::write(device.join("fresh.jpg"), b"beta").unwrap();
        let transport = DirectoryTransport::new(&device);
        let ledger = InMemoryLedger::with_hashes([ContentHash::of_bytes(b"alpha")]);
        let verify = temp.path().join("verify");

        let result = VerifiedPruner::new(&transport, &ledger, &verify)
            .run(true, CONFIRMATION_PHRASE, &null_sender(), &CancellationToken::new())
            .unwrap();

        assert_eq!(result.deleted, 1);
        assert_eq!(result.kept, 1);
        assert!(!device.join("archived.jpg").exists());
        assert!(device.join("fresh.jpg").exists());
        assert_eq!(fs::read_dir(&verify).unwrap().count(), 0);
    }
}
