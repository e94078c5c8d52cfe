//! Pulls new device files into the archive.

use super::staging::StagingArea;
use crate::core::cancel::CancellationToken;
use crate::core::hasher::{hash_file, ContentHash};
use crate::core::ledger::LedgerBackend;
use crate::core::organize::{discard, ensure_dir, move_file, unique_destination, RenamedFile};
use crate::core::transport::{RemoteFile, RemoteTransport};
use crate::error::ArchiveError;
use crate::events::{EventSender, Operation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of a backup run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferResult {
    /// Files with new content, now in the archive root
    pub archived: usize,
    /// Files whose content was already archived
    pub duplicates: usize,
    /// Files that could not be pulled
    pub skipped: usize,
    /// Archived files that had to take a numbered name
    pub renamed: Vec<RenamedFile>,
    pub duration_ms: u64,
}

/// Copies remote files into the archive, skipping content already seen
pub struct TransferPipeline<'a> {
    transport: &'a dyn RemoteTransport,
    ledger: &'a dyn LedgerBackend,
    staging_dir: &'a Path,
    archive_root: &'a Path,
}

impl<'a> TransferPipeline<'a> {
    pub fn new(
        transport: &'a dyn RemoteTransport,
        ledger: &'a dyn LedgerBackend,
        staging_dir: &'a Path,
        archive_root: &'a Path,
    ) -> Self {
        Self {
            transport,
            ledger,
            staging_dir,
            archive_root,
        }
    }

    /// Pull, hash and commit every remote entry, one at a time.
    ///
    /// The ledger receives the hashes of every file committed before the run
    /// stopped, even when it stopped on an error or a cancellation, so the
    /// ledger never lags behind the archive.
    pub fn run(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<TransferResult, ArchiveError> {
        let start = Instant::now();
        let known = self.ledger.load()?;
        let entries = self.transport.list_remote_entries()?;
        let total = entries.len();

        ensure_dir(self.archive_root)?;
        let staging = StagingArea::prepare(self.staging_dir)?;

        events.started(Operation::Backup, total);
        tracing::info!(
            files = total,
            known = known.len(),
            archive = %self.archive_root.display(),
            "starting backup"
        );

        let mut result = TransferResult::default();
        let mut new_hashes = Vec::new();
        let outcome = self.transfer_all(
            &entries,
            &known,
            &staging,
            &mut new_hashes,
            &mut result,
            events,
            cancel,
        );

        let recorded = if new_hashes.is_empty() {
            Ok(0)
        } else {
            self.ledger.record(&new_hashes)
        };
        drop(staging);

        if let (Err(run_error), Err(ledger_error)) = (&outcome, &recorded) {
            tracing::error!(
                run_error = %run_error,
                ledger_error = %ledger_error,
                "backup stopped and its hashes could not be recorded"
            );
        }
        outcome?;
        let appended = recorded?;

        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            archived = result.archived,
            duplicates = result.duplicates,
            skipped = result.skipped,
            ledger_appended = appended,
            "backup finished"
        );
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn transfer_all(
        &self,
        entries: &[RemoteFile],
        known: &HashSet<ContentHash>,
        staging: &StagingArea,
        new_hashes: &mut Vec<ContentHash>,
        result: &mut TransferResult,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<(), ArchiveError> {
        let total = entries.len();
        let mut seen_this_run: HashSet<ContentHash> = HashSet::new();

        for (i, file) in entries.iter().enumerate() {
            cancel.check()?;

            let Some(local_name) = file.local_name() else {
                tracing::warn!(name = %file, "remote name has no usable file name, skipping");
                events.skipped(Operation::Backup, &file.name, "unusable file name");
                result.skipped += 1;
                events.progress(Operation::Backup, i + 1, total, &file.name);
                continue;
            };

            let staged = staging.slot(local_name);
            if let Err(e) = self.transport.pull(file, &staged) {
                tracing::debug!(name = %file, error = %e, "pull reported an error");
            }
            if !staged.is_file() {
                tracing::warn!(name = %file, "pull produced no local copy, skipping");
                events.skipped(Operation::Backup, &file.name, "pull failed");
                result.skipped += 1;
                events.progress(Operation::Backup, i + 1, total, &file.name);
                continue;
            }

            let hash = hash_file(&staged)?;
            if known.contains(&hash) || !seen_this_run.insert(hash) {
                tracing::debug!(name = %file, %hash, "already archived");
                discard(&staged)?;
                result.duplicates += 1;
            } else {
                let dest = unique_destination(self.archive_root, local_name);
                move_file(&staged, &dest)?;
                new_hashes.push(hash);
                tracing::debug!(name = %file, %hash, dest = %dest.display(), "archived");

                if dest.file_name() != Some(local_name) {
                    result.renamed.push(RenamedFile {
                        original: PathBuf::from(&file.name),
                        destination: dest,
                    });
                }
                result.archived += 1;
            }

            events.progress(Operation::Backup, i + 1, total, &file.name);
        }

        Ok(())
    }
}
