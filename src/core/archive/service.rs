//! The caller-facing archive service.

use super::lock::RunLock;
use crate::config::ArchiveConfig;
use crate::core::cancel::CancellationToken;
use crate::core::classifier::Classifier;
use crate::core::history::{HistoryRepository, RunHistoryPage, RunRecord, RunStatus};
use crate::core::ledger::{FileLedger, LedgerBackend};
use crate::core::metadata::{MediaMetadata, TemporalMetadata};
use crate::core::organize::{
    relocate_archive, same_location, ArchiveLayout, ArchiveScanner, OrganizeResult,
    RelocateResult, Reorganizer, UndoResult,
};
use crate::core::prune::{check_confirmation, PruneResult, VerifiedPruner};
use crate::core::transfer::{TransferPipeline, TransferResult};
use crate::core::transport::{AdbTransport, RemoteTransport};
use crate::error::{ArchiveError, ConfigError, TransportError};
use crate::events::{null_sender, Event, EventSender, Operation, RunEvent, RunSummary};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// The headline number of a finished run
pub trait OperationReport {
    /// Files archived, moved, restored or deleted
    fn count(&self) -> usize;
}

impl OperationReport for TransferResult {
    fn count(&self) -> usize {
        self.archived
    }
}

impl OperationReport for OrganizeResult {
    fn count(&self) -> usize {
        self.files_moved
    }
}

impl OperationReport for UndoResult {
    fn count(&self) -> usize {
        self.files_restored
    }
}

impl OperationReport for PruneResult {
    fn count(&self) -> usize {
        self.deleted
    }
}

impl OperationReport for RelocateResult {
    fn count(&self) -> usize {
        self.files_moved
    }
}

/// What the archive looks like right now
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveStatus {
    pub archive_root: PathBuf,
    pub layout: ArchiveLayout,
    /// Distinct content hashes in the ledger
    pub ledger_entries: usize,
}

/// Builder for the archive service
pub struct ArchiveServiceBuilder {
    config: ArchiveConfig,
    config_path: Option<PathBuf>,
    transport: Option<Arc<dyn RemoteTransport>>,
    metadata: Option<Arc<dyn TemporalMetadata>>,
    ledger: Option<Box<dyn LedgerBackend>>,
    history: Option<HistoryRepository>,
}

impl ArchiveServiceBuilder {
    pub fn new(config: ArchiveConfig) -> Self {
        Self {
            config,
            config_path: None,
            transport: None,
            metadata: None,
            ledger: None,
            history: None,
        }
    }

    /// Where to persist the configuration after a relocation
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use this device instead of `adb`
    pub fn transport(mut self, transport: Arc<dyn RemoteTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn metadata(mut self, metadata: Arc<dyn TemporalMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Use this ledger instead of the configured ledger file
    pub fn ledger(mut self, ledger: Box<dyn LedgerBackend>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Use this history store instead of the configured database
    pub fn history(mut self, history: HistoryRepository) -> Self {
        self.history = Some(history);
        self
    }

    /// Build the service. A history database that fails to open disables
    /// history instead of failing.
    pub fn build(self) -> ArchiveService {
        let config = self.config;
        let metadata = self
            .metadata
            .unwrap_or_else(|| Arc::new(MediaMetadata::new()) as Arc<dyn TemporalMetadata>);
        let ledger = self
            .ledger
            .unwrap_or_else(|| Box::new(FileLedger::new(&config.ledger_path)) as Box<dyn LedgerBackend>);

        let history = self.history.or_else(|| {
            let path = config.history_path.as_deref()?;
            match HistoryRepository::open(path) {
                Ok(repo) => Some(repo),
                Err(e) => {
                    tracing::warn!(error = %e, "run history disabled");
                    None
                }
            }
        });

        ArchiveService {
            classifier: Classifier::new(metadata, config.fallback),
            config,
            config_path: self.config_path,
            transport: self.transport,
            ledger,
            history,
        }
    }
}

/// Backup, organize, undo, prune and relocate against one archive
///
/// Every mutating operation holds the archive's run lock, reports through
/// the event channel, and leaves a record in the run history.
pub struct ArchiveService {
    config: ArchiveConfig,
    config_path: Option<PathBuf>,
    transport: Option<Arc<dyn RemoteTransport>>,
    classifier: Classifier,
    ledger: Box<dyn LedgerBackend>,
    history: Option<HistoryRepository>,
}

impl ArchiveService {
    pub fn builder(config: ArchiveConfig) -> ArchiveServiceBuilder {
        ArchiveServiceBuilder::new(config)
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn archive_root(&self) -> &Path {
        &self.config.archive_root
    }

    /// Copy new device files into the archive root
    pub fn backup(&self) -> Result<TransferResult, ArchiveError> {
        self.backup_with_events(&null_sender(), &CancellationToken::new())
    }

    pub fn backup_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<TransferResult, ArchiveError> {
        self.run_operation(Operation::Backup, events, || {
            let transport = self.transport()?;
            if !transport.is_connected()? {
                return Err(TransportError::NoDevice.into());
            }
            TransferPipeline::new(
                transport.as_ref(),
                self.ledger.as_ref(),
                &self.config.staging_dir,
                &self.config.archive_root,
            )
            .run(events, cancel)
        })
    }

    /// File loose archive files into year buckets
    pub fn organize(&self) -> Result<OrganizeResult, ArchiveError> {
        self.organize_with_events(&null_sender(), &CancellationToken::new())
    }

    pub fn organize_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<OrganizeResult, ArchiveError> {
        self.run_operation(Operation::Organize, events, || {
            Reorganizer::new(&self.config.archive_root, &self.classifier).organize(events, cancel)
        })
    }

    /// Flatten year buckets back into the archive root
    pub fn undo_organize(&self) -> Result<UndoResult, ArchiveError> {
        self.undo_organize_with_events(&null_sender(), &CancellationToken::new())
    }

    pub fn undo_organize_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<UndoResult, ArchiveError> {
        self.run_operation(Operation::Undo, events, || {
            Reorganizer::new(&self.config.archive_root, &self.classifier).undo(events, cancel)
        })
    }

    /// Delete device files whose content is verifiably archived.
    ///
    /// Refused before anything else happens unless `confirmed` is set and
    /// `token` is exactly [`crate::core::prune::CONFIRMATION_PHRASE`].
    pub fn prune_remote(&self, confirmed: bool, token: &str) -> Result<PruneResult, ArchiveError> {
        self.prune_remote_with_events(confirmed, token, &null_sender(), &CancellationToken::new())
    }

    pub fn prune_remote_with_events(
        &self,
        confirmed: bool,
        token: &str,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<PruneResult, ArchiveError> {
        check_confirmation(confirmed, token)?;

        self.run_operation(Operation::Prune, events, || {
            let transport = self.transport()?;
            VerifiedPruner::new(transport.as_ref(), self.ledger.as_ref(), &self.config.verify_dir)
                .run(confirmed, token, events, cancel)
        })
    }

    /// Move the archive to `new_root` and remember the new location
    pub fn relocate(&mut self, new_root: &Path, confirmed: bool) -> Result<RelocateResult, ArchiveError> {
        self.relocate_with_events(new_root, confirmed, &null_sender(), &CancellationToken::new())
    }

    pub fn relocate_with_events(
        &mut self,
        new_root: &Path,
        confirmed: bool,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RelocateResult, ArchiveError> {
        if !confirmed {
            return Err(ConfigError::RelocateNotConfirmed.into());
        }
        if same_location(&self.config.archive_root, new_root) {
            return Err(ConfigError::SameRoot {
                path: new_root.to_path_buf(),
            }
            .into());
        }

        let result = self.run_operation(Operation::Relocate, events, || {
            let _target_lock = RunLock::acquire(new_root)?;
            relocate_archive(&self.config.archive_root, new_root, events, cancel)
        })?;

        self.config.archive_root = new_root.to_path_buf();
        if let Some(path) = &self.config_path {
            self.config.save(path)?;
        }
        tracing::info!(root = %new_root.display(), "archive relocated");
        Ok(result)
    }

    /// Current layout and ledger size
    pub fn status(&self) -> Result<ArchiveStatus, ArchiveError> {
        Ok(ArchiveStatus {
            archive_root: self.config.archive_root.clone(),
            layout: ArchiveScanner::layout(&self.config.archive_root)?,
            ledger_entries: self.ledger.len()?,
        })
    }

    /// Past runs, newest first. Empty when history is disabled.
    pub fn history(&self, limit: usize, offset: usize) -> Result<RunHistoryPage, ArchiveError> {
        match &self.history {
            Some(repo) => Ok(repo.list(limit, offset)?),
            None => Ok(RunHistoryPage {
                entries: Vec::new(),
                total_count: 0,
            }),
        }
    }

    pub fn clear_history(&self) -> Result<usize, ArchiveError> {
        match &self.history {
            Some(repo) => Ok(repo.clear()?),
            None => Ok(0),
        }
    }

    fn transport(&self) -> Result<Arc<dyn RemoteTransport>, ArchiveError> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }
        let device = &self.config.device;
        let adb = AdbTransport::new(device.adb_path.as_deref(), device.remote_dir.clone())?
            .with_serial(device.serial.clone());
        Ok(Arc::new(adb))
    }

    /// Run `body` under the run lock, then emit the terminal event and
    /// record the run.
    fn run_operation<T, F>(
        &self,
        operation: Operation,
        events: &EventSender,
        body: F,
    ) -> Result<T, ArchiveError>
    where
        T: OperationReport,
        F: FnOnce() -> Result<T, ArchiveError>,
    {
        let started_at = Utc::now();
        let start = Instant::now();

        let outcome = match RunLock::acquire(&self.config.archive_root) {
            Ok(lock) => {
                let outcome = body();
                drop(lock);
                outcome
            }
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let (count, status) = match &outcome {
            Ok(report) => {
                let count = report.count();
                events.send(Event::Run(RunEvent::Completed {
                    summary: RunSummary {
                        operation,
                        count,
                        duration_ms,
                    },
                }));
                (count, RunStatus::Completed)
            }
            Err(ArchiveError::Cancelled) => {
                tracing::info!(operation = operation.as_str(), "run cancelled");
                events.send(Event::Run(RunEvent::Cancelled { operation }));
                (0, RunStatus::Cancelled)
            }
            Err(e) => {
                tracing::error!(operation = operation.as_str(), error = %e, "run failed");
                let message = e.to_string();
                events.send(Event::Run(RunEvent::Error {
                    operation,
                    message: message.clone(),
                }));
                (0, RunStatus::Error(message))
            }
        };

        if let Some(history) = &self.history {
            let record = RunRecord::new(operation, count, duration_ms, status).started_at(started_at);
            if let Err(e) = history.record(&record) {
                tracing::warn!(error = %e, "failed to record run history");
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::InMemoryLedger;
    use crate::core::transport::DirectoryTransport;
    use crate::events::{EventChannel, ItemEvent};
    use std::fs;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> (ArchiveService, PathBuf) {
        let device = temp.path().join("device");
        fs::create_dir_all(&device).unwrap();
        let service = ArchiveService::builder(ArchiveConfig::rooted(temp.path()))
            .transport(Arc::new(DirectoryTransport::new(&device)))
            .build();
        (service, device)
    }

    #[test]
    fn backup_emits_events_in_order() {
        let temp = TempDir::new().unwrap();
        let (service, device) = service(&temp);
        fs::write(device.join("a.jpg"), b"alpha").unwrap();
        fs::write(device.join("b.jpg"), b"beta").unwrap();
        let (sender, receiver) = EventChannel::new();

        let result = service
            .backup_with_events(&sender, &CancellationToken::new())
            .unwrap();
        drop(sender);

        assert_eq!(result.archived, 2);
        let events: Vec<Event> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Run(RunEvent::Started { operation: Operation::Backup, total: 2 }))
        ));
        let indices: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Event::Item(ItemEvent::Progress(p)) => Some(p.index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(matches!(
            events.last(),
            Some(Event::Run(RunEvent::Completed { summary })) if summary.count == 2
        ));
    }

    #[test]
    fn busy_archive_is_refused() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service(&temp);
        let _held = RunLock::acquire(service.archive_root()).unwrap();

        let result = service.organize();

        assert!(matches!(result, Err(ArchiveError::Busy { .. })));
    }

    #[test]
    fn runs_are_recorded_in_history() {
        let temp = TempDir::new().unwrap();
        let (service, device) = service(&temp);
        fs::write(device.join("a.jpg"), b"alpha").unwrap();

        service.backup().unwrap();
        service.organize().unwrap();

        let page = service.history(10, 0).unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page.entries.iter().all(|r| r.status == RunStatus::Completed));
    }

    #[test]
    fn cancelled_run_emits_cancelled() {
        let temp = TempDir::new().unwrap();
        let (service, device) = service(&temp);
        fs::write(device.join("a.jpg"), b"alpha").unwrap();
        let (sender, receiver) = EventChannel::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service.backup_with_events(&sender, &cancel);
        drop(sender);

        assert!(matches!(result, Err(ArchiveError::Cancelled)));
        let last = receiver.iter().last();
        assert!(matches!(
            last,
            Some(Event::Run(RunEvent::Cancelled { operation: Operation::Backup }))
        ));
    }

    #[test]
    fn prune_gate_runs_before_lock_and_history() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service(&temp);

        let result = service.prune_remote(false, "DELETE FROM DEVICE");

        assert!(matches!(result, Err(ArchiveError::Prune(_))));
        assert_eq!(service.history(10, 0).unwrap().total_count, 0);
    }

    #[test]
    fn relocate_requires_confirmation() {
        let temp = TempDir::new().unwrap();
        let (mut service, _) = service(&temp);
        let target = temp.path().join("elsewhere");

        let result = service.relocate(&target, false);

        assert!(matches!(
            result,
            Err(ArchiveError::Config(ConfigError::RelocateNotConfirmed))
        ));
        assert!(!target.exists());
    }

    #[test]
    fn relocate_updates_and_saves_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.json");
        let config = ArchiveConfig::rooted(temp.path());
        fs::create_dir_all(&config.archive_root).unwrap();
        fs::write(config.archive_root.join("a.jpg"), b"alpha").unwrap();
        let mut service = ArchiveService::builder(config)
            .config_path(&config_path)
            .ledger(Box::new(InMemoryLedger::new()))
            .build();
        let target = temp.path().join("moved");

        let result = service.relocate(&target, true).unwrap();

        assert_eq!(result.files_moved, 1);
        assert_eq!(service.archive_root(), target.as_path());
        assert!(target.join("a.jpg").is_file());
        assert_eq!(ArchiveConfig::load(&config_path).unwrap().archive_root, target);
    }

    #[test]
    fn status_reports_layout_and_ledger() {
        let temp = TempDir::new().unwrap();
        let (service, device) = service(&temp);
        fs::write(device.join("a.jpg"), b"alpha").unwrap();
        service.backup().unwrap();

        let status = service.status().unwrap();

        assert_eq!(status.layout.unclassified, 1);
        assert_eq!(status.ledger_entries, 1);
    }
}
