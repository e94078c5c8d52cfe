//! # CLI Module
//!
//! Command-line interface for the phone archiver.
//!
//! ## Usage
//! ```bash
//! # Copy new photos from the phone
//! dcim-archiver backup
//!
//! # Use a mounted folder instead of adb
//! dcim-archiver --device-dir /media/phone/DCIM/Camera backup
//!
//! # File the archive into year folders, and back
//! dcim-archiver organize
//! dcim-archiver undo --yes
//!
//! # Free space on the phone (asks for the confirmation phrase)
//! dcim-archiver prune
//! ```
//!
//! Ctrl-C stops a running operation after the current file. A second
//! Ctrl-C exits immediately.

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use dcim_archiver::config::ArchiveConfig;
use dcim_archiver::core::archive::ArchiveService;
use dcim_archiver::core::classifier::FallbackPolicy;
use dcim_archiver::core::history::RunStatus;
use dcim_archiver::core::organize::RenamedFile;
use dcim_archiver::core::prune::CONFIRMATION_PHRASE;
use dcim_archiver::core::transport::DirectoryTransport;
use dcim_archiver::core::CancellationToken;
use dcim_archiver::error::{PruneError, Result};
use dcim_archiver::events::{Event, EventChannel, EventSender, ItemEvent, RunEvent};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/// DCIM Archiver - Back up your phone without keeping anything twice
#[derive(Parser, Debug)]
#[command(name = "dcim-archiver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Archive root directory
    #[arg(long, global = true)]
    archive: Option<PathBuf>,

    /// Path to the adb binary
    #[arg(long, global = true)]
    adb: Option<PathBuf>,

    /// Camera folder on the device
    #[arg(long, global = true)]
    remote_dir: Option<String>,

    /// Treat a local or mounted folder as the device instead of using adb
    #[arg(long, global = true)]
    device_dir: Option<PathBuf>,

    /// Where files without a capture date go
    #[arg(long, global = true)]
    fallback: Option<Fallback>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy new files from the device into the archive
    Backup,

    /// Move loose archive files into year folders
    Organize,

    /// Move files out of year folders back into the archive root
    Undo {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete files from the device that are verifiably archived
    Prune {
        /// Skip the yes/no question
        #[arg(short, long)]
        yes: bool,

        /// Confirmation phrase, for non-interactive use
        #[arg(long)]
        token: Option<String>,
    },

    /// Show the archive layout and ledger size
    Status,

    /// Show past runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Delete all recorded runs
        #[arg(long)]
        clear: bool,
    },

    /// Move the archive to a new location
    Relocate {
        /// New archive root
        new_root: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Fallback {
    /// Put undated files in `Unknown`
    Unknown,
    /// Use the file modification year
    Mtime,
}

impl From<Fallback> for FallbackPolicy {
    fn from(fallback: Fallback) -> Self {
        match fallback {
            Fallback::Unknown => FallbackPolicy::Unknown,
            Fallback::Mtime => FallbackPolicy::ModifiedTime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ArchiveConfig::default_path()?,
    };
    let mut config = ArchiveConfig::load(&config_path)?;
    apply_overrides(&cli, &mut config);

    let mut builder = ArchiveService::builder(config.clone()).config_path(&config_path);
    if let Some(dir) = &cli.device_dir {
        builder = builder.transport(Arc::new(DirectoryTransport::new(dir)));
    }
    let mut service = builder.build();

    let term = Term::stderr();
    let output = cli.output;

    match cli.command {
        Commands::Backup => {
            let result = with_progress(output, |events, cancel| {
                service.backup_with_events(events, cancel)
            })?;
            report(output, &result, || {
                line(&term, &format!("{} Backup complete", style("✓").green().bold()));
                line(&term, &format!("  {} new files archived", style(result.archived).cyan()));
                line(&term, &format!("  {} already archived", style(result.duplicates).dim()));
                if result.skipped > 0 {
                    line(&term, &format!("  {} could not be copied", style(result.skipped).yellow()));
                }
                print_renamed(&term, &result.renamed);
                print_duration(&term, result.duration_ms);
            });
        }
        Commands::Organize => {
            let result = with_progress(output, |events, cancel| {
                service.organize_with_events(events, cancel)
            })?;
            report(output, &result, || {
                line(&term, &format!("{} Organized archive", style("✓").green().bold()));
                line(&term, &format!("  {} files moved", style(result.files_moved).cyan()));
                for bucket in &result.by_bucket {
                    line(&term, &format!("    {:<8} {}", bucket.bucket, bucket.count));
                }
                print_renamed(&term, &result.renamed);
                print_duration(&term, result.duration_ms);
            });
        }
        Commands::Undo { yes } => {
            if !yes && !ask(&term, "Move every file out of its year folder?") {
                line(&term, "Nothing changed.");
                return Ok(());
            }
            let result = with_progress(output, |events, cancel| {
                service.undo_organize_with_events(events, cancel)
            })?;
            report(output, &result, || {
                line(&term, &format!("{} Organization undone", style("✓").green().bold()));
                line(&term, &format!("  {} files restored", style(result.files_restored).cyan()));
                line(&term, &format!("  {} folders removed", result.folders_removed));
                for kept in &result.folders_kept {
                    line(&term, &format!("  {} kept {} (not empty)", style("!").yellow(), kept.display()));
                }
                print_renamed(&term, &result.renamed);
                print_duration(&term, result.duration_ms);
            });
        }
        Commands::Prune { yes, token } => {
            let confirmed = yes || ask(&term, "Delete archived files from the device? This cannot be undone.");
            if !confirmed {
                return Err(PruneError::NotConfirmed.into());
            }
            let token = match token {
                Some(token) => token,
                None => {
                    line(
                        &term,
                        &format!("Type {} to continue:", style(CONFIRMATION_PHRASE).red().bold()),
                    );
                    term.read_line().unwrap_or_default()
                }
            };
            let result = with_progress(output, |events, cancel| {
                service.prune_remote_with_events(confirmed, token.trim_end_matches(['\r', '\n']), events, cancel)
            })?;
            report(output, &result, || {
                line(&term, &format!("{} Device cleanup complete", style("✓").green().bold()));
                line(&term, &format!("  {} files deleted from the device", style(result.deleted).cyan()));
                line(&term, &format!("  {} kept (not archived)", result.kept));
                if result.skipped > 0 {
                    line(&term, &format!("  {} could not be verified", style(result.skipped).yellow()));
                }
                if result.failed_deletes > 0 {
                    line(&term, &format!("  {} deletions refused by the device", style(result.failed_deletes).red()));
                }
                print_duration(&term, result.duration_ms);
            });
        }
        Commands::Status => {
            let status = service.status()?;
            report(output, &status, || {
                line(&term, &format!("{}", style(status.archive_root.display()).bold()));
                line(&term, &format!("  {} files in the ledger", style(status.ledger_entries).cyan()));
                line(&term, &format!("  {} files not yet organized", status.layout.unclassified));
                for bucket in &status.layout.buckets {
                    line(&term, &format!("    {:<8} {}", bucket.bucket, bucket.count));
                }
                for dir in &status.layout.other_dirs {
                    line(&term, &format!("  {} {}", style("other:").dim(), dir.display()));
                }
            });
        }
        Commands::History { limit, clear } => {
            if clear {
                let removed = service.clear_history()?;
                line(&term, &format!("Removed {} runs from history.", removed));
                return Ok(());
            }
            let page = service.history(limit, 0)?;
            report(output, &page, || {
                if page.entries.is_empty() {
                    line(&term, "No runs recorded.");
                }
                for run in &page.entries {
                    let status = match &run.status {
                        RunStatus::Completed => style("completed".to_string()).green(),
                        RunStatus::Cancelled => style("cancelled".to_string()).yellow(),
                        RunStatus::Error(message) => style(format!("error: {}", message)).red(),
                    };
                    line(
                        &term,
                        &format!(
                            "  {}  {:<9} {:>6}  {}",
                            run.started_at.format("%Y-%m-%d %H:%M"),
                            run.operation.as_str(),
                            run.count,
                            status
                        ),
                    );
                }
            });
        }
        Commands::Relocate { new_root, yes } => {
            let question = format!(
                "Move the archive from {} to {}?",
                service.archive_root().display(),
                new_root.display()
            );
            let confirmed = yes || ask(&term, &question);
            let result = with_progress(output, |events, cancel| {
                service.relocate_with_events(&new_root, confirmed, events, cancel)
            })?;
            report(output, &result, || {
                line(&term, &format!("{} Archive moved to {}", style("✓").green().bold(), new_root.display()));
                line(&term, &format!("  {} files moved", style(result.files_moved).cyan()));
                for entry in &result.left_behind {
                    line(&term, &format!("  {} left behind {}", style("!").yellow(), entry.display()));
                }
                print_renamed(&term, &result.renamed);
                print_duration(&term, result.duration_ms);
            });
        }
        Commands::Config { save } => {
            if save {
                config.save(&config_path)?;
                line(&term, &format!("Saved {}", config_path.display()));
            }
            print_json(&config);
        }
    }

    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut ArchiveConfig) {
    if let Some(archive) = &cli.archive {
        config.archive_root = archive.clone();
    }
    if let Some(adb) = &cli.adb {
        config.device.adb_path = Some(adb.clone());
    }
    if let Some(remote_dir) = &cli.remote_dir {
        config.device.remote_dir = remote_dir.clone();
    }
    if let Some(fallback) = cli.fallback {
        config.fallback = fallback.into();
    }
}

/// Run an operation on this thread while a second thread drives the
/// progress bar from its events
fn with_progress<T>(
    output: OutputFormat,
    operation: impl FnOnce(&EventSender, &CancellationToken) -> Result<T>,
) -> Result<T> {
    let (sender, receiver) = EventChannel::new();

    let progress = (output == OutputFormat::Pretty).then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg:<12} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            for _ in receiver.iter() {}
            return;
        };
        for event in receiver.iter() {
            match event {
                Event::Run(RunEvent::Started { operation, total }) => {
                    pb.set_length(total as u64);
                    pb.set_position(0);
                    pb.set_message(operation.to_string());
                }
                Event::Item(ItemEvent::Progress(p)) => {
                    pb.set_position(p.index as u64);
                }
                Event::Item(ItemEvent::Skipped { name, reason, .. }) => {
                    pb.println(format!("{} {}: {}", style("!").yellow(), name, reason));
                }
                Event::Run(_) => pb.finish_and_clear(),
            }
        }
    });

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if interrupt(&handler_token) {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let result = operation(&sender, &cancel);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    result
}

/// Exit status after a second interrupt, as shells report SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cancel on the first interrupt. Returns true when the run was already
/// cancelled and the process should exit.
fn interrupt(cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return true;
    }
    eprintln!("Stopping after the current file. Press Ctrl-C again to quit now.");
    cancel.cancel();
    false
}

fn report<T: Serialize>(output: OutputFormat, value: &T, pretty: impl FnOnce()) {
    match output {
        OutputFormat::Pretty => pretty(),
        OutputFormat::Json => print_json(value),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn ask(term: &Term, question: &str) -> bool {
    if !term.is_term() {
        return false;
    }
    line(term, &format!("{} [y/N]", question));
    matches!(
        term.read_line().map(|answer| answer.trim().to_lowercase()),
        Ok(answer) if answer == "y" || answer == "yes"
    )
}

fn line(term: &Term, text: &str) {
    term.write_line(text).ok();
}

fn print_renamed(term: &Term, renamed: &[RenamedFile]) {
    if renamed.is_empty() {
        return;
    }
    line(term, &format!("  {} renamed to avoid overwriting:", style(renamed.len()).yellow()));
    for file in renamed {
        line(
            term,
            &format!("    {} -> {}", file.original.display(), file.destination.display()),
        );
    }
}

fn print_duration(term: &Term, duration_ms: u64) {
    line(
        term,
        &format!("  {}", style(format!("took {:.1}s", duration_ms as f64 / 1000.0)).dim()),
    );
}
