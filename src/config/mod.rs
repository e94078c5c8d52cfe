//! # Config Module
//!
//! Where the archive, ledger and scratch directories live, and how to reach
//! the device. Stored as a JSON side file and loaded once per process; the
//! CLI overrides individual fields from flags before handing it on.

use crate::core::classifier::FallbackPolicy;
use crate::core::transport::DEFAULT_REMOTE_DIR;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "dcim-archiver";
const CONFIG_FILE: &str = "config.json";

/// How to reach the phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Explicit `adb` binary; looked up on `PATH` when unset
    pub adb_path: Option<PathBuf>,
    /// Camera folder on the device
    pub remote_dir: String,
    /// Device serial, for when several are attached
    pub serial: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: None,
            remote_dir: DEFAULT_REMOTE_DIR.to_string(),
            serial: None,
        }
    }
}

/// Persistent settings for the archiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub archive_root: PathBuf,
    /// Text file with one archived content hash per line
    pub ledger_path: PathBuf,
    /// Scratch directory for backup pulls
    pub staging_dir: PathBuf,
    /// Scratch directory for prune verification pulls
    pub verify_dir: PathBuf,
    /// Run history database. `None` disables history.
    pub history_path: Option<PathBuf>,
    pub fallback: FallbackPolicy,
    pub device: DeviceConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::rooted(&base)
    }
}

impl ArchiveConfig {
    /// Everything under one base directory
    pub fn rooted(base: &Path) -> Self {
        Self {
            archive_root: base.join("DCIM_Backups"),
            ledger_path: base.join("backup_log.txt"),
            staging_dir: base.join("temp_download"),
            verify_dir: base.join("temp_verify"),
            history_path: Some(base.join("history.db")),
            fallback: FallbackPolicy::default(),
            device: DeviceConfig::default(),
        }
    }

    /// `<config dir>/dcim-archiver/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Read the side file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the side file, replacing any previous version in one rename
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(write_error)?;
        fs::rename(&temp_path, path).map_err(write_error)?;
        Ok(())
    }
}
