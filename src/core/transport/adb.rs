//! Android Debug Bridge transport.

use super::{RemoteFile, RemoteTransport};
use crate::error::TransportError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Default camera folder on Android devices
pub const DEFAULT_REMOTE_DIR: &str = "/sdcard/DCIM/Camera";

/// Drives the `adb` binary
#[derive(Debug, Clone)]
pub struct AdbTransport {
    adb: PathBuf,
    remote_dir: String,
    serial: Option<String>,
}

impl AdbTransport {
    /// Resolve the adb binary: an explicit path wins, then `PATH`.
    pub fn new(adb_path: Option<&Path>, remote_dir: impl Into<String>) -> Result<Self, TransportError> {
        let adb = match adb_path {
            Some(path) if path.exists() => path.to_path_buf(),
            _ => which::which("adb").map_err(|_| TransportError::BinaryNotFound {
                name: "adb".to_string(),
            })?,
        };

        Ok(Self {
            adb,
            remote_dir: remote_dir.into(),
            serial: None,
        })
    }

    /// Target a specific device when several are attached
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    fn remote_path(&self, file: &RemoteFile) -> String {
        format!("{}/{}", self.remote_dir.trim_end_matches('/'), file.name)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
    }

    fn run(&self, mut command: Command, label: &str) -> Result<Output, TransportError> {
        command.output().map_err(|source| TransportError::Spawn {
            command: label.to_string(),
            source,
        })
    }

    fn check(output: Output, label: &str) -> Result<Output, TransportError> {
        if output.status.success() {
            return Ok(output);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Err(TransportError::CommandFailed {
            command: label.to_string(),
            reason: if stderr.is_empty() { stdout } else { stderr },
        })
    }
}

impl RemoteTransport for AdbTransport {
    fn is_connected(&self) -> Result<bool, TransportError> {
        let mut command = Command::new(&self.adb);
        command.arg("devices");
        let output = Self::check(self.run(command, "adb devices")?, "adb devices")?;
        let devices = parse_devices(&String::from_utf8_lossy(&output.stdout));

        Ok(match &self.serial {
            Some(serial) => devices.iter().any(|d| d == serial),
            None => !devices.is_empty(),
        })
    }

    fn list_remote_entries(&self) -> Result<Vec<RemoteFile>, TransportError> {
        let label = format!("adb shell ls {}", self.remote_dir);
        let mut command = self.command();
        command.arg("shell").arg("ls").arg(shell_quote(&self.remote_dir));
        let output = Self::check(self.run(command, &label)?, &label)?;

        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    fn pull(&self, file: &RemoteFile, local_dest: &Path) -> Result<(), TransportError> {
        let remote = self.remote_path(file);
        let label = format!("adb pull {}", remote);
        let mut command = self.command();
        command.arg("pull").arg(&remote).arg(local_dest);
        Self::check(self.run(command, &label)?, &label).map(|_| ())
    }

    fn delete_remote(&self, file: &RemoteFile) -> Result<(), TransportError> {
        let remote = self.remote_path(file);
        let label = format!("adb shell rm {}", remote);
        let mut command = self.command();
        command.arg("shell").arg("rm").arg("-f").arg(shell_quote(&remote));
        Self::check(self.run(command, &label)?, &label).map(|_| ())
    }
}

/// Serials of attached devices in the `device` state
fn parse_devices(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.starts_with("List of devices"))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(serial), Some("device")) => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// One name per line; CRLF from older adb builds is tolerated
fn parse_listing(stdout: &str) -> Vec<RemoteFile> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(RemoteFile::new)
        .collect()
}

/// `adb shell` joins its arguments into one remote shell command line
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
