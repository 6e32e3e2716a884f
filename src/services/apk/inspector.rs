//! Archive inspection seam.
//!
//! Binary manifest parsing is delegated to `aapt`; the extractor only ever sees
//! the text it prints plus single archive entries. `ToolInspector` is the
//! production implementation, tests inject an in-memory one.

use crate::services::config::{EntryReader, ExtractorConfig};
use std::ffi::OsStr;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: String, after: Duration },

    #[error("Entry not found in archive: {0}")]
    EntryMissing(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Background task failed: {0}")]
    Join(String),
}

/// Operations the extractor needs from an APK.
pub trait ApkInspector: Send + Sync {
    /// Badging text (stdout and stderr combined). An empty string means the
    /// tool produced nothing.
    fn dump_badging(&self, apk: &Path) -> impl Future<Output = Result<String, InspectError>> + Send;

    /// Write the raw bytes of `entry` to `dest`.
    fn extract_entry(
        &self,
        apk: &Path,
        entry: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<(), InspectError>> + Send;

    /// All entry paths inside the archive.
    fn list_entries(&self, apk: &Path) -> impl Future<Output = Result<Vec<String>, InspectError>> + Send;
}

/// Shells out to `aapt` for badging; reads entries natively or through `unzip`.
#[derive(Debug, Clone)]
pub struct ToolInspector {
    aapt: PathBuf,
    unzip: PathBuf,
    entry_reader: EntryReader,
    timeout: Duration,
}

impl ToolInspector {
    pub fn new(aapt: impl Into<PathBuf>) -> Self {
        Self {
            aapt: aapt.into(),
            unzip: PathBuf::from("unzip"),
            entry_reader: EntryReader::Native,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            aapt: config.aapt_path.clone(),
            unzip: config.unzip_path.clone(),
            entry_reader: config.entry_reader,
            timeout: Duration::from_secs(config.tool_timeout_secs.max(1)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `program` to completion, killing it if it outlives the timeout.
    async fn run_tool(&self, program: &Path, args: &[&OsStr]) -> Result<Output, InspectError> {
        let tool = program.display().to_string();
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InspectError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(InspectError::Timeout {
                tool,
                after: self.timeout,
            }),
        }
    }
}

impl ApkInspector for ToolInspector {
    async fn dump_badging(&self, apk: &Path) -> Result<String, InspectError> {
        let output = self
            .run_tool(&self.aapt, &[OsStr::new("dump"), OsStr::new("badging"), apk.as_os_str()])
            .await?;

        if !output.status.success() {
            log::warn!(
                "[Inspector] aapt exited with {} for {}",
                output.status,
                apk.display()
            );
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }
        Ok(text)
    }

    async fn extract_entry(&self, apk: &Path, entry: &str, dest: &Path) -> Result<(), InspectError> {
        match self.entry_reader {
            EntryReader::Native => {
                let apk = apk.to_path_buf();
                let entry = entry.to_string();
                let dest = dest.to_path_buf();
                tokio::task::spawn_blocking(move || extract_entry_native(&apk, &entry, &dest))
                    .await
                    .map_err(|e| InspectError::Join(e.to_string()))?
            }
            EntryReader::Unzip => {
                let output = self
                    .run_tool(
                        &self.unzip,
                        &[OsStr::new("-p"), apk.as_os_str(), OsStr::new(entry)],
                    )
                    .await?;
                if !output.status.success() && output.stdout.is_empty() {
                    return Err(InspectError::EntryMissing(entry.to_string()));
                }
                tokio::fs::write(dest, &output.stdout).await?;
                Ok(())
            }
        }
    }

    async fn list_entries(&self, apk: &Path) -> Result<Vec<String>, InspectError> {
        match self.entry_reader {
            EntryReader::Native => {
                let apk = apk.to_path_buf();
                tokio::task::spawn_blocking(move || list_entries_native(&apk))
                    .await
                    .map_err(|e| InspectError::Join(e.to_string()))?
            }
            EntryReader::Unzip => {
                let output = self
                    .run_tool(&self.unzip, &[OsStr::new("-Z1"), apk.as_os_str()])
                    .await?;
                Ok(String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect())
            }
        }
    }
}

fn extract_entry_native(apk: &Path, entry: &str, dest: &Path) -> Result<(), InspectError> {
    let file = fs::File::open(apk)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut zipped = match archive.by_name(entry) {
        Ok(zipped) => zipped,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(InspectError::EntryMissing(entry.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let mut out = fs::File::create(dest)?;
    io::copy(&mut zipped, &mut out)?;
    Ok(())
}

fn list_entries_native(apk: &Path) -> Result<Vec<String>, InspectError> {
    let file = fs::File::open(apk)?;
    let archive = zip::ZipArchive::new(file)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

#[cfg(test)]
#[path = "tests/inspector_tests.rs"]
mod tests;
