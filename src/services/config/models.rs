use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How single archive entries are read.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryReader {
    /// In-process via the `zip` crate.
    #[default]
    Native,
    /// `unzip -p` / `unzip -Z1` subprocesses.
    Unzip,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ExtractorConfig {
    pub aapt_path: PathBuf,
    pub unzip_path: PathBuf,
    pub entry_reader: EntryReader,
    pub tool_timeout_secs: u64,
    /// Defaults to `<storage_root>/apk_temp` when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            aapt_path: PathBuf::from("aapt"),
            unzip_path: PathBuf::from("unzip"),
            entry_reader: EntryReader::Native,
            tool_timeout_secs: 30,
            scratch_dir: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    /// Rejected builds older than this lose their stored archive.
    pub rejected_build_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            rejected_build_days: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SharingConfig {
    /// Expiry applied when a link is created without one. `None` = never.
    pub default_expiry_hours: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppSettings {
    pub storage_root: PathBuf,
    pub database_url: String,
    pub extractor: ExtractorConfig,
    pub retention: RetentionConfig,
    pub sharing: SharingConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            database_url: "sqlite://apkdash.db".into(),
            extractor: ExtractorConfig::default(),
            retention: RetentionConfig::default(),
            sharing: SharingConfig::default(),
        }
    }
}

impl AppSettings {
    pub fn scratch_dir(&self) -> PathBuf {
        self.extractor
            .scratch_dir
            .clone()
            .unwrap_or_else(|| self.storage_root.join("apk_temp"))
    }
}
