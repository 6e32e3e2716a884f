pub mod models;

pub use models::*;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_CONFIG_FILE: &str = "apkdash.json";

/// JSON-file backed settings with environment overrides layered on top.
pub struct ConfigService {
    config_path: PathBuf,
    settings: Mutex<AppSettings>,
}

impl ConfigService {
    /// Load settings from `config_path` and apply `APKDASH_*` overrides.
    /// A missing or corrupt file falls back to defaults.
    pub fn new(config_path: PathBuf) -> Self {
        let mut settings = Self::load_from_file(&config_path);
        apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

        Self {
            config_path,
            settings: Mutex::new(settings),
        }
    }

    pub fn load_from_file(config_path: &Path) -> AppSettings {
        let content = match fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No config at {}, using defaults",
                    config_path.display()
                );
                return AppSettings::default();
            }
            Err(e) => {
                log::error!("Failed to read config {}: {e}", config_path.display());
                return AppSettings::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::error!("Corrupt config {}: {e}", config_path.display());
            AppSettings::default()
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_settings(&self) -> AppSettings {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Write settings through a sibling temp file so readers never see a
    /// half-written config.
    pub fn save_settings(&self, new_settings: AppSettings) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&new_settings).map_err(|e| e.to_string())?;

        let parent = match self.config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| format!("Failed to create config dir: {e}"))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| format!("Failed to create temp config: {e}"))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| format!("Failed to write temp config: {e}"))?;
        temp.persist(&self.config_path)
            .map_err(|e| format!("Failed to replace config: {e}"))?;

        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_settings;
        Ok(())
    }
}

/// Apply `APKDASH_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut AppSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(root) = lookup("APKDASH_STORAGE_ROOT") {
        settings.storage_root = PathBuf::from(root);
    }
    if let Some(url) = lookup("APKDASH_DATABASE_URL") {
        settings.database_url = url;
    }
    if let Some(aapt) = lookup("APKDASH_AAPT") {
        settings.extractor.aapt_path = PathBuf::from(aapt);
    }
    if let Some(secs) = lookup("APKDASH_TOOL_TIMEOUT_SECS") {
        match secs.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => settings.extractor.tool_timeout_secs = secs,
            _ => log::warn!("Ignoring invalid APKDASH_TOOL_TIMEOUT_SECS: {secs}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
