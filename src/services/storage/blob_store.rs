use crate::services::fs_utils::file_utils::{move_file_cross_device, remove_file_if_exists};
use crate::services::fs_utils::path_utils::resolve_within;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const TEMP_DIR: &str = "temp";
pub const BUILDS_DIR: &str = "builds";
pub const ICONS_DIR: &str = "icons";

/// A file inside the store. `relative` is what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub relative: String,
    pub absolute: PathBuf,
    pub size: u64,
}

/// Blob store rooted at one directory with `temp/`, `builds/` and `icons/`.
///
/// Every relative path handed back in is validated against the root.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store subdirectories if missing.
    pub fn ensure_layout(&self) -> io::Result<()> {
        for dir in [TEMP_DIR, BUILDS_DIR, ICONS_DIR] {
            fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    pub fn absolute(&self, relative: &str) -> io::Result<PathBuf> {
        resolve_within(&self.root, relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.absolute(relative).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Copy an incoming upload into `temp/` under a fresh name.
    pub fn stage_upload(&self, source: &Path) -> io::Result<StoredFile> {
        let relative = format!("{TEMP_DIR}/{}.apk", uuid::Uuid::new_v4());
        let absolute = self.absolute(&relative)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = fs::copy(source, &absolute)?;
        log::debug!("[BlobStore] Staged {} as {relative}", source.display());
        Ok(StoredFile {
            relative,
            absolute,
            size,
        })
    }

    /// Move a staged upload into `builds/`, naming it after `name_hint`.
    pub fn promote(&self, staged: &str, name_hint: &str) -> io::Result<StoredFile> {
        let from = self.absolute(staged)?;
        if !from.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Staged upload is gone: {staged}"),
            ));
        }

        let relative = format!("{BUILDS_DIR}/{}", build_file_name(name_hint));
        let absolute = self.absolute(&relative)?;
        move_file_cross_device(&from, &absolute)?;
        let size = fs::metadata(&absolute)?.len();

        log::debug!("[BlobStore] Promoted {staged} to {relative}");
        Ok(StoredFile {
            relative,
            absolute,
            size,
        })
    }

    /// Persist icon bytes as `icons/project_<id>_<uuid>.<ext>`.
    pub fn write_icon(&self, project_id: i64, extension: &str, bytes: &[u8]) -> io::Result<String> {
        let relative = format!(
            "{ICONS_DIR}/project_{project_id}_{}.{extension}",
            uuid::Uuid::new_v4().simple()
        );
        let absolute = self.absolute(&relative)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&absolute, bytes)?;
        Ok(relative)
    }

    /// Remove a stored file. Returns `false` if it was already gone.
    pub fn delete(&self, relative: &str) -> io::Result<bool> {
        remove_file_if_exists(&self.absolute(relative)?)
    }
}

/// `<sanitized hint>_<uuid>.apk`; the hint falls back to `build`.
fn build_file_name(name_hint: &str) -> String {
    let options = sanitize_filename::Options {
        replacement: "_",
        ..Default::default()
    };
    let cleaned = sanitize_filename::sanitize_with_options(name_hint.trim(), options)
        .replace(' ', "_");
    let stem = if cleaned.is_empty() { "build".to_string() } else { cleaned };
    format!("{stem}_{}.apk", uuid::Uuid::new_v4().simple())
}
