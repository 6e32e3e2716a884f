use super::badging::BadgingDump;
use super::icon::{
    adaptive_icon_fallback, is_adaptive_icon_path, is_raster_path, mime_for_path,
    select_icon_path,
};
use super::inspector::{ApkInspector, InspectError};
use super::label::resolve_app_name;
use super::types::{ApkIcon, ExtractionResult};
use std::path::{Path, PathBuf};

/// Best-effort APK metadata extraction.
///
/// Only a dump tool that produces no output at all fails the call. Missing
/// labels, unusable icons and unreadable entries degrade to fallbacks.
pub struct ApkExtractor<I> {
    inspector: I,
    scratch_dir: PathBuf,
}

impl<I: ApkInspector> ApkExtractor<I> {
    /// `scratch_dir` holds per-call temp files; it is created on demand.
    pub fn new(inspector: I, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            inspector,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Extract package identity, display name and icon from `archive_path`.
    ///
    /// Steps:
    /// 1. Badging dump (empty output is the only fatal outcome)
    /// 2. Sanitize and parse the dump
    /// 3. Name cascade
    /// 4. Icon cascade, with adaptive-icon correction
    /// 5. Pull the icon bytes through a scoped temp file
    pub async fn extract(&self, archive_path: &Path) -> ExtractionResult {
        let raw = match self.inspector.dump_badging(archive_path).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                log::warn!("[ApkExtractor] Empty badging output for {}", archive_path.display());
                return ExtractionResult::failed(
                    "Failed to analyze package: dump tool produced no output",
                );
            }
            Err(e) => {
                log::warn!("[ApkExtractor] Badging failed for {}: {e}", archive_path.display());
                return ExtractionResult::failed(format!("Failed to analyze package: {e}"));
            }
        };

        let dump = BadgingDump::parse(&raw);
        if dump.package.is_none() {
            log::warn!(
                "[ApkExtractor] No package line in badging output for {}",
                archive_path.display()
            );
        }

        let identity = dump.identity();
        let app_name = resolve_app_name(&dump, archive_path);
        let icon = self.resolve_icon(&dump, archive_path).await;

        log::info!(
            "[ApkExtractor] {} v{} ({}) -> '{}' (icon: {})",
            identity.package_name,
            identity.version_name,
            identity.version_code,
            app_name,
            icon.as_ref().map(|i| i.internal_path.as_str()).unwrap_or("none")
        );

        ExtractionResult::resolved(identity, app_name, icon)
    }

    async fn resolve_icon(&self, dump: &BadgingDump, archive_path: &Path) -> Option<ApkIcon> {
        let mut path = select_icon_path(dump)?;

        if is_adaptive_icon_path(&path) {
            let entries = match self.inspector.list_entries(archive_path).await {
                Ok(entries) => entries,
                Err(e) => {
                    log::debug!("[ApkExtractor] Listing failed, dropping adaptive icon: {e}");
                    return None;
                }
            };
            match adaptive_icon_fallback(&entries) {
                Some(raster) => {
                    log::debug!("[ApkExtractor] Adaptive icon {path} replaced by {raster}");
                    path = raster;
                }
                None => {
                    log::debug!("[ApkExtractor] No launcher raster for adaptive icon {path}");
                    return None;
                }
            }
        }

        if !is_raster_path(&path) {
            log::debug!("[ApkExtractor] Icon {path} is not a PNG/WebP, skipping");
            return None;
        }

        match self.read_entry(archive_path, &path).await {
            Ok(bytes) if !bytes.is_empty() && image::guess_format(&bytes).is_ok() => Some(ApkIcon {
                bytes,
                mime: mime_for_path(&path),
                internal_path: path,
            }),
            Ok(bytes) => {
                log::debug!(
                    "[ApkExtractor] Icon {path} unusable ({} bytes, not an image)",
                    bytes.len()
                );
                None
            }
            Err(e) => {
                log::debug!("[ApkExtractor] Icon {path} could not be extracted: {e}");
                None
            }
        }
    }

    /// Read one entry through a temp file that is removed when this returns.
    async fn read_entry(&self, archive_path: &Path, entry: &str) -> Result<Vec<u8>, InspectError> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let suffix = Path::new(entry)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix("icon_")
            .suffix(&suffix)
            .tempfile_in(&self.scratch_dir)?
            .into_temp_path();

        self.inspector
            .extract_entry(archive_path, entry, &temp)
            .await?;
        let bytes = tokio::fs::read(&temp).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "tests/extractor_tests.rs"]
mod tests;
