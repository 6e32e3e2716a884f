use crate::database::models::{BuildRow, BuildType, NewBuild, ProjectRow};
use crate::database::{build_repo, project_repo};
use crate::services::activity::record_activity;
use crate::services::apk::{ApkExtractor, ApkInspector, ExtractionResult};
use crate::services::storage::{BlobStore, StoredFile};
use crate::types::errors::{AppError, AppResult};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

/// Where the archive of a new build comes from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Already staged by [`pre_analyze`]. `staged_path` is relative to the
    /// store root; `original_name` is the uploader's file name.
    Staged {
        staged_path: String,
        original_name: String,
    },
    /// A file outside the store, copied in first.
    Direct(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BuildUpload {
    pub source: UploadSource,
    pub build_type: BuildType,
    pub release_notes: Option<String>,
    pub uploaded_by: Option<String>,
}

/// Metadata shown to the uploader before the build is registered.
#[derive(Debug, Clone)]
pub struct PreAnalysis {
    pub metadata: ExtractionResult,
    pub staged_path: String,
    /// File name of the upload, used to name the stored archive.
    pub original_name: String,
    pub file_size: u64,
}

impl PreAnalysis {
    /// Source for registering the analysed upload.
    pub fn into_source(self) -> UploadSource {
        UploadSource::Staged {
            staged_path: self.staged_path,
            original_name: self.original_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredBuild {
    pub project: ProjectRow,
    pub build: BuildRow,
    pub metadata: ExtractionResult,
}

/// Stage `upload` and read its metadata. The staged copy is removed when the
/// package cannot be read.
pub async fn pre_analyze<I: ApkInspector>(
    store: &BlobStore,
    extractor: &ApkExtractor<I>,
    upload: &Path,
) -> AppResult<PreAnalysis> {
    let staged = store
        .stage_upload(upload)
        .map_err(|e| AppError::Storage(format!("Failed to stage {}: {e}", upload.display())))?;

    let metadata = extractor.extract(&staged.absolute).await;
    if !metadata.success {
        discard(store, &staged.relative);
        return Err(extraction_error(&metadata));
    }

    Ok(PreAnalysis {
        metadata,
        staged_path: staged.relative,
        original_name: upload
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_size: staged.size,
    })
}

/// Store the archive under `builds/`, attach it to its project (created on
/// first upload) and record a Pending build.
///
/// The stored archive is removed again if extraction or any database write
/// fails. Icon persistence is best-effort.
pub async fn register_build<I: ApkInspector>(
    pool: &SqlitePool,
    store: &BlobStore,
    extractor: &ApkExtractor<I>,
    request: BuildUpload,
) -> AppResult<RegisteredBuild> {
    let (staged, name_hint) = match &request.source {
        UploadSource::Staged {
            staged_path,
            original_name,
        } => (staged_path.clone(), file_stem(original_name)),
        UploadSource::Direct(path) => {
            let staged = store.stage_upload(path).map_err(|e| {
                AppError::Storage(format!("Failed to stage {}: {e}", path.display()))
            })?;
            (staged.relative, file_stem(&path.to_string_lossy()))
        }
    };

    let stored = match store.promote(&staged, &name_hint) {
        Ok(stored) => stored,
        Err(e) => {
            discard(store, &staged);
            return Err(AppError::Storage(format!("Failed to store upload: {e}")));
        }
    };

    let metadata = extractor.extract(&stored.absolute).await;
    if !metadata.success {
        discard(store, &stored.relative);
        return Err(extraction_error(&metadata));
    }
    if metadata.package_name.is_empty() {
        discard(store, &stored.relative);
        return Err(AppError::Validation(
            "Package name could not be read from the archive".into(),
        ));
    }

    match persist(pool, store, &stored, &metadata, &request).await {
        Ok((project, build)) => {
            log::info!(
                "[Builds] Registered build {} for {} ({} v{})",
                build.id,
                project.package_name,
                build.build_type,
                build.version_name
            );
            Ok(RegisteredBuild {
                project,
                build,
                metadata,
            })
        }
        Err(e) => {
            log::error!("[Builds] Registration failed, removing {}: {e}", stored.relative);
            discard(store, &stored.relative);
            Err(e)
        }
    }
}

async fn persist(
    pool: &SqlitePool,
    store: &BlobStore,
    stored: &StoredFile,
    metadata: &ExtractionResult,
    request: &BuildUpload,
) -> AppResult<(ProjectRow, BuildRow)> {
    let mut project =
        project_repo::first_or_create(pool, &metadata.package_name, &metadata.app_name).await?;

    if let Some(icon_path) = save_icon(pool, store, &project, metadata).await {
        project.icon_path = Some(icon_path);
    }

    let build_id = build_repo::insert_build(
        pool,
        &NewBuild {
            project_id: project.id,
            uploaded_by: request.uploaded_by.clone(),
            version_name: metadata.version_name.clone(),
            version_code: metadata.version_code,
            build_type: request.build_type,
            release_notes: request.release_notes.clone(),
            file_path: stored.relative.clone(),
            file_size: i64::try_from(stored.size).unwrap_or(i64::MAX),
        },
    )
    .await?;

    record_activity(
        pool,
        request.uploaded_by.as_deref(),
        "Build Uploaded",
        &format!(
            "Uploaded {} v{} ({})",
            metadata.app_name, metadata.version_name, request.build_type
        ),
        Some(("build", build_id)),
    )
    .await;

    let build = build_repo::get_build(pool, build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {build_id}")))?;
    Ok((project, build))
}

/// Write the extracted icon and point the project at it, replacing the
/// previous one. Failures are logged and swallowed.
async fn save_icon(
    pool: &SqlitePool,
    store: &BlobStore,
    project: &ProjectRow,
    metadata: &ExtractionResult,
) -> Option<String> {
    let (bytes, extension) = match (&metadata.icon_bytes, metadata.icon_extension()) {
        (Some(bytes), Some(extension)) => (bytes, extension),
        _ => return None,
    };

    let relative = match store.write_icon(project.id, extension, bytes) {
        Ok(relative) => relative,
        Err(e) => {
            log::warn!("[Builds] Could not save icon for project {}: {e}", project.id);
            return None;
        }
    };

    if let Err(e) = project_repo::set_icon_path(pool, project.id, &relative).await {
        log::warn!("[Builds] Could not update icon for project {}: {e}", project.id);
        discard(store, &relative);
        return None;
    }

    if let Some(previous) = project.icon_path.as_deref().filter(|p| *p != relative) {
        discard(store, previous);
    }
    Some(relative)
}

fn discard(store: &BlobStore, relative: &str) {
    if let Err(e) = store.delete(relative) {
        log::warn!("[Builds] Failed to remove {relative}: {e}");
    }
}

fn extraction_error(metadata: &ExtractionResult) -> AppError {
    AppError::Extraction(
        metadata
            .error
            .clone()
            .unwrap_or_else(|| "Failed to analyze package".into()),
    )
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/ingest_tests.rs"]
mod tests;
