use crate::database::models::BuildRow;
use crate::database::{build_repo, project_repo};
use crate::services::storage::BlobStore;
use crate::types::errors::{AppError, AppResult};
use sqlx::SqlitePool;
use std::path::PathBuf;

/// An archive ready to be served: where it lives and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDownload {
    pub build_id: i64,
    pub path: PathBuf,
    pub file_name: String,
}

/// Direct download by an authenticated user. Recorded without a share link.
pub async fn download_build(
    pool: &SqlitePool,
    store: &BlobStore,
    build_id: i64,
    downloaded_by: Option<&str>,
) -> AppResult<BuildDownload> {
    let build = build_repo::get_build(pool, build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {build_id}")))?;
    let download = locate_archive(pool, store, &build).await?;

    build_repo::record_direct_download(pool, build_id, downloaded_by).await?;
    log::info!(
        "[Builds] Build {build_id} downloaded by {}",
        downloaded_by.unwrap_or("anonymous")
    );
    Ok(download)
}

/// Resolve the stored archive of `build`. Pruned or vanished archives are
/// `NotFound`.
pub(crate) async fn locate_archive(
    pool: &SqlitePool,
    store: &BlobStore,
    build: &BuildRow,
) -> AppResult<BuildDownload> {
    let file_path = build
        .file_path
        .as_deref()
        .ok_or_else(|| AppError::NotFound(format!("Archive of build {}", build.id)))?;
    let path = store
        .absolute(file_path)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    if !path.is_file() {
        return Err(AppError::NotFound(format!("Archive {file_path}")));
    }

    let project_name = project_repo::get_project(pool, build.project_id)
        .await?
        .map(|p| p.name)
        .unwrap_or_else(|| "build".into());

    Ok(BuildDownload {
        build_id: build.id,
        path,
        file_name: download_file_name(&project_name, &build.version_name),
    })
}

/// `<project>_v<version>.apk`, safe for a Content-Disposition header.
pub fn download_file_name(project_name: &str, version_name: &str) -> String {
    let raw = format!("{project_name}_v{version_name}.apk");
    let options = sanitize_filename::Options {
        replacement: "_",
        ..Default::default()
    };
    sanitize_filename::sanitize_with_options(raw, options).replace(' ', "_")
}

#[cfg(test)]
#[path = "tests/download_tests.rs"]
mod tests;
