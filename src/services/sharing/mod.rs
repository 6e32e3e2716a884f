//! Tokenised download links for stored builds.

use crate::database::build_repo;
use crate::database::models::{format_timestamp, ShareLinkRow};
use crate::database::share_repo::{self, NewShareLink};
use crate::services::activity::record_activity;
use crate::services::builds::{locate_archive, BuildDownload};
use crate::services::storage::BlobStore;
use crate::types::errors::{AppError, AppResult};
use chrono::{TimeDelta, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default)]
pub struct ShareOptions {
    /// Hours until the link stops working. `None` = never expires.
    pub expires_in_hours: Option<i64>,
    pub download_limit: Option<i64>,
    pub password: Option<String>,
}

pub async fn create_share_link(
    pool: &SqlitePool,
    build_id: i64,
    creator: Option<&str>,
    options: &ShareOptions,
) -> AppResult<ShareLinkRow> {
    let build = build_repo::get_build(pool, build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {build_id}")))?;
    if build.file_path.is_none() {
        return Err(AppError::Validation(format!(
            "Build {build_id} has no stored archive to share"
        )));
    }
    if matches!(options.download_limit, Some(limit) if limit < 1) {
        return Err(AppError::Validation("Download limit must be at least 1".into()));
    }
    if matches!(options.expires_in_hours, Some(hours) if hours < 1) {
        return Err(AppError::Validation("Expiry must be at least 1 hour".into()));
    }

    let password_hash = match options.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let expires_at = match options.expires_in_hours {
        Some(hours) => Some(expiry_after_hours(hours)?),
        None => None,
    };

    let link = NewShareLink {
        build_id,
        created_by: creator.map(str::to_string),
        token: uuid::Uuid::new_v4().simple().to_string(),
        download_limit: options.download_limit,
        expires_at,
        password_hash,
    };
    let id = share_repo::insert_share_link(pool, &link).await?;

    record_activity(
        pool,
        creator,
        "Share Link Created",
        &format!("Shared build {build_id} v{}", build.version_name),
        Some(("build", build_id)),
    )
    .await;
    log::info!("[Sharing] Link {id} created for build {build_id}");

    share_repo::get_share_link(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Share link {id}")))
}

/// Validate `token` (and `password` when the link has one), claim one
/// download and return the archive to serve.
pub async fn resolve_download(
    pool: &SqlitePool,
    store: &BlobStore,
    token: &str,
    password: Option<&str>,
    downloaded_by: Option<&str>,
) -> AppResult<BuildDownload> {
    let link = share_repo::get_by_token(pool, token)
        .await?
        .ok_or_else(|| AppError::NotFound("Share link".into()))?;

    let now = Utc::now();
    if !link.is_valid(now) {
        return Err(link_exhausted());
    }
    if let Some(hash) = link.password_hash.as_deref() {
        if !verify_share_password(hash, password.unwrap_or_default()) {
            return Err(AppError::Forbidden("Incorrect password".into()));
        }
    }

    let build = build_repo::get_build(pool, link.build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {}", link.build_id)))?;
    let download = locate_archive(pool, store, &build).await?;

    // The row read above may be stale; the claim re-checks limit and expiry.
    if !share_repo::record_download(pool, &link, downloaded_by, &format_timestamp(now)).await? {
        return Err(link_exhausted());
    }
    Ok(download)
}

pub async fn delete_share_link(pool: &SqlitePool, link_id: i64, actor: Option<&str>) -> AppResult<()> {
    let link = share_repo::get_share_link(pool, link_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Share link {link_id}")))?;
    share_repo::delete_share_link(pool, link_id).await?;

    record_activity(
        pool,
        actor,
        "Share Link Deleted",
        &format!("Revoked share link {link_id}"),
        Some(("build", link.build_id)),
    )
    .await;
    Ok(())
}

fn hash_password(password: &str) -> AppResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Validation(format!("Could not hash password: {e}")))
}

pub fn verify_share_password(hash: &str, password: &str) -> bool {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn link_exhausted() -> AppError {
    AppError::Forbidden("This link is no longer valid".into())
}

/// `now + hours`, refusing values past the representable calendar.
fn expiry_after_hours(hours: i64) -> AppResult<String> {
    TimeDelta::try_hours(hours)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .map(format_timestamp)
        .ok_or_else(|| AppError::Validation(format!("Expiry of {hours} hours is out of range")))
}

#[cfg(test)]
#[path = "tests/sharing_tests.rs"]
mod tests;
