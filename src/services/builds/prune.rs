use crate::database::build_repo;
use crate::database::models::format_timestamp;
use crate::services::activity::record_activity;
use crate::services::storage::BlobStore;
use crate::types::errors::{AppError, AppResult};
use chrono::{TimeDelta, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Archives actually deleted.
    pub pruned: usize,
    pub freed_bytes: u64,
    /// Relative paths that could not be removed; their records are untouched.
    pub failures: Vec<String>,
}

/// Delete the archives of Rejected builds older than `days`, keeping the
/// records. Records whose archive is already missing are cleared without
/// being counted.
pub async fn prune_rejected_builds(
    pool: &SqlitePool,
    store: &BlobStore,
    days: u32,
) -> AppResult<PruneReport> {
    let cutoff = TimeDelta::try_days(i64::from(days))
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .map(format_timestamp)
        .ok_or_else(|| AppError::Validation(format!("Retention of {days} days is out of range")))?;
    let candidates = build_repo::rejected_with_files_before(pool, &cutoff).await?;
    log::info!(
        "[Prune] {} rejected build(s) older than {days} day(s)",
        candidates.len()
    );

    let mut report = PruneReport::default();
    for build in candidates {
        let Some(file_path) = build.file_path.as_deref() else {
            continue;
        };

        match store.delete(file_path) {
            Ok(existed) => {
                build_repo::clear_file_path(pool, build.id).await?;
                if existed {
                    report.pruned += 1;
                    report.freed_bytes += u64::try_from(build.file_size).unwrap_or(0);
                } else {
                    log::debug!("[Prune] Archive {file_path} already missing");
                }
            }
            Err(e) => {
                log::warn!("[Prune] Failed to delete {file_path}: {e}");
                report.failures.push(file_path.to_string());
            }
        }
    }

    if report.pruned > 0 {
        record_activity(
            pool,
            None,
            "Builds Pruned",
            &format!(
                "Removed {} rejected archive(s) older than {days} day(s)",
                report.pruned
            ),
            None,
        )
        .await;
    }
    Ok(report)
}

#[cfg(test)]
#[path = "tests/prune_tests.rs"]
mod tests;
