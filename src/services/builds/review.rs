use crate::database::build_repo;
use crate::database::models::{BuildRow, BuildStatus};
use crate::services::activity::record_activity;
use crate::services::storage::BlobStore;
use crate::types::errors::{AppError, AppResult};
use sqlx::SqlitePool;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn status(self) -> BuildStatus {
        match self {
            ReviewDecision::Approve => BuildStatus::Approved,
            ReviewDecision::Reject => BuildStatus::Rejected,
        }
    }

    fn action(self) -> &'static str {
        match self {
            ReviewDecision::Approve => "Build Approved",
            ReviewDecision::Reject => "Build Rejected",
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" | "approved" => Ok(ReviewDecision::Approve),
            "reject" | "rejected" => Ok(ReviewDecision::Reject),
            _ => Err(format!("Unknown review decision: {s}")),
        }
    }
}

/// Move a Pending build to Approved or Rejected.
pub async fn review_build(
    pool: &SqlitePool,
    build_id: i64,
    decision: ReviewDecision,
    reviewer: Option<&str>,
    remarks: Option<&str>,
) -> AppResult<BuildRow> {
    let build = load_build(pool, build_id).await?;
    if build.status() != BuildStatus::Pending {
        return Err(AppError::Validation(format!(
            "Build {build_id} is already {}",
            build.status()
        )));
    }

    let remarks = remarks.map(str::trim).filter(|r| !r.is_empty());
    let changed = build_repo::set_review(pool, build_id, decision.status(), reviewer, remarks).await?;
    if !changed {
        // Reviewed concurrently between the read and the update.
        return Err(AppError::Validation(format!(
            "Build {build_id} has already been reviewed"
        )));
    }

    let description = match remarks {
        Some(remarks) => format!("Build {build_id} v{}: {remarks}", build.version_name),
        None => format!("Build {build_id} v{}", build.version_name),
    };
    record_activity(pool, reviewer, decision.action(), &description, Some(("build", build_id)))
        .await;

    load_build(pool, build_id).await
}

/// Remove a build record and its stored archive.
pub async fn delete_build(
    pool: &SqlitePool,
    store: &BlobStore,
    build_id: i64,
    actor: Option<&str>,
) -> AppResult<()> {
    let build = load_build(pool, build_id).await?;
    build_repo::delete_build(pool, build_id).await?;

    if let Some(file_path) = build.file_path.as_deref() {
        match store.delete(file_path) {
            Ok(true) => {}
            Ok(false) => log::debug!("[Builds] Archive {file_path} was already gone"),
            Err(e) => log::warn!("[Builds] Failed to remove archive {file_path}: {e}"),
        }
    }

    record_activity(
        pool,
        actor,
        "Build Deleted",
        &format!("Deleted build {build_id} v{}", build.version_name),
        Some(("build", build_id)),
    )
    .await;
    Ok(())
}

async fn load_build(pool: &SqlitePool, build_id: i64) -> AppResult<BuildRow> {
    build_repo::get_build(pool, build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {build_id}")))
}

#[cfg(test)]
#[path = "tests/review_tests.rs"]
mod tests;
