use super::models::{now_timestamp, BuildRow, BuildStatus, NewBuild};
use sqlx::SqlitePool;

const BUILD_COLUMNS: &str = "id, project_id, uploaded_by, version_name, version_code, build_type, \
     release_notes, file_path, file_size, status, reviewed_by, review_remarks, created_at, updated_at";

// ── Builds CRUD ─────────────────────────────────────────────

/// Insert a Pending build and return its id.
pub async fn insert_build(pool: &SqlitePool, build: &NewBuild) -> Result<i64, sqlx::Error> {
    insert_build_at(pool, build, &now_timestamp()).await
}

/// Insert with an explicit creation timestamp (imports and retention tests).
pub async fn insert_build_at(
    pool: &SqlitePool,
    build: &NewBuild,
    created_at: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO builds (project_id, uploaded_by, version_name, version_code, build_type,
             release_notes, file_path, file_size, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(build.project_id)
    .bind(&build.uploaded_by)
    .bind(&build.version_name)
    .bind(build.version_code)
    .bind(build.build_type.to_string())
    .bind(&build.release_notes)
    .bind(&build.file_path)
    .bind(build.file_size)
    .bind(BuildStatus::Pending.to_string())
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_build(pool: &SqlitePool, id: i64) -> Result<Option<BuildRow>, sqlx::Error> {
    sqlx::query_as::<_, BuildRow>(&format!("SELECT {BUILD_COLUMNS} FROM builds WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Builds of one project, newest first.
pub async fn builds_for_project(
    pool: &SqlitePool,
    project_id: i64,
) -> Result<Vec<BuildRow>, sqlx::Error> {
    sqlx::query_as::<_, BuildRow>(&format!(
        "SELECT {BUILD_COLUMNS} FROM builds WHERE project_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Record a review decision. Only Pending builds are updated; returns whether
/// a row changed.
pub async fn set_review(
    pool: &SqlitePool,
    id: i64,
    status: BuildStatus,
    reviewed_by: Option<&str>,
    remarks: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE builds SET status = ?, reviewed_by = ?, review_remarks = ?, updated_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(status.to_string())
    .bind(reviewed_by)
    .bind(remarks)
    .bind(now_timestamp())
    .bind(id)
    .bind(BuildStatus::Pending.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Rejected builds created before `cutoff` that still own an archive.
pub async fn rejected_with_files_before(
    pool: &SqlitePool,
    cutoff: &str,
) -> Result<Vec<BuildRow>, sqlx::Error> {
    sqlx::query_as::<_, BuildRow>(&format!(
        "SELECT {BUILD_COLUMNS} FROM builds
         WHERE status = ? AND created_at < ? AND file_path IS NOT NULL
         ORDER BY id"
    ))
    .bind(BuildStatus::Rejected.to_string())
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Keep the record but forget the archive.
pub async fn clear_file_path(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE builds SET file_path = NULL, updated_at = ? WHERE id = ?")
        .bind(now_timestamp())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_build(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM builds WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Log a download made without a share link.
pub async fn record_direct_download(
    pool: &SqlitePool,
    build_id: i64,
    downloaded_by: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO downloads (build_id, share_link_id, downloaded_by, created_at) VALUES (?, NULL, ?, ?)",
    )
    .bind(build_id)
    .bind(downloaded_by)
    .bind(now_timestamp())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn count_builds(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM builds")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

#[cfg(test)]
#[path = "tests/build_repo_test.rs"]
mod tests;
