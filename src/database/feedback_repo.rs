use super::models::{now_timestamp, FeedbackDetails, FeedbackRow};
use sqlx::SqlitePool;

const FEEDBACK_COLUMNS: &str = "id, build_id, reported_by, feedback_type, severity, status, title, \
     description, device_model, os_version, screen_size, created_at, updated_at";

pub async fn insert_feedback(
    pool: &SqlitePool,
    build_id: i64,
    reported_by: Option<&str>,
    details: &FeedbackDetails,
) -> Result<i64, sqlx::Error> {
    let now = now_timestamp();
    let result = sqlx::query(
        "INSERT INTO feedback (build_id, reported_by, feedback_type, severity, status, title,
             description, device_model, os_version, screen_size, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(build_id)
    .bind(reported_by)
    .bind(details.feedback_type.to_string())
    .bind(details.severity.map(|s| s.to_string()))
    .bind(details.status.to_string())
    .bind(&details.title)
    .bind(&details.description)
    .bind(&details.device_model)
    .bind(&details.os_version)
    .bind(&details.screen_size)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_feedback(pool: &SqlitePool, id: i64) -> Result<Option<FeedbackRow>, sqlx::Error> {
    sqlx::query_as::<_, FeedbackRow>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Reports on one build, newest first.
pub async fn feedback_for_build(
    pool: &SqlitePool,
    build_id: i64,
) -> Result<Vec<FeedbackRow>, sqlx::Error> {
    sqlx::query_as::<_, FeedbackRow>(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE build_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(build_id)
    .fetch_all(pool)
    .await
}

/// Replace the editable fields. Returns whether the row exists.
pub async fn update_feedback(
    pool: &SqlitePool,
    id: i64,
    details: &FeedbackDetails,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE feedback SET feedback_type = ?, severity = ?, status = ?, title = ?, description = ?,
             device_model = ?, os_version = ?, screen_size = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(details.feedback_type.to_string())
    .bind(details.severity.map(|s| s.to_string()))
    .bind(details.status.to_string())
    .bind(&details.title)
    .bind(&details.description)
    .bind(&details.device_model)
    .bind(&details.os_version)
    .bind(&details.screen_size)
    .bind(now_timestamp())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Comments on the report go with it.
pub async fn delete_feedback(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[path = "tests/feedback_repo_test.rs"]
mod tests;
