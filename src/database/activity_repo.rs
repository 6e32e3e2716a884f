use super::models::{now_timestamp, ActivityRow};
use sqlx::SqlitePool;

/// Subject of an activity entry, e.g. `("build", 12)`.
pub type Subject<'a> = Option<(&'a str, i64)>;

/// Append one audit entry.
pub async fn log_activity(
    pool: &SqlitePool,
    actor: Option<&str>,
    action: &str,
    description: &str,
    subject: Subject<'_>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO activity_logs (actor, action, description, subject_type, subject_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(actor)
    .bind(action)
    .bind(description)
    .bind(subject.map(|(kind, _)| kind))
    .bind(subject.map(|(_, id)| id))
    .bind(now_timestamp())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Most recent entries first.
pub async fn recent_activity(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT id, actor, action, description, subject_type, subject_id, created_at
         FROM activity_logs ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn activity_for_subject(
    pool: &SqlitePool,
    subject_type: &str,
    subject_id: i64,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT id, actor, action, description, subject_type, subject_id, created_at
         FROM activity_logs WHERE subject_type = ? AND subject_id = ? ORDER BY id",
    )
    .bind(subject_type)
    .bind(subject_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
#[path = "tests/activity_repo_test.rs"]
mod tests;
