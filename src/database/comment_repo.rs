use super::models::{now_timestamp, CommentRow, CommentSubject};
use sqlx::SqlitePool;

const COMMENT_COLUMNS: &str = "id, subject_type, subject_id, parent_id, author, body, created_at";

pub async fn insert_comment(
    pool: &SqlitePool,
    subject: CommentSubject,
    subject_id: i64,
    parent_id: Option<i64>,
    author: Option<&str>,
    body: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO comments (subject_type, subject_id, parent_id, author, body, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(subject.as_str())
    .bind(subject_id)
    .bind(parent_id)
    .bind(author)
    .bind(body)
    .bind(now_timestamp())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_comment(pool: &SqlitePool, id: i64) -> Result<Option<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Whole thread of a subject in posting order.
pub async fn comments_for(
    pool: &SqlitePool,
    subject: CommentSubject,
    subject_id: i64,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    sqlx::query_as::<_, CommentRow>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE subject_type = ? AND subject_id = ? ORDER BY id"
    ))
    .bind(subject.as_str())
    .bind(subject_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
#[path = "tests/comment_repo_test.rs"]
mod tests;
