use super::models::{now_timestamp, TaskDetails, TaskRow};
use sqlx::SqlitePool;

const TASK_COLUMNS: &str = "id, build_id, created_by, assignee, title, description, priority, status, \
     due_date, created_at, updated_at";

pub async fn insert_task(
    pool: &SqlitePool,
    build_id: i64,
    created_by: Option<&str>,
    details: &TaskDetails,
) -> Result<i64, sqlx::Error> {
    let now = now_timestamp();
    let result = sqlx::query(
        "INSERT INTO tasks (build_id, created_by, assignee, title, description, priority, status,
             due_date, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(build_id)
    .bind(created_by)
    .bind(&details.assignee)
    .bind(&details.title)
    .bind(&details.description)
    .bind(details.priority.to_string())
    .bind(details.status.to_string())
    .bind(&details.due_date)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_task(pool: &SqlitePool, id: i64) -> Result<Option<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Tasks of one build, oldest first.
pub async fn tasks_for_build(pool: &SqlitePool, build_id: i64) -> Result<Vec<TaskRow>, sqlx::Error> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE build_id = ? ORDER BY id"
    ))
    .bind(build_id)
    .fetch_all(pool)
    .await
}

pub async fn update_task(pool: &SqlitePool, id: i64, details: &TaskDetails) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tasks SET assignee = ?, title = ?, description = ?, priority = ?, status = ?,
             due_date = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&details.assignee)
    .bind(&details.title)
    .bind(&details.description)
    .bind(details.priority.to_string())
    .bind(details.status.to_string())
    .bind(&details.due_date)
    .bind(now_timestamp())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_task(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[path = "tests/task_repo_test.rs"]
mod tests;
