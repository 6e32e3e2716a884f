use super::models::{now_timestamp, ProjectRow};
use sqlx::SqlitePool;

const PROJECT_COLUMNS: &str =
    "id, name, package_name, description, icon_path, created_at, updated_at";

// ── Projects ────────────────────────────────────────────────

/// Return the project for `package_name`, creating it with `name` if absent.
/// An existing project keeps its name.
pub async fn first_or_create(
    pool: &SqlitePool,
    package_name: &str,
    name: &str,
) -> Result<ProjectRow, sqlx::Error> {
    let now = now_timestamp();
    sqlx::query(
        "INSERT OR IGNORE INTO projects (name, package_name, created_at, updated_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(package_name)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_by_package(pool, package_name)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_by_package(
    pool: &SqlitePool,
    package_name: &str,
) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE package_name = ?"
    ))
    .bind(package_name)
    .fetch_optional(pool)
    .await
}

pub async fn get_project(pool: &SqlitePool, id: i64) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name"
    ))
    .fetch_all(pool)
    .await
}

pub async fn set_icon_path(
    pool: &SqlitePool,
    id: i64,
    icon_path: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE projects SET icon_path = ?, updated_at = ? WHERE id = ?")
        .bind(icon_path)
        .bind(now_timestamp())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/project_repo_test.rs"]
mod tests;
