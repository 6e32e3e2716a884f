//! Follow-up work items attached to a build.

use crate::database::models::{BuildRow, TaskDetails, TaskPriority, TaskRow, TaskStatus};
use crate::database::{build_repo, task_repo};
use crate::services::activity::record_activity;
use crate::services::fields::{optional_text, required_text, TITLE_MAX_CHARS};
use crate::services::notify::{Notification, Notifier};
use crate::types::errors::{AppError, AppResult};
use chrono::NaiveDate;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
}

impl TaskInput {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Current content of a stored task, as a starting point for edits.
    pub fn from_row(row: &TaskRow) -> Self {
        Self {
            title: row.title.clone(),
            description: row.description.clone(),
            assignee: row.assignee.clone(),
            priority: row.priority(),
            status: row.status(),
            due_date: row.due_date.clone(),
        }
    }

    fn validate(&self) -> AppResult<TaskDetails> {
        let due_date = match optional_text(self.due_date.as_deref()) {
            Some(raw) => {
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    AppError::Validation(format!("Due date must be YYYY-MM-DD, got '{raw}'"))
                })?;
                Some(date.format("%Y-%m-%d").to_string())
            }
            None => None,
        };
        Ok(TaskDetails {
            title: required_text("Title", &self.title, TITLE_MAX_CHARS)?,
            description: optional_text(self.description.as_deref()),
            assignee: optional_text(self.assignee.as_deref()),
            priority: self.priority,
            status: self.status,
            due_date,
        })
    }
}

/// Open a task on a build and tell the assignee.
pub async fn create_task(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    build_id: i64,
    created_by: Option<&str>,
    input: &TaskInput,
) -> AppResult<TaskRow> {
    let build = load_build(pool, build_id).await?;
    let details = input.validate()?;

    let id = task_repo::insert_task(pool, build_id, created_by, &details).await?;
    let task = load_task(pool, id).await?;

    if let Some(assignee) = details.assignee.as_deref() {
        notifier.notify(Notification::new(
            assignee,
            "New Task Assigned",
            format!("You have been assigned the task: {}", details.title),
        ));
    }
    record_activity(
        pool,
        created_by,
        "Task Created",
        &format!("Created task '{}' for build {}", details.title, build.version_name),
        Some(("task", id)),
    )
    .await;

    Ok(task)
}

/// Replace a task's content. Only a change of assignee notifies anyone.
pub async fn update_task(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    task_id: i64,
    actor: Option<&str>,
    input: &TaskInput,
) -> AppResult<TaskRow> {
    let previous = load_task(pool, task_id).await?;
    let details = input.validate()?;

    if !task_repo::update_task(pool, task_id, &details).await? {
        return Err(AppError::NotFound(format!("Task {task_id}")));
    }
    let task = load_task(pool, task_id).await?;

    if let Some(assignee) = details.assignee.as_deref() {
        if previous.assignee.as_deref() != Some(assignee) {
            notifier.notify(Notification::new(
                assignee,
                "Task Assigned to You",
                format!("The task '{}' has been assigned to you.", details.title),
            ));
        }
    }
    record_activity(
        pool,
        actor,
        "Task Updated",
        &format!("Updated task '{}'", details.title),
        Some(("task", task_id)),
    )
    .await;

    Ok(task)
}

/// Delete a task together with its comment thread.
pub async fn delete_task(pool: &SqlitePool, task_id: i64) -> AppResult<()> {
    if !task_repo::delete_task(pool, task_id).await? {
        return Err(AppError::NotFound(format!("Task {task_id}")));
    }
    log::info!("[Tasks] Deleted #{task_id}");
    Ok(())
}

async fn load_build(pool: &SqlitePool, build_id: i64) -> AppResult<BuildRow> {
    build_repo::get_build(pool, build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {build_id}")))
}

async fn load_task(pool: &SqlitePool, task_id: i64) -> AppResult<TaskRow> {
    task_repo::get_task(pool, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {task_id}")))
}

#[cfg(test)]
#[path = "tests/task_tests.rs"]
mod tests;
