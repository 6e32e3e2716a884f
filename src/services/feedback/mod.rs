//! QA feedback on builds: bug reports, feature requests, improvements.

use crate::database::models::{
    BuildRow, FeedbackDetails, FeedbackRow, FeedbackStatus, FeedbackType, Severity,
};
use crate::database::{build_repo, feedback_repo};
use crate::services::activity::record_activity;
use crate::services::fields::{optional_text, required_text, TITLE_MAX_CHARS};
use crate::services::notify::{Notification, Notifier};
use crate::types::errors::{AppError, AppResult};
use sqlx::SqlitePool;

const DESCRIPTION_MAX_CHARS: usize = 10_000;

/// What a reporter fills in.
#[derive(Debug, Clone)]
pub struct FeedbackInput {
    pub feedback_type: FeedbackType,
    pub severity: Option<Severity>,
    pub title: String,
    pub description: String,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub screen_size: Option<String>,
}

impl FeedbackInput {
    pub fn new(feedback_type: FeedbackType, title: &str, description: &str) -> Self {
        Self {
            feedback_type,
            severity: None,
            title: title.to_string(),
            description: description.to_string(),
            device_model: None,
            os_version: None,
            screen_size: None,
        }
    }

    /// Current content of a stored report, as a starting point for edits.
    pub fn from_row(row: &FeedbackRow) -> AppResult<Self> {
        let feedback_type = row.feedback_type.parse().map_err(AppError::Validation)?;
        let severity = row
            .severity
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()
            .map_err(AppError::Validation)?;
        Ok(Self {
            feedback_type,
            severity,
            title: row.title.clone(),
            description: row.description.clone(),
            device_model: row.device_model.clone(),
            os_version: row.os_version.clone(),
            screen_size: row.screen_size.clone(),
        })
    }

    fn validate(&self, status: FeedbackStatus) -> AppResult<FeedbackDetails> {
        Ok(FeedbackDetails {
            feedback_type: self.feedback_type,
            severity: self.severity,
            status,
            title: required_text("Title", &self.title, TITLE_MAX_CHARS)?,
            description: required_text("Description", &self.description, DESCRIPTION_MAX_CHARS)?,
            device_model: optional_text(self.device_model.as_deref()),
            os_version: optional_text(self.os_version.as_deref()),
            screen_size: optional_text(self.screen_size.as_deref()),
        })
    }
}

/// File an Open report against a build and tell its uploader.
pub async fn submit_feedback(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    build_id: i64,
    reported_by: Option<&str>,
    input: &FeedbackInput,
) -> AppResult<FeedbackRow> {
    let build = load_build(pool, build_id).await?;
    let details = input.validate(FeedbackStatus::Open)?;

    let id = feedback_repo::insert_feedback(pool, build_id, reported_by, &details).await?;
    let feedback = load_feedback(pool, id).await?;

    if let Some(uploader) = build.uploaded_by.as_deref() {
        notifier.notify(Notification::new(
            uploader,
            format!("New {} Reported", details.feedback_type),
            format!("New feedback on build v{}: {}", build.version_name, details.title),
        ));
    }
    record_activity(
        pool,
        reported_by,
        "Feedback Submitted",
        &format!("Reported {} on build v{}", details.feedback_type, build.version_name),
        Some(("feedback", id)),
    )
    .await;

    log::info!("[Feedback] {} #{id} on build {build_id}", details.feedback_type);
    Ok(feedback)
}

/// Replace the content and status of a report.
pub async fn update_feedback(
    pool: &SqlitePool,
    feedback_id: i64,
    input: &FeedbackInput,
    status: FeedbackStatus,
) -> AppResult<FeedbackRow> {
    let details = input.validate(status)?;
    if !feedback_repo::update_feedback(pool, feedback_id, &details).await? {
        return Err(AppError::NotFound(format!("Feedback {feedback_id}")));
    }
    log::info!("[Feedback] #{feedback_id} is now {status}");
    load_feedback(pool, feedback_id).await
}

/// Delete a report together with its comment thread.
pub async fn delete_feedback(pool: &SqlitePool, feedback_id: i64) -> AppResult<()> {
    if !feedback_repo::delete_feedback(pool, feedback_id).await? {
        return Err(AppError::NotFound(format!("Feedback {feedback_id}")));
    }
    log::info!("[Feedback] Deleted #{feedback_id}");
    Ok(())
}

async fn load_build(pool: &SqlitePool, build_id: i64) -> AppResult<BuildRow> {
    build_repo::get_build(pool, build_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Build {build_id}")))
}

async fn load_feedback(pool: &SqlitePool, feedback_id: i64) -> AppResult<FeedbackRow> {
    feedback_repo::get_feedback(pool, feedback_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feedback {feedback_id}")))
}

#[cfg(test)]
#[path = "tests/feedback_tests.rs"]
mod tests;
