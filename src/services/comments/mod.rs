//! Comment threads on builds, feedback reports and tasks.

use crate::database::models::{CommentRow, CommentSubject};
use crate::database::{build_repo, comment_repo, feedback_repo, task_repo};
use crate::services::fields::required_text;
use crate::services::notify::{Notification, Notifier};
use crate::types::errors::{AppError, AppResult};
use sqlx::SqlitePool;

const BODY_MAX_CHARS: usize = 5_000;
const EXCERPT_CHARS: usize = 50;

/// The thing a thread hangs off, as far as notifications care.
struct Thread {
    title: String,
    /// Owner, reporter, creator or assignee, in that order of lookup.
    watchers: Vec<String>,
}

/// Add a comment, or a reply when `parent_id` is set, and notify everyone
/// watching the thread except the author.
pub async fn post_comment(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    subject: CommentSubject,
    subject_id: i64,
    author: Option<&str>,
    body: &str,
    parent_id: Option<i64>,
) -> AppResult<CommentRow> {
    let mut thread = load_thread(pool, subject, subject_id).await?;
    let body = required_text("Comment", body, BODY_MAX_CHARS)?;

    if let Some(parent_id) = parent_id {
        let parent = comment_repo::get_comment(pool, parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {parent_id}")))?;
        if parent.subject_type != subject.as_str() || parent.subject_id != subject_id {
            return Err(AppError::Validation(format!(
                "Comment {parent_id} belongs to another thread"
            )));
        }
        thread.watchers.extend(parent.author);
    }

    let id = comment_repo::insert_comment(pool, subject, subject_id, parent_id, author, &body).await?;
    let comment = comment_repo::get_comment(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {id}")))?;

    let commenter = author.unwrap_or("Someone");
    let message = format!("{commenter} commented: {}", excerpt(&body));
    for recipient in recipients(thread.watchers, author) {
        notifier.notify(Notification::new(
            &recipient,
            format!("New comment on {}", thread.title),
            message.clone(),
        ));
    }

    log::debug!("[Comments] #{id} on {subject} {subject_id}");
    Ok(comment)
}

/// The whole thread of a subject, oldest first.
pub async fn list_thread(
    pool: &SqlitePool,
    subject: CommentSubject,
    subject_id: i64,
) -> AppResult<Vec<CommentRow>> {
    load_thread(pool, subject, subject_id).await?;
    Ok(comment_repo::comments_for(pool, subject, subject_id).await?)
}

async fn load_thread(
    pool: &SqlitePool,
    subject: CommentSubject,
    subject_id: i64,
) -> AppResult<Thread> {
    let thread = match subject {
        CommentSubject::Build => build_repo::get_build(pool, subject_id).await?.map(|b| Thread {
            title: format!("build v{}", b.version_name),
            watchers: b.uploaded_by.into_iter().collect(),
        }),
        CommentSubject::Feedback => {
            feedback_repo::get_feedback(pool, subject_id)
                .await?
                .map(|f| Thread {
                    title: f.title,
                    watchers: f.reported_by.into_iter().collect(),
                })
        }
        CommentSubject::Task => task_repo::get_task(pool, subject_id).await?.map(|t| Thread {
            title: t.title,
            watchers: t.created_by.into_iter().chain(t.assignee).collect(),
        }),
    };
    thread.ok_or_else(|| AppError::NotFound(format!("{subject} {subject_id}")))
}

/// Watchers in first-seen order, each once, never the author.
fn recipients(watchers: Vec<String>, author: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(watchers.len());
    for watcher in watchers {
        if Some(watcher.as_str()) != author && !out.contains(&watcher) {
            out.push(watcher);
        }
    }
    out
}

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
#[path = "tests/comment_tests.rs"]
mod tests;
