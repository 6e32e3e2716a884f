use crate::database::activity_repo::{self, Subject};
use sqlx::SqlitePool;

/// Append to the audit trail. A failed write is logged, never surfaced to the
/// operation being described.
pub async fn record_activity(
    pool: &SqlitePool,
    actor: Option<&str>,
    action: &str,
    description: &str,
    subject: Subject<'_>,
) {
    if let Err(e) = activity_repo::log_activity(pool, actor, action, description, subject).await {
        log::warn!("[Activity] Failed to record '{action}': {e}");
    }
}
