use super::models::{now_timestamp, DownloadRow, ShareLinkRow};
use sqlx::SqlitePool;

const SHARE_COLUMNS: &str = "id, build_id, created_by, token, download_limit, download_count, \
     expires_at, password_hash, created_at";

#[derive(Debug, Clone)]
pub struct NewShareLink {
    pub build_id: i64,
    pub created_by: Option<String>,
    pub token: String,
    pub download_limit: Option<i64>,
    pub expires_at: Option<String>,
    pub password_hash: Option<String>,
}

pub async fn insert_share_link(pool: &SqlitePool, link: &NewShareLink) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO share_links (build_id, created_by, token, download_limit, expires_at, password_hash, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(link.build_id)
    .bind(&link.created_by)
    .bind(&link.token)
    .bind(link.download_limit)
    .bind(&link.expires_at)
    .bind(&link.password_hash)
    .bind(now_timestamp())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_by_token(pool: &SqlitePool, token: &str) -> Result<Option<ShareLinkRow>, sqlx::Error> {
    sqlx::query_as::<_, ShareLinkRow>(&format!(
        "SELECT {SHARE_COLUMNS} FROM share_links WHERE token = ?"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub async fn get_share_link(pool: &SqlitePool, id: i64) -> Result<Option<ShareLinkRow>, sqlx::Error> {
    sqlx::query_as::<_, ShareLinkRow>(&format!(
        "SELECT {SHARE_COLUMNS} FROM share_links WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn links_for_build(pool: &SqlitePool, build_id: i64) -> Result<Vec<ShareLinkRow>, sqlx::Error> {
    sqlx::query_as::<_, ShareLinkRow>(&format!(
        "SELECT {SHARE_COLUMNS} FROM share_links WHERE build_id = ? ORDER BY id"
    ))
    .bind(build_id)
    .fetch_all(pool)
    .await
}

/// Claim one download on the link and record it.
///
/// The counter only moves while the link is unexpired (as of `now`) and under
/// its limit; the check and the increment are one statement, so concurrent
/// claims cannot overshoot the limit. Returns `false` when the claim was
/// refused, in which case nothing is written.
pub async fn record_download(
    pool: &SqlitePool,
    link: &ShareLinkRow,
    downloaded_by: Option<&str>,
    now: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(
        "UPDATE share_links SET download_count = download_count + 1
         WHERE id = ?
           AND (download_limit IS NULL OR download_count < download_limit)
           AND (expires_at IS NULL OR expires_at > ?)",
    )
    .bind(link.id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO downloads (build_id, share_link_id, downloaded_by, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(link.build_id)
    .bind(link.id)
    .bind(downloaded_by)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn downloads_for_build(pool: &SqlitePool, build_id: i64) -> Result<Vec<DownloadRow>, sqlx::Error> {
    sqlx::query_as::<_, DownloadRow>(
        "SELECT id, build_id, share_link_id, downloaded_by, created_at FROM downloads WHERE build_id = ? ORDER BY id",
    )
    .bind(build_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_share_link(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM share_links WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/share_repo_test.rs"]
mod tests;
