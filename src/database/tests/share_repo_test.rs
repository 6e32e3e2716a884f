use super::*;
use crate::database::build_repo::{delete_build, insert_build};
use crate::database::models::{now_timestamp, BuildType, NewBuild};
use crate::database::project_repo::first_or_create;
use sqlx::SqlitePool;

async fn setup() -> (SqlitePool, i64) {
    let ctx = crate::test_utils::init_test_db().await;
    let project = first_or_create(&ctx.pool, "com.acme.app", "Acme")
        .await
        .unwrap();
    let build_id = insert_build(
        &ctx.pool,
        &NewBuild {
            project_id: project.id,
            uploaded_by: None,
            version_name: "1.0".into(),
            version_code: 1,
            build_type: BuildType::Beta,
            release_notes: None,
            file_path: "builds/acme.apk".into(),
            file_size: 10,
        },
    )
    .await
    .unwrap();
    (ctx.pool, build_id)
}

fn new_link(build_id: i64, token: &str) -> NewShareLink {
    NewShareLink {
        build_id,
        created_by: Some("alice".into()),
        token: token.into(),
        download_limit: Some(2),
        expires_at: None,
        password_hash: None,
    }
}

#[tokio::test]
async fn test_insert_and_lookup_by_token() {
    let (pool, build_id) = setup().await;

    let id = insert_share_link(&pool, &new_link(build_id, "abc")).await.unwrap();

    let by_token = get_by_token(&pool, "abc").await.unwrap().unwrap();
    assert_eq!(by_token.id, id);
    assert_eq!(by_token.download_count, 0);
    assert!(get_by_token(&pool, "nope").await.unwrap().is_none());
    assert_eq!(links_for_build(&pool, build_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_token_rejected() {
    let (pool, build_id) = setup().await;
    insert_share_link(&pool, &new_link(build_id, "abc")).await.unwrap();

    assert!(insert_share_link(&pool, &new_link(build_id, "abc")).await.is_err());
}

#[tokio::test]
async fn test_record_download_counts_and_logs() {
    let (pool, build_id) = setup().await;
    let id = insert_share_link(&pool, &new_link(build_id, "abc")).await.unwrap();
    let link = get_share_link(&pool, id).await.unwrap().unwrap();

    let now = now_timestamp();
    assert!(record_download(&pool, &link, Some("qa@example.com"), &now).await.unwrap());
    assert!(record_download(&pool, &link, None, &now).await.unwrap());

    let link = get_share_link(&pool, id).await.unwrap().unwrap();
    assert_eq!(link.download_count, 2);
    let downloads = downloads_for_build(&pool, build_id).await.unwrap();
    assert_eq!(downloads.len(), 2);
    assert_eq!(downloads[0].share_link_id, Some(id));
    assert_eq!(downloads[0].downloaded_by.as_deref(), Some("qa@example.com"));
}

#[tokio::test]
async fn test_record_download_refuses_past_limit() {
    let (pool, build_id) = setup().await;
    let id = insert_share_link(&pool, &new_link(build_id, "abc")).await.unwrap();
    let link = get_share_link(&pool, id).await.unwrap().unwrap();
    let now = now_timestamp();

    assert!(record_download(&pool, &link, None, &now).await.unwrap());
    assert!(record_download(&pool, &link, None, &now).await.unwrap());
    // Stale row: still says 0 downloads, but the limit of 2 is spent.
    assert!(!record_download(&pool, &link, None, &now).await.unwrap());

    let link = get_share_link(&pool, id).await.unwrap().unwrap();
    assert_eq!(link.download_count, 2);
    assert_eq!(downloads_for_build(&pool, build_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_record_download_refuses_expired_link() {
    let (pool, build_id) = setup().await;
    let mut expiring = new_link(build_id, "abc");
    expiring.download_limit = None;
    expiring.expires_at = Some("2026-01-01 00:00:00".into());
    let id = insert_share_link(&pool, &expiring).await.unwrap();
    let link = get_share_link(&pool, id).await.unwrap().unwrap();

    assert!(record_download(&pool, &link, None, "2025-12-31 23:59:59").await.unwrap());
    assert!(!record_download(&pool, &link, None, "2026-01-01 00:00:00").await.unwrap());
}

#[tokio::test]
async fn test_links_removed_with_build() {
    let (pool, build_id) = setup().await;
    insert_share_link(&pool, &new_link(build_id, "abc")).await.unwrap();

    delete_build(&pool, build_id).await.unwrap();

    assert!(get_by_token(&pool, "abc").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_share_link() {
    let (pool, build_id) = setup().await;
    let id = insert_share_link(&pool, &new_link(build_id, "abc")).await.unwrap();

    delete_share_link(&pool, id).await.unwrap();

    assert!(get_share_link(&pool, id).await.unwrap().is_none());
}
