use super::*;
use crate::database::models::{BuildType, NewBuild};
use crate::database::share_repo;
use std::fs;
use tempfile::TempDir;

async fn seed(pool: &SqlitePool, store_root: &std::path::Path) -> i64 {
    fs::write(store_root.join("builds/acme.apk"), b"apk").unwrap();
    let project = project_repo::first_or_create(pool, "com.acme.app", "Acme Field")
        .await
        .unwrap();
    build_repo::insert_build(
        pool,
        &NewBuild {
            project_id: project.id,
            uploaded_by: None,
            version_name: "2.4".into(),
            version_code: 24,
            build_type: BuildType::Beta,
            release_notes: None,
            file_path: "builds/acme.apk".into(),
            file_size: 3,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_direct_download_is_recorded_without_link() {
    let ctx = crate::test_utils::init_test_db().await;
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    store.ensure_layout().unwrap();
    let build_id = seed(&ctx.pool, dir.path()).await;

    let download = download_build(&ctx.pool, &store, build_id, Some("carol"))
        .await
        .unwrap();

    assert_eq!(download.file_name, "Acme_Field_v2.4.apk");
    assert_eq!(fs::read(&download.path).unwrap(), b"apk");
    let downloads = share_repo::downloads_for_build(&ctx.pool, build_id).await.unwrap();
    assert_eq!(downloads.len(), 1);
    assert!(downloads[0].share_link_id.is_none());
    assert_eq!(downloads[0].downloaded_by.as_deref(), Some("carol"));
}

#[tokio::test]
async fn test_direct_download_of_pruned_build() {
    let ctx = crate::test_utils::init_test_db().await;
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    store.ensure_layout().unwrap();
    let build_id = seed(&ctx.pool, dir.path()).await;
    build_repo::clear_file_path(&ctx.pool, build_id).await.unwrap();

    let err = download_build(&ctx.pool, &store, build_id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert!(share_repo::downloads_for_build(&ctx.pool, build_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_direct_download_unknown_build() {
    let ctx = crate::test_utils::init_test_db().await;
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());

    let err = download_build(&ctx.pool, &store, 77, None).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_download_file_name_is_sanitized() {
    assert_eq!(download_file_name("My/App", "1.0 beta"), "My_App_v1.0_beta.apk");
}
