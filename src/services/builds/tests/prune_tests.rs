use super::*;
use crate::database::models::{BuildStatus, BuildType, NewBuild};
use crate::database::project_repo;
use std::fs;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    pool: SqlitePool,
    store: BlobStore,
    project_id: i64,
}

async fn fixture() -> Fixture {
    let ctx = crate::test_utils::init_test_db().await;
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    store.ensure_layout().unwrap();
    let project = project_repo::first_or_create(&ctx.pool, "com.acme.app", "Acme")
        .await
        .unwrap();
    Fixture {
        _dir: dir,
        pool: ctx.pool,
        store,
        project_id: project.id,
    }
}

/// Insert a build aged `age_days`, optionally writing its archive.
async fn seed(fx: &Fixture, name: &str, age_days: i64, status: BuildStatus, write_file: bool) -> i64 {
    let relative = format!("builds/{name}.apk");
    if write_file {
        fs::write(fx.store.absolute(&relative).unwrap(), vec![0u8; 100]).unwrap();
    }
    let created_at = format_timestamp(Utc::now() - TimeDelta::days(age_days));
    let id = build_repo::insert_build_at(
        &fx.pool,
        &NewBuild {
            project_id: fx.project_id,
            uploaded_by: None,
            version_name: name.into(),
            version_code: 1,
            build_type: BuildType::Beta,
            release_notes: None,
            file_path: relative,
            file_size: 100,
        },
        &created_at,
    )
    .await
    .unwrap();
    if status != BuildStatus::Pending {
        build_repo::set_review(&fx.pool, id, status, None, None)
            .await
            .unwrap();
    }
    id
}

#[tokio::test]
async fn test_prunes_only_old_rejected_builds() {
    let fx = fixture().await;
    let old_rejected = seed(&fx, "old_rejected", 45, BuildStatus::Rejected, true).await;
    let new_rejected = seed(&fx, "new_rejected", 5, BuildStatus::Rejected, true).await;
    let old_approved = seed(&fx, "old_approved", 45, BuildStatus::Approved, true).await;
    let old_pending = seed(&fx, "old_pending", 45, BuildStatus::Pending, true).await;

    let report = prune_rejected_builds(&fx.pool, &fx.store, 30).await.unwrap();

    assert_eq!(report.pruned, 1);
    assert_eq!(report.freed_bytes, 100);
    assert!(report.failures.is_empty());
    assert!(!fx.store.exists("builds/old_rejected.apk"));

    let pruned = build_repo::get_build(&fx.pool, old_rejected).await.unwrap().unwrap();
    assert!(pruned.file_path.is_none());
    assert_eq!(pruned.status(), BuildStatus::Rejected);

    for id in [new_rejected, old_approved, old_pending] {
        let build = build_repo::get_build(&fx.pool, id).await.unwrap().unwrap();
        assert!(fx.store.exists(build.file_path.as_deref().unwrap()));
    }
}

#[tokio::test]
async fn test_second_run_is_a_noop() {
    let fx = fixture().await;
    seed(&fx, "old_rejected", 45, BuildStatus::Rejected, true).await;

    prune_rejected_builds(&fx.pool, &fx.store, 30).await.unwrap();
    let report = prune_rejected_builds(&fx.pool, &fx.store, 30).await.unwrap();

    assert_eq!(report, PruneReport::default());
}

#[tokio::test]
async fn test_missing_archive_is_cleared_but_not_counted() {
    let fx = fixture().await;
    let id = seed(&fx, "ghost", 45, BuildStatus::Rejected, false).await;

    let report = prune_rejected_builds(&fx.pool, &fx.store, 30).await.unwrap();

    assert_eq!(report.pruned, 0);
    let build = build_repo::get_build(&fx.pool, id).await.unwrap().unwrap();
    assert!(build.file_path.is_none());
}

#[tokio::test]
async fn test_out_of_range_retention_rejected() {
    let fx = fixture().await;
    seed(&fx, "old_rejected", 45, BuildStatus::Rejected, true).await;

    let err = prune_rejected_builds(&fx.pool, &fx.store, u32::MAX)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(fx.store.exists("builds/old_rejected.apk"));
}
