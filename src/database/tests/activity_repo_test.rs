use super::*;

#[tokio::test]
async fn test_log_and_read_activity() {
    let ctx = crate::test_utils::init_test_db().await;
    let pool = ctx.pool;

    log_activity(&pool, Some("alice"), "upload", "Uploaded Acme 1.0", Some(("build", 4)))
        .await
        .unwrap();
    log_activity(&pool, None, "prune", "Pruned 0 builds", None)
        .await
        .unwrap();
    log_activity(&pool, Some("bob"), "review", "Approved Acme 1.0", Some(("build", 4)))
        .await
        .unwrap();

    let recent = recent_activity(&pool, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].action, "review");
    assert_eq!(recent[1].action, "prune");
    assert!(recent[1].subject_type.is_none());

    let for_build = activity_for_subject(&pool, "build", 4).await.unwrap();
    let actions: Vec<&str> = for_build.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(actions, vec!["upload", "review"]);
}
