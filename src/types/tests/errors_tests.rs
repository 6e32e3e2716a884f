use crate::services::apk::InspectError;
use crate::types::errors::AppError;
use sqlx::Error as SqlxError;

#[test]
fn test_app_error_from_sqlx() {
    let sqlx_err = SqlxError::RowNotFound;
    let app_err = AppError::from(sqlx_err);

    match app_err {
        AppError::Database(msg) => {
            assert!(msg.contains("no rows returned"));
        }
        _ => panic!("Expected AppError::Database"),
    }
}

#[test]
fn test_app_error_from_inspect_error() {
    let err = AppError::from(InspectError::Timeout {
        tool: "aapt".into(),
        after: std::time::Duration::from_secs(30),
    });

    assert_eq!(
        err.to_string(),
        "Could not read this package: aapt timed out after 30s"
    );
}

#[test]
fn test_app_error_serialization() {
    let err = AppError::NotFound("Build 7".to_string());

    // AppError serializes as just its Display string
    let serialized = serde_json::to_string(&err).unwrap();
    assert_eq!(serialized, "\"Not found: Build 7\"");
}
