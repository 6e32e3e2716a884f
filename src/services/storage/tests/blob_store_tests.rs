use super::*;
use std::fs;
use tempfile::TempDir;

fn store() -> (TempDir, BlobStore) {
    let tmp = TempDir::new().unwrap();
    let store = BlobStore::new(tmp.path().join("storage"));
    store.ensure_layout().unwrap();
    (tmp, store)
}

#[test]
fn test_stage_then_promote_moves_into_builds() {
    let (tmp, store) = store();
    let upload = tmp.path().join("incoming.apk");
    fs::write(&upload, b"PK fake apk").unwrap();

    let staged = store.stage_upload(&upload).unwrap();
    assert!(staged.relative.starts_with("temp/"));
    assert_eq!(staged.size, 11);
    assert!(upload.exists(), "staging copies, the upload stays with the caller");

    let promoted = store.promote(&staged.relative, "com.acme.app v1.2").unwrap();
    assert!(promoted.relative.starts_with("builds/com.acme.app_v1.2_"));
    assert!(promoted.relative.ends_with(".apk"));
    assert!(!store.exists(&staged.relative));
    assert!(store.exists(&promoted.relative));
    assert_eq!(promoted.size, 11);
    assert_eq!(fs::metadata(&promoted.absolute).unwrap().len(), 11);
}

#[test]
fn test_promote_missing_staged_file_fails() {
    let (_tmp, store) = store();
    let err = store.promote("temp/nope.apk", "app").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_write_icon_and_delete() {
    let (_tmp, store) = store();
    let rel = store.write_icon(7, "webp", b"RIFF....WEBP").unwrap();

    assert!(rel.starts_with("icons/project_7_"));
    assert!(rel.ends_with(".webp"));
    assert!(store.exists(&rel));

    assert!(store.delete(&rel).unwrap());
    assert!(!store.delete(&rel).unwrap());
}

#[test]
fn test_paths_outside_root_are_rejected() {
    let (_tmp, store) = store();
    assert!(store.absolute("../escape.apk").is_err());
    assert!(!store.exists("../escape.apk"));
    assert!(store.delete("/etc/passwd").is_err());
}
