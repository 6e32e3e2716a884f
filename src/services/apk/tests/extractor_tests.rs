use super::*;
use crate::test_utils::{init_logger, png_bytes, FakeInspector, SAMPLE_BADGING};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const APK: &str = "/uploads/app.apk";

fn scratch_entries(dir: &Path) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn test_extract_full_badging() {
    init_logger();
    let tmp = TempDir::new().unwrap();
    let png = png_bytes();
    let inspector = FakeInspector::new(SAMPLE_BADGING)
        .with_entry("res/mipmap-hdpi-v4/ic_launcher.png", png.clone());
    let extractor = ApkExtractor::new(inspector, tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.package_name, "com.acme.my_cool_app");
    assert_eq!(result.version_code, 42);
    assert_eq!(result.version_name, "1.4.2");
    assert_eq!(result.app_name, "Cool App");
    assert_eq!(result.icon_bytes.as_deref(), Some(png.as_slice()));
    assert_eq!(result.icon_mime.as_deref(), Some("image/png"));
    assert_eq!(
        result.icon_internal_path.as_deref(),
        Some("res/mipmap-hdpi-v4/ic_launcher.png")
    );
    assert_eq!(scratch_entries(tmp.path()), 0, "temp icon file leaked");
}

#[tokio::test]
async fn test_empty_dump_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let extractor = ApkExtractor::new(FakeInspector::new("  \n"), tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("Failed to analyze package"));
    assert!(result.icon_bytes.is_none());
}

#[tokio::test]
async fn test_missing_tool_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let inspector = FakeInspector {
        missing_tool: true,
        ..FakeInspector::new(SAMPLE_BADGING)
    };
    let extractor = ApkExtractor::new(inspector, tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("aapt"));
}

#[tokio::test]
async fn test_adaptive_icon_resolved_from_listing() {
    let tmp = TempDir::new().unwrap();
    let badging = "package: name='com.acme.app' versionCode='5' versionName='5.0'
application-label:'Acme'
application-icon-65535:'res/mipmap-anydpi-v26/ic_launcher.xml'
application: label='Acme' icon='res/mipmap-anydpi-v26/ic_launcher.xml'
";
    let inspector = FakeInspector::new(badging)
        .with_entry("res/mipmap-anydpi-v26/ic_launcher.xml", b"<adaptive-icon/>".to_vec())
        .with_entry("res/mipmap/ic_launcher_round.png", png_bytes())
        .with_entry("res/mipmap-chucker/ic_launcher.png", png_bytes());
    let extractor = ApkExtractor::new(inspector, tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert!(result.success);
    assert_eq!(
        result.icon_internal_path.as_deref(),
        Some("res/mipmap/ic_launcher_round.png")
    );
    assert!(result.has_icon());
}

#[tokio::test]
async fn test_missing_icon_entry_degrades() {
    let tmp = TempDir::new().unwrap();
    let extractor = ApkExtractor::new(FakeInspector::new(SAMPLE_BADGING), tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert!(result.success);
    assert_eq!(result.app_name, "Cool App");
    assert!(result.icon_bytes.is_none());
    assert!(result.icon_mime.is_none());
    assert!(result.icon_internal_path.is_none());
    assert_eq!(scratch_entries(tmp.path()), 0);
}

#[tokio::test]
async fn test_zero_byte_and_garbage_icons_are_dropped() {
    let tmp = TempDir::new().unwrap();
    for bytes in [Vec::new(), b"not an image at all".to_vec()] {
        let inspector = FakeInspector::new(SAMPLE_BADGING)
            .with_entry("res/mipmap-hdpi-v4/ic_launcher.png", bytes);
        let extractor = ApkExtractor::new(inspector, tmp.path());

        let result = extractor.extract(Path::new(APK)).await;

        assert!(result.success);
        assert!(!result.has_icon());
        assert_eq!(scratch_entries(tmp.path()), 0);
    }
}

#[tokio::test]
async fn test_webp_icon_mime() {
    let tmp = TempDir::new().unwrap();
    let badging = "package: name='com.acme.app' versionCode='1' versionName='1'
application-icon-480:'res/mipmap-xxhdpi-v4/ic_launcher.webp'
";
    let webp = b"RIFF\x24\x00\x00\x00WEBPVP8 ".to_vec();
    let inspector =
        FakeInspector::new(badging).with_entry("res/mipmap-xxhdpi-v4/ic_launcher.webp", webp);
    let extractor = ApkExtractor::new(inspector, tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert_eq!(result.icon_mime.as_deref(), Some("image/webp"));
    assert_eq!(result.icon_extension(), Some("webp"));
    assert_eq!(result.app_name, "App");
}

#[tokio::test]
async fn test_non_raster_base_icon_is_not_extracted() {
    let tmp = TempDir::new().unwrap();
    let badging = "package: name='com.acme.app'\napplication: label='' icon='res/drawable/icon.jpg'\n";
    let inspector = FakeInspector::new(badging).with_entry("res/drawable/icon.jpg", png_bytes());
    let calls = inspector.clone();
    let extractor = ApkExtractor::new(inspector, tmp.path());

    let result = extractor.extract(Path::new(APK)).await;

    assert!(result.success);
    assert!(!result.has_icon());
    assert_eq!(calls.extract_calls(), 0);
}

#[tokio::test]
async fn test_repeated_extraction_is_stable() {
    let tmp = TempDir::new().unwrap();
    let inspector = FakeInspector::new(SAMPLE_BADGING)
        .with_entry("res/mipmap-hdpi-v4/ic_launcher.png", png_bytes());
    let extractor = ApkExtractor::new(inspector, tmp.path());

    let first = extractor.extract(Path::new(APK)).await;
    let second = extractor.extract(Path::new(APK)).await;

    assert_eq!(first.package_name, second.package_name);
    assert_eq!(first.version_code, second.version_code);
    assert_eq!(first.version_name, second.version_name);
    assert_eq!(first.app_name, second.app_name);
    assert_eq!(first.icon_bytes, second.icon_bytes);
}

#[tokio::test]
async fn test_scratch_dir_created_on_demand() {
    let tmp = TempDir::new().unwrap();
    let scratch = tmp.path().join("nested").join("apk_temp");
    let inspector = FakeInspector::new(SAMPLE_BADGING)
        .with_entry("res/mipmap-hdpi-v4/ic_launcher.png", png_bytes());
    let extractor = ApkExtractor::new(inspector, &scratch);

    let result = extractor.extract(Path::new(APK)).await;

    assert!(result.has_icon());
    assert!(scratch.is_dir());
    assert_eq!(scratch_entries(&scratch), 0);
}
