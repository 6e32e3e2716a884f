use crate::services::apk::{ApkInspector, InspectError};
use crate::services::notify::{Notification, Notifier};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub struct TestContext {
    pub pool: Pool<Sqlite>,
}

pub fn init_logger() {
    INIT.call_once(|| {
        // Initialize logger only once
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub async fn init_test_db() -> TestContext {
    init_logger();

    // Create an in-memory database for each test
    let pool = SqlitePoolOptions::new()
        .max_connections(1) // Single connection to avoid locking issues in tests
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    TestContext { pool }
}

/// In-memory stand-in for `aapt` + the archive.
#[derive(Debug, Clone, Default)]
pub struct FakeInspector {
    pub badging: String,
    pub entries: BTreeMap<String, Vec<u8>>,
    /// Simulate a missing `aapt` binary.
    pub missing_tool: bool,
    pub extract_calls: Arc<AtomicUsize>,
}

impl FakeInspector {
    pub fn new(badging: &str) -> Self {
        Self {
            badging: badging.to_string(),
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.entries.insert(path.to_string(), bytes);
        self
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }
}

impl ApkInspector for FakeInspector {
    async fn dump_badging(&self, _apk: &Path) -> Result<String, InspectError> {
        if self.missing_tool {
            return Err(InspectError::Spawn {
                tool: "aapt".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        Ok(self.badging.clone())
    }

    async fn extract_entry(&self, _apk: &Path, entry: &str, dest: &Path) -> Result<(), InspectError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .entries
            .get(entry)
            .ok_or_else(|| InspectError::EntryMissing(entry.to_string()))?;
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    async fn list_entries(&self, _apk: &Path) -> Result<Vec<String>, InspectError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// A tiny valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0x3d, 0xdc, 0x84, 0xff]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}

/// Badging output shaped like a modern `aapt dump badging`.
pub const SAMPLE_BADGING: &str = "package: name='com.acme.my_cool_app' versionCode='42' versionName='1.4.2' platformBuildVersionName='14' platformBuildVersionCode='34' compileSdkVersion='34' compileSdkVersionCodename='14'
sdkVersion:'24'
targetSdkVersion:'34'
uses-permission: name='android.permission.INTERNET'
application-label:'Cool App'
application-label-fr:'Appli Cool'
application-icon-160:'res/mipmap-mdpi-v4/ic_launcher.png'
application-icon-240:'res/mipmap-hdpi-v4/ic_launcher.png'
application-icon-65535:'res/mipmap-anydpi-v26/ic_launcher.xml'
application: label='Cool App' icon='res/mipmap-anydpi-v26/ic_launcher.xml'
launchable-activity: name='com.acme.my_cool_app.MainActivity'  label='' icon=''
feature-group: label=''
locales: '--_--' 'fr'
densities: '160' '240' '65535'
";

/// Keeps every notification for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.recipient).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// Insert a project and one Beta build of it; returns the build id.
pub async fn seed_build(pool: &Pool<Sqlite>, version_name: &str, uploaded_by: Option<&str>) -> i64 {
    let project = crate::database::project_repo::first_or_create(pool, "com.acme.app", "Acme")
        .await
        .expect("Failed to create project");
    crate::database::build_repo::insert_build(
        pool,
        &crate::database::models::NewBuild {
            project_id: project.id,
            uploaded_by: uploaded_by.map(str::to_string),
            version_name: version_name.to_string(),
            version_code: 1,
            build_type: crate::database::models::BuildType::Beta,
            release_notes: None,
            file_path: "builds/acme.apk".into(),
            file_size: 10,
        },
    )
    .await
    .expect("Failed to insert build")
}
