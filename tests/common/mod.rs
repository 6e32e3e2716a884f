#![allow(dead_code)]

use apkdash_lib::services::apk::{ApkInspector, InspectError, ToolInspector};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

pub struct TestContext {
    pub pool: Pool<Sqlite>,
}

pub async fn init_test_db() -> TestContext {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    TestContext { pool }
}

/// Canned badging text in front of real ZIP entry reads, so the workflow runs
/// without an Android SDK on the machine.
pub struct CannedBadging {
    pub badging: String,
    pub archive: ToolInspector,
}

impl CannedBadging {
    pub fn new(badging: &str) -> Self {
        Self {
            badging: badging.to_string(),
            archive: ToolInspector::new("aapt"),
        }
    }
}

impl ApkInspector for CannedBadging {
    async fn dump_badging(&self, _apk: &Path) -> Result<String, InspectError> {
        Ok(self.badging.clone())
    }

    async fn extract_entry(&self, apk: &Path, entry: &str, dest: &Path) -> Result<(), InspectError> {
        self.archive.extract_entry(apk, entry, dest).await
    }

    async fn list_entries(&self, apk: &Path) -> Result<Vec<String>, InspectError> {
        self.archive.list_entries(apk).await
    }
}

pub const FIELD_BADGING: &str = "package: name='com.acme.field_notes' versionCode='310' versionName='3.1.0' platformBuildVersionName='14'
sdkVersion:'26'
application-label:'0x7f120001'
application-label-de:'Feldnotizen'
application-icon-120:'res/mipmap-ldpi-v4/ic_launcher.png'
application-icon-65535:'res/mipmap-anydpi-v26/ic_launcher.xml'
application: label='0x7f120001' icon='res/mipmap-anydpi-v26/ic_launcher.xml'
";

/// A tiny valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([0x20, 0x40, 0x80, 0xff]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}

/// Write an APK-shaped ZIP with the given entries.
pub fn write_apk(dir: &Path, name: &str, files: &[(&str, Vec<u8>)]) -> PathBuf {
    let apk_path = dir.join(name);
    let file = fs::File::create(&apk_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for (entry_name, content) in files {
        writer.start_file(entry_name.to_string(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    apk_path
}
