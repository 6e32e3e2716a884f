use serde::{Deserialize, Serialize};

/// Identity triple read from the `package:` line of a badging dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub package_name: String,
    pub version_code: i64,
    pub version_name: String,
}

/// One `application-label[-<locale>]:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    /// `None` for the default-locale line.
    pub locale: Option<String>,
    pub value: String,
}

/// One `application-icon-<density>:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityIcon {
    pub density: u32,
    pub path: String,
}

/// Icon bytes pulled out of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkIcon {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub internal_path: String,
}

/// Outcome of one metadata extraction.
///
/// `success = false` only when the dump tool produced nothing. Every other gap
/// is filled by a fallback, so a successful result always carries a non-empty
/// `app_name`. The three icon fields are either all set or all `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub package_name: String,
    pub version_code: i64,
    pub version_name: String,
    pub app_name: String,
    #[serde(skip)]
    pub icon_bytes: Option<Vec<u8>>,
    pub icon_mime: Option<String>,
    pub icon_internal_path: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub(crate) fn resolved(
        identity: PackageIdentity,
        app_name: String,
        icon: Option<ApkIcon>,
    ) -> Self {
        let (icon_bytes, icon_mime, icon_internal_path) = match icon {
            Some(icon) if !icon.bytes.is_empty() => (
                Some(icon.bytes),
                Some(icon.mime.to_string()),
                Some(icon.internal_path),
            ),
            _ => (None, None, None),
        };

        Self {
            package_name: identity.package_name,
            version_code: identity.version_code,
            version_name: identity.version_name,
            app_name,
            icon_bytes,
            icon_mime,
            icon_internal_path,
            success: true,
            error: None,
        }
    }

    pub fn has_icon(&self) -> bool {
        self.icon_bytes.is_some()
    }

    /// File extension matching `icon_mime`.
    pub fn icon_extension(&self) -> Option<&'static str> {
        match self.icon_mime.as_deref() {
            Some("image/webp") => Some("webp"),
            Some(_) => Some("png"),
            None => None,
        }
    }
}
