//! Line-level parsing of `aapt dump badging` output.
//!
//! The dump is loosely structured `key:'value'` text. Only the lines the
//! name and icon cascades need are lifted out; everything else is ignored.

use super::types::{DensityIcon, LabelLine, PackageIdentity};
use regex::Regex;
use std::sync::LazyLock;

static PACKAGE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^package:(.*)$").expect("valid package regex"));
static NAME_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bname='([^']*)'").expect("valid name regex"));
static VERSION_CODE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bversionCode='([^']*)'").expect("valid versionCode regex"));
static VERSION_NAME_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bversionName='([^']*)'").expect("valid versionName regex"));
static LABEL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^application-label(?:-([A-Za-z0-9_+-]+))?:'(.*)'[ \t]*$")
        .expect("valid label regex")
});
static APPLICATION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^application: (.*)$").expect("valid application regex"));
static LABEL_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\blabel='([^']*)'").expect("valid label attr regex"));
static ICON_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bicon='([^']*)'").expect("valid icon attr regex"));
static DENSITY_ICON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^application-icon-(\d+):'([^']+)'").expect("valid density icon regex")
});

/// Structured view over one sanitized badging dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgingDump {
    pub package: Option<PackageIdentity>,
    pub labels: Vec<LabelLine>,
    /// `label='…'` on the `application: ` line (older dump format).
    pub application_label: Option<String>,
    /// `icon='…'` on the `application: ` line.
    pub application_icon: Option<String>,
    pub density_icons: Vec<DensityIcon>,
}

/// Drop control characters (other than newline and tab) that some aapt builds
/// leak into their output.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

impl BadgingDump {
    /// Sanitize `raw` and pull out the lines the cascades read.
    pub fn parse(raw: &str) -> Self {
        let text = sanitize(raw);

        let application_line = APPLICATION_LINE_RE
            .captures(&text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string());

        Self {
            package: parse_package_identity(&text),
            labels: parse_labels(&text),
            application_label: application_line
                .as_deref()
                .and_then(|line| capture_attr(&LABEL_ATTR_RE, line)),
            application_icon: application_line
                .as_deref()
                .and_then(|line| capture_attr(&ICON_ATTR_RE, line))
                .filter(|icon| !icon.is_empty()),
            density_icons: parse_density_icons(&text),
        }
    }

    /// Package identity, or an empty one if the dump had no `package:` line.
    pub fn identity(&self) -> PackageIdentity {
        self.package.clone().unwrap_or_default()
    }
}

/// Read name, versionCode and versionName off the `package:` line.
///
/// Attributes are matched independently, so extra attributes
/// (`platformBuildVersionName=…`) and ordering differences are tolerated.
pub fn parse_package_identity(text: &str) -> Option<PackageIdentity> {
    let line = PACKAGE_LINE_RE.captures(text)?.get(1)?.as_str();

    let package_name = capture_attr(&NAME_ATTR_RE, line).unwrap_or_default();
    let version_code = capture_attr(&VERSION_CODE_ATTR_RE, line)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let version_name = capture_attr(&VERSION_NAME_ATTR_RE, line).unwrap_or_default();

    Some(PackageIdentity {
        package_name,
        version_code,
        version_name,
    })
}

fn parse_labels(text: &str) -> Vec<LabelLine> {
    LABEL_LINE_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let value = cap.get(2)?.as_str().to_string();
            Some(LabelLine {
                locale: cap.get(1).map(|m| m.as_str().to_string()),
                value,
            })
        })
        .collect()
}

fn parse_density_icons(text: &str) -> Vec<DensityIcon> {
    DENSITY_ICON_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let density = cap.get(1)?.as_str().parse::<u32>().ok()?;
            Some(DensityIcon {
                density,
                path: cap.get(2)?.as_str().to_string(),
            })
        })
        .collect()
}

fn capture_attr(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
#[path = "tests/badging_tests.rs"]
mod tests;
