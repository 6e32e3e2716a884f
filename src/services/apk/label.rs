//! Display-name cascade.
//!
//! Manifest labels are often raw resource references (`0x7f0e001b`, `@string/…`)
//! rather than resolved text. Stages run in order and the first resolvable value
//! wins; when none qualifies the name is synthesized from the package id.

use super::badging::BadgingDump;
use std::path::Path;

const UNKNOWN_APP_NAME: &str = "Unknown App";

type NameStage = fn(&BadgingDump) -> Option<String>;

const NAME_STAGES: &[(&str, NameStage)] = &[
    ("default-locale label", default_locale_label),
    ("localized label", localized_label),
    ("application line label", application_line_label),
];

/// Resolve the best display name. Never returns an empty string.
pub fn resolve_app_name(dump: &BadgingDump, archive_path: &Path) -> String {
    for (stage, resolve) in NAME_STAGES {
        if let Some(name) = resolve(dump) {
            log::debug!("[ApkLabel] Resolved '{name}' via {stage}");
            return name;
        }
    }

    let package_name = dump
        .package
        .as_ref()
        .map(|p| p.package_name.as_str())
        .unwrap_or_default();
    let derived = derive_name_from_package(package_name);
    if !derived.is_empty() {
        log::debug!("[ApkLabel] No resolvable label, derived '{derived}' from {package_name}");
        return derived;
    }

    archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_APP_NAME.to_string())
}

/// A label is usable as display text unless it is blank or a resource pointer.
pub fn is_resolvable_label(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.starts_with("0x") && !value.starts_with('@')
}

pub fn default_locale_label(dump: &BadgingDump) -> Option<String> {
    dump.labels
        .iter()
        .filter(|l| l.locale.is_none())
        .find(|l| is_resolvable_label(&l.value))
        .map(|l| l.value.trim().to_string())
}

pub fn localized_label(dump: &BadgingDump) -> Option<String> {
    dump.labels
        .iter()
        .filter(|l| l.locale.is_some())
        .find(|l| is_resolvable_label(&l.value))
        .map(|l| l.value.trim().to_string())
}

pub fn application_line_label(dump: &BadgingDump) -> Option<String> {
    dump.application_label
        .as_deref()
        .filter(|v| is_resolvable_label(v))
        .map(|v| v.trim().to_string())
}

/// `com.acme.my_cool_app` -> `My Cool App`.
pub fn derive_name_from_package(package_name: &str) -> String {
    let last_segment = package_name.rsplit('.').next().unwrap_or_default();

    last_segment
        .replace('_', " ")
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "tests/label_tests.rs"]
mod tests;
