//! Icon-path cascade.
//!
//! The densest raster entry wins; the `application: icon='…'` attribute is the
//! fallback. Adaptive icons (`.xml` descriptors) cannot be previewed, so they
//! are swapped for a concrete launcher PNG found in the archive listing.

use super::badging::BadgingDump;
use regex::Regex;
use std::sync::LazyLock;

/// Launcher raster, e.g. `res/mipmap-xxhdpi-v4/ic_launcher_round.png`.
static LAUNCHER_PNG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^res/[^/]+/ic_launcher[^/]*\.png$").expect("valid launcher regex")
});

/// Debug-library resources that ship their own `ic_launcher` assets.
const EXCLUDED_ICON_MARKERS: &[&str] = &["chucker"];

type IconStage = fn(&BadgingDump) -> Option<String>;

const ICON_STAGES: &[(&str, IconStage)] = &[
    ("densest raster icon", densest_raster_icon),
    ("application line icon", application_line_icon),
];

/// Pick the icon path the badging dump points at, before adaptive correction.
pub fn select_icon_path(dump: &BadgingDump) -> Option<String> {
    ICON_STAGES.iter().find_map(|(stage, resolve)| {
        let path = resolve(dump)?;
        log::debug!("[ApkIcon] Selected '{path}' via {stage}");
        Some(path)
    })
}

pub fn is_raster_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".png") || lower.ends_with(".webp")
}

pub fn is_adaptive_icon_path(path: &str) -> bool {
    path.to_lowercase().ends_with(".xml")
}

/// Highest density among raster entries. Equal densities go to the later
/// entry in dump order.
pub fn densest_raster_icon(dump: &BadgingDump) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    for icon in dump.density_icons.iter().filter(|i| is_raster_path(&i.path)) {
        match best {
            Some((density, _)) if icon.density < density => {}
            _ => best = Some((icon.density, icon.path.as_str())),
        }
    }
    best.map(|(_, path)| path.to_string())
}

pub fn application_line_icon(dump: &BadgingDump) -> Option<String> {
    dump.application_icon.clone()
}

/// Stand-in raster for an adaptive icon: the last launcher PNG in sorted order,
/// skipping third-party debug assets.
pub fn adaptive_icon_fallback(entries: &[String]) -> Option<String> {
    let mut candidates: Vec<&String> = entries
        .iter()
        .filter(|entry| LAUNCHER_PNG_RE.is_match(entry))
        .filter(|entry| {
            let lower = entry.to_lowercase();
            !EXCLUDED_ICON_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect();

    candidates.sort_by(|a, b| b.cmp(a));
    candidates.first().map(|entry| entry.to_string())
}

/// Mime type derived from the entry extension.
pub fn mime_for_path(path: &str) -> &'static str {
    if path.to_lowercase().ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}

#[cfg(test)]
#[path = "tests/icon_tests.rs"]
mod tests;
