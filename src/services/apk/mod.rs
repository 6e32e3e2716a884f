//! APK metadata extraction: badging dump, name and icon cascades, icon bytes.

mod badging;
mod extractor;
mod icon;
mod inspector;
mod label;
mod types;

// Re-export public API
pub use badging::{sanitize, BadgingDump};
pub use extractor::ApkExtractor;
pub use icon::{adaptive_icon_fallback, select_icon_path};
pub use inspector::{ApkInspector, InspectError, ToolInspector};
pub use label::{derive_name_from_package, resolve_app_name};
pub use types::{ApkIcon, DensityIcon, ExtractionResult, LabelLine, PackageIdentity};
