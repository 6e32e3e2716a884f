//! Build lifecycle: upload, review, deletion and retention.

pub mod download;
pub mod ingest;
pub mod prune;
pub mod review;

pub(crate) use download::locate_archive;
pub use download::{download_build, download_file_name, BuildDownload};
pub use ingest::{pre_analyze, register_build, BuildUpload, PreAnalysis, RegisteredBuild, UploadSource};
pub use prune::{prune_rejected_builds, PruneReport};
pub use review::{delete_build, review_build, ReviewDecision};
