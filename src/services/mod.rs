pub mod activity;
pub mod apk;
pub mod builds;
pub mod comments;
pub mod config;
pub mod feedback;
pub mod fields;
pub mod fs_utils;
pub mod notify;
pub mod sharing;
pub mod storage;
pub mod tasks;
