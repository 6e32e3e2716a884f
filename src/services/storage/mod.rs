//! Directory-backed blob store for uploaded archives and extracted icons.

mod blob_store;

pub use blob_store::{BlobStore, StoredFile};

#[cfg(test)]
#[path = "tests/blob_store_tests.rs"]
mod tests;
