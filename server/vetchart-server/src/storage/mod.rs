//! Storage services for VetChart
//!
//! Uploaded photos and dictations are kept on local disk and served under
//! `/uploads`.

pub mod file_store;

pub use file_store::{FileStore, StoredFile};
