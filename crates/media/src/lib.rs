//! Blob store for uploaded attachments: unique filenames under a fixed
//! public directory, served by static path.

pub mod store;

pub use store::{BlobStore, StoredBlob};
