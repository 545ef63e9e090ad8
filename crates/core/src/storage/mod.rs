//! Object storage for uploaded images.
//!
//! The upload pipeline only sees the [`ObjectStore`] capability: open a write
//! stream for a key in a bucket, make an object public, read it back. Two
//! implementations exist:
//!
//! - [`OpendalStore`]: Apache OpenDAL over GCS, S3-compatible services or the
//!   local filesystem
//! - [`MemoryStore`]: in-process objects for development and tests
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      StorageClient (once)                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ writer(bucket, key, opts) │ make_public(bucket, key) │ read(..) │
//! ├───────────────────────────┴──────────────────────────┴──────────┤
//! │        OpendalStore (Operator per bucket)  │  MemoryStore       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod error;
mod memory;
mod service;
mod store;

pub use client::StorageClient;
pub use error::StorageError;
pub use imgrelay_shared::StorageProvider;
pub use memory::MemoryStore;
pub use service::OpendalStore;
pub use store::{ObjectStore, ObjectWriter, StoredObject, WriteOptions};
