//! The storage capability consumed by the upload pipeline.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;

/// Options attached to an object when its write stream is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Content type recorded on the object.
    pub content_type: Option<String>,
    /// Custom key/value metadata recorded on the object.
    pub user_metadata: HashMap<String, String>,
}

impl WriteOptions {
    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add one custom metadata entry.
    #[must_use]
    pub fn with_user_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_metadata.insert(key.into(), value.into());
        self
    }
}

/// An object read back from storage.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object bytes.
    pub data: Bytes,
    /// Content type, when the backend records one.
    pub content_type: Option<String>,
    /// Custom metadata, when the backend records it.
    pub user_metadata: HashMap<String, String>,
}

/// An open write stream for a single object.
///
/// A failed `write` or `close` is the stream's error event; a successful
/// `close` is its finish event. Nothing is visible before `close` succeeds.
#[async_trait]
pub trait ObjectWriter: Send {
    /// Append a chunk to the object.
    async fn write(&mut self, chunk: Bytes) -> Result<(), StorageError>;

    /// Commit the object.
    async fn close(&mut self) -> Result<(), StorageError>;
}

/// Object storage backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open a write stream for `key` in `bucket`.
    async fn writer(
        &self,
        bucket: &str,
        key: &str,
        options: WriteOptions,
    ) -> Result<Box<dyn ObjectWriter>, StorageError>;

    /// Grant public read access to a committed object.
    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Read an object with its recorded metadata.
    async fn read(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError>;
}
