//! In-process object store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::{DashMap, DashSet};

use super::error::StorageError;
use super::store::{ObjectStore, ObjectWriter, StoredObject, WriteOptions};

type ObjectKey = (String, String);

#[derive(Debug, Default)]
struct Inner {
    objects: DashMap<ObjectKey, StoredObject>,
    public: DashSet<ObjectKey>,
    writers_opened: AtomicUsize,
    make_public_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Object store that keeps everything in memory.
///
/// Selected by the `memory` provider for local runs. It also records what the
/// pipeline did to it, which makes it the storage double in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write stream fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of committed objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.inner.objects.len()
    }

    /// Number of write streams opened.
    #[must_use]
    pub fn writers_opened(&self) -> usize {
        self.inner.writers_opened.load(Ordering::SeqCst)
    }

    /// Number of make-public calls, successful or not.
    #[must_use]
    pub fn make_public_calls(&self) -> usize {
        self.inner.make_public_calls.load(Ordering::SeqCst)
    }

    /// Whether an object has been made public.
    #[must_use]
    pub fn is_public(&self, bucket: &str, key: &str) -> bool {
        self.inner
            .public
            .contains(&(bucket.to_string(), key.to_string()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn writer(
        &self,
        bucket: &str,
        key: &str,
        options: WriteOptions,
    ) -> Result<Box<dyn ObjectWriter>, StorageError> {
        self.inner.writers_opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryWriter {
            inner: Arc::clone(&self.inner),
            key: (bucket.to_string(), key.to_string()),
            options,
            buffer: BytesMut::new(),
            closed: false,
        }))
    }

    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.inner.make_public_calls.fetch_add(1, Ordering::SeqCst);

        let object_key = (bucket.to_string(), key.to_string());
        if !self.inner.objects.contains_key(&object_key) {
            return Err(StorageError::not_found(format!("{bucket}/{key}")));
        }
        self.inner.public.insert(object_key);
        Ok(())
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        self.inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.clone())
            .ok_or_else(|| StorageError::not_found(format!("{bucket}/{key}")))
    }
}

struct MemoryWriter {
    inner: Arc<Inner>,
    key: ObjectKey,
    options: WriteOptions,
    buffer: BytesMut,
    closed: bool,
}

#[async_trait]
impl ObjectWriter for MemoryWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StorageError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::operation("simulated write failure"));
        }
        if self.closed {
            return Err(StorageError::operation("write after close"));
        }
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::operation("writer already closed"));
        }
        self.closed = true;

        let object = StoredObject {
            data: std::mem::take(&mut self.buffer).freeze(),
            content_type: self.options.content_type.clone(),
            user_metadata: self.options.user_metadata.clone(),
        };
        self.inner.objects.insert(self.key.clone(), object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nothing_visible_before_close() {
        let store = MemoryStore::new();
        let mut writer = store
            .writer("b1", "f1.jpg", WriteOptions::default())
            .await
            .expect("writer");
        writer.write(Bytes::from_static(b"abc")).await.expect("write");

        assert_eq!(store.object_count(), 0);
        assert!(store.read("b1", "f1.jpg").await.is_err());

        writer.close().await.expect("close");
        assert_eq!(store.object_count(), 1);
    }

    #[tokio::test]
    async fn test_records_options() {
        let store = MemoryStore::new();
        let options = WriteOptions::default()
            .with_content_type("image/jpeg")
            .with_user_metadata("custom", "{}");

        let mut writer = store.writer("b1", "f1.jpg", options).await.expect("writer");
        writer.write(Bytes::from_static(b"jpeg")).await.expect("write");
        writer.close().await.expect("close");

        let object = store.read("b1", "f1.jpg").await.expect("read");
        assert_eq!(object.data.as_ref(), b"jpeg");
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(object.user_metadata.get("custom").map(String::as_str), Some("{}"));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = MemoryStore::new();
        store.fail_writes(true);

        let mut writer = store
            .writer("b1", "f1.jpg", WriteOptions::default())
            .await
            .expect("writer");
        let err = writer.write(Bytes::from_static(b"abc")).await.unwrap_err();

        assert!(matches!(err, StorageError::Operation(_)));
        assert_eq!(store.writers_opened(), 1);
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_make_public() {
        let store = MemoryStore::new();
        assert!(store.make_public("b1", "missing.jpg").await.is_err());

        let mut writer = store
            .writer("b1", "f1.jpg", WriteOptions::default())
            .await
            .expect("writer");
        writer.close().await.expect("close");

        store.make_public("b1", "f1.jpg").await.expect("make public");
        assert!(store.is_public("b1", "f1.jpg"));
        assert_eq!(store.make_public_calls(), 2);
    }

    #[tokio::test]
    async fn test_double_close_rejected() {
        let store = MemoryStore::new();
        let mut writer = store
            .writer("b1", "f1.jpg", WriteOptions::default())
            .await
            .expect("writer");
        writer.close().await.expect("close");
        assert!(writer.close().await.is_err());
    }
}
