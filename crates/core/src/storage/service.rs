//! Storage backend implementation using Apache OpenDAL.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use opendal::{Operator, Writer, services};

use super::error::StorageError;
use super::store::{ObjectStore, ObjectWriter, StoredObject, WriteOptions};
use imgrelay_shared::StorageProvider;

/// OpenDAL-backed object store.
///
/// OpenDAL operators are bound to one bucket, so one operator is built per
/// bucket on first use and cached.
pub struct OpendalStore {
    provider: StorageProvider,
    operators: DashMap<String, Operator>,
}

impl std::fmt::Debug for OpendalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpendalStore")
            .field("provider", &self.provider.name())
            .field("buckets", &self.operators.len())
            .finish()
    }
}

impl OpendalStore {
    /// Create a store for the given provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not served by OpenDAL.
    pub fn new(provider: StorageProvider) -> Result<Self, StorageError> {
        if matches!(provider, StorageProvider::Memory) {
            return Err(StorageError::configuration(
                "memory provider is not backed by OpenDAL",
            ));
        }

        Ok(Self {
            provider,
            operators: DashMap::new(),
        })
    }

    /// Get or build the operator for a bucket.
    fn operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        match self.operators.entry(bucket.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let operator = create_operator(&self.provider, bucket)?;
                entry.insert(operator.clone());
                Ok(operator)
            }
        }
    }
}

/// Create OpenDAL operator for one bucket of the provider.
fn create_operator(provider: &StorageProvider, bucket: &str) -> Result<Operator, StorageError> {
    if bucket.is_empty() {
        return Err(StorageError::configuration("bucket name is empty"));
    }

    match provider {
        StorageProvider::Gcs {
            credential_path,
            endpoint,
            predefined_acl,
        } => {
            let mut builder = services::Gcs::default().bucket(bucket);

            if let Some(acl) = predefined_acl {
                builder = builder.predefined_acl(acl);
            }

            if let Some(path) = resolve_credential_path(credential_path.as_ref()) {
                builder = builder.credential_path(
                    path.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid credential path"))?,
                );
            }
            if let Some(endpoint) = endpoint {
                builder = builder.endpoint(endpoint);
            }

            Operator::new(builder)
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok)
        }
        StorageProvider::S3 {
            endpoint,
            access_key_id,
            secret_access_key,
            region,
        } => {
            let builder = services::S3::default()
                .endpoint(endpoint)
                .bucket(bucket)
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key)
                .region(region);

            Operator::new(builder)
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok)
        }
        StorageProvider::LocalFs { root } => {
            let bucket_root = root.join(bucket);
            let builder = services::Fs::default().root(
                bucket_root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?,
            );

            Operator::new(builder)
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok)
        }
        StorageProvider::Memory => Err(StorageError::configuration(
            "memory provider is not backed by OpenDAL",
        )),
    }
}

/// Configured key file, or the ambient `GOOGLE_APPLICATION_CREDENTIALS`.
pub(crate) fn resolve_credential_path(configured: Option<&PathBuf>) -> Option<PathBuf> {
    configured
        .cloned()
        .or_else(|| std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from))
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn writer(
        &self,
        bucket: &str,
        key: &str,
        options: WriteOptions,
    ) -> Result<Box<dyn ObjectWriter>, StorageError> {
        let operator = self.operator(bucket)?;
        let capability = operator.info().full_capability();

        let mut request = operator.writer_with(key);
        if capability.write_with_content_type
            && let Some(content_type) = options.content_type.as_deref()
        {
            request = request.content_type(content_type);
        }
        if capability.write_with_user_metadata && !options.user_metadata.is_empty() {
            request = request.user_metadata(options.user_metadata);
        }

        let writer = request.await.map_err(StorageError::from)?;
        Ok(Box::new(OpendalWriter { inner: writer }))
    }

    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        // Visibility comes from the predefined ACL set on write or from bucket
        // IAM / policy. Only the commit is confirmed here.
        self.operator(bucket)?
            .stat(key)
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        let operator = self.operator(bucket)?;
        let meta = operator.stat(key).await.map_err(StorageError::from)?;
        let data = operator.read(key).await.map_err(StorageError::from)?;

        Ok(StoredObject {
            data: data.to_bytes(),
            content_type: meta.content_type().map(String::from),
            user_metadata: meta.user_metadata().cloned().unwrap_or_default(),
        })
    }
}

/// Write stream over an OpenDAL writer.
struct OpendalWriter {
    inner: Writer,
}

#[async_trait]
impl ObjectWriter for OpendalWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<(), StorageError> {
        self.inner.write(chunk).await.map_err(StorageError::from)
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.inner
            .close()
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("imgrelay-{name}-{}", std::process::id()))
    }

    #[test]
    fn test_memory_provider_rejected() {
        let err = OpendalStore::new(StorageProvider::Memory).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_operator_cached_per_bucket() {
        let store = OpendalStore::new(StorageProvider::local_fs(temp_root("cache")))
            .expect("should create store");

        store.operator("photos").expect("operator");
        store.operator("photos").expect("operator");
        store.operator("avatars").expect("operator");

        assert_eq!(store.operators.len(), 2);
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let store = OpendalStore::new(StorageProvider::local_fs(temp_root("empty")))
            .expect("should create store");

        assert!(matches!(
            store.operator(""),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_configured_credential_path_wins() {
        let configured = PathBuf::from("/etc/imgrelay/key.json");
        assert_eq!(
            resolve_credential_path(Some(&configured)),
            Some(configured.clone())
        );
    }

    #[tokio::test]
    async fn test_local_fs_write_then_read() {
        let root = temp_root("roundtrip");
        let store = OpendalStore::new(StorageProvider::local_fs(&root)).expect("should create store");

        let mut writer = store
            .writer("photos", "cat.jpg", WriteOptions::default().with_content_type("image/jpeg"))
            .await
            .expect("writer");
        writer.write(Bytes::from_static(b"\xff\xd8\xff")).await.expect("write");
        writer.write(Bytes::from_static(b"\xd9")).await.expect("write");
        writer.close().await.expect("close");

        store.make_public("photos", "cat.jpg").await.expect("make public");

        let object = store.read("photos", "cat.jpg").await.expect("read");
        assert_eq!(object.data.as_ref(), b"\xff\xd8\xff\xd9");
        assert!(root.join("photos").join("cat.jpg").exists());

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_make_public_missing_object() {
        let root = temp_root("missing");
        let store = OpendalStore::new(StorageProvider::local_fs(&root)).expect("should create store");

        let err = store.make_public("photos", "nope.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));

        let _ = std::fs::remove_dir_all(root);
    }
}
