//! Process-wide storage handle.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use super::error::StorageError;
use super::memory::MemoryStore;
use super::service::{OpendalStore, resolve_credential_path};
use super::store::ObjectStore;
use imgrelay_shared::StorageProvider;

/// Lazily-built, shared handle to the object store.
///
/// The store is constructed on the first `get` and reused for the lifetime of
/// the client. Concurrent first calls build it exactly once.
pub struct StorageClient {
    provider: Option<StorageProvider>,
    handle: OnceCell<Arc<dyn ObjectStore>>,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("provider", &self.provider.as_ref().map(StorageProvider::name))
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl StorageClient {
    /// Create a client that connects to `provider` on first use.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider: Some(provider),
            handle: OnceCell::new(),
        }
    }

    /// Create a client around an already-built store.
    #[must_use]
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            provider: None,
            handle: OnceCell::with_value(store),
        }
    }

    /// Get the shared store, building it on the first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be constructed. A failed
    /// construction is retried on the next call.
    pub fn get(&self) -> Result<Arc<dyn ObjectStore>, StorageError> {
        self.handle.get_or_try_init(|| self.connect()).cloned()
    }

    /// Whether the store has been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }

    fn connect(&self) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| StorageError::configuration("no storage provider configured"))?;

        if let StorageProvider::Gcs {
            credential_path, ..
        } = provider
        {
            let credentials = resolve_credential_path(credential_path.as_ref());
            info!(
                credentials = ?credentials,
                predefined_acl = ?provider.predefined_acl(),
                "Google application credentials"
            );
        }
        info!(provider = provider.name(), "Initializing storage client");

        match provider {
            StorageProvider::Memory => Ok(Arc::new(MemoryStore::new())),
            other => Ok(Arc::new(OpendalStore::new(other.clone())?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_lazy_construction() {
        let client = StorageClient::new(StorageProvider::Memory);
        assert!(!client.is_initialized());

        client.get().expect("store");
        assert!(client.is_initialized());
    }

    #[test]
    fn test_same_handle_every_call() {
        let client = StorageClient::new(StorageProvider::local_fs("./test_uploads"));

        let first = client.get().expect("store");
        let second = client.get().expect("store");

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_calls_share_one_handle() {
        let client = Arc::new(StorageClient::new(StorageProvider::Memory));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = Arc::clone(&client);
                thread::spawn(move || client.get().expect("store"))
            })
            .collect();

        let stores: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();
        for store in &stores[1..] {
            assert!(Arc::ptr_eq(&stores[0], store));
        }
    }

    #[test]
    fn test_injected_store_is_returned() {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new());
        let client = StorageClient::with_store(Arc::clone(&store));

        assert!(client.is_initialized());
        assert!(Arc::ptr_eq(&client.get().expect("store"), &store));
    }
}
