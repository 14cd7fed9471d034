//! Storage backend abstraction layer
//!
//! Every request maps to at most one call on [`StorageBackend`]. The only
//! implementation wraps an `object_store` client, so the same adapter serves
//! Google Cloud Storage, AWS S3, Azure Blob Storage and the in-memory store
//! used for local runs and tests.

mod aws;
mod azure;
mod gcp;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::{BackendConfig, BackendType};
use crate::errors::{GatewayError, Result};
use crate::metrics;

/// Storage backend trait for the key-value operations
///
/// Names passed in are complete object names; namespacing happens before
/// the call. Implementations must be safe to share across requests.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn read(&self, name: &str) -> Result<Option<Bytes>>;

    /// Store a text value, replacing any previous one
    async fn write(&self, name: &str, value: Bytes) -> Result<()>;

    /// Delete an object; deleting a missing object succeeds
    async fn remove(&self, name: &str) -> Result<()>;

    /// Every object name starting with `prefix`, all pages drained
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// [`StorageBackend`] over any `object_store` implementation
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Parse `name` into a path that round-trips exactly.
    ///
    /// `Path::parse` trims a leading or trailing `/`, which would let `x/`
    /// and `x` share one object.
    fn object_path(name: &str) -> Result<Path> {
        let path = Path::parse(name)?;
        if path.as_ref() != name {
            return Err(GatewayError::InvalidKey(name.to_string()));
        }
        Ok(path)
    }

    /// Attributes attached to every value: plain text, never cached.
    fn value_attributes() -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, "text/plain".into());
        attributes.insert(Attribute::CacheControl, "no-store".into());
        attributes
    }

    async fn fetch(&self, path: &Path) -> object_store::Result<Option<Bytes>> {
        match self.store.head(path).await {
            Ok(_) => {}
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        }
        // The object may vanish between the probe and the download.
        match self.store.get(path).await {
            Ok(result) => result.bytes().await.map(Some),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_if_present(&self, path: &Path) -> object_store::Result<()> {
        match self.store.delete(path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn list_names(&self, prefix: &str) -> object_store::Result<Vec<String>> {
        // object_store lists whole path segments, so list the deepest
        // complete directory and filter on the raw string prefix.
        let dir = prefix.rfind('/').map(|i| &prefix[..i]).unwrap_or("");
        let dir = match Path::parse(dir) {
            Ok(dir) => dir,
            // No stored object can live under an unparsable directory.
            Err(_) => return Ok(Vec::new()),
        };
        let dir = (!dir.as_ref().is_empty()).then_some(dir);

        let names = self
            .store
            .list(dir.as_ref())
            .map_ok(|meta| meta.location.to_string())
            .try_filter(|name| futures::future::ready(name.starts_with(prefix)))
            .try_collect::<Vec<_>>()
            .await?;
        Ok(names)
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn read(&self, name: &str) -> Result<Option<Bytes>> {
        let path = Self::object_path(name)?;
        let started = Instant::now();
        let result = self.fetch(&path).await;
        metrics::observe_storage("read", result.is_ok(), started);
        Ok(result?)
    }

    async fn write(&self, name: &str, value: Bytes) -> Result<()> {
        let path = Self::object_path(name)?;
        let opts = PutOptions {
            attributes: Self::value_attributes(),
            ..PutOptions::default()
        };
        let started = Instant::now();
        let result = self
            .store
            .put_opts(&path, PutPayload::from(value), opts)
            .await;
        metrics::observe_storage("write", result.is_ok(), started);
        let put = result?;
        debug!(name, e_tag = ?put.e_tag, "Object written");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = Self::object_path(name)?;
        let started = Instant::now();
        let result = self.delete_if_present(&path).await;
        metrics::observe_storage("remove", result.is_ok(), started);
        Ok(result?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let started = Instant::now();
        let result = self.list_names(prefix).await;
        metrics::observe_storage("list", result.is_ok(), started);
        Ok(result?)
    }
}

/// Create a storage backend based on configuration
///
/// Cloud backends pick up credentials the standard way for their provider
/// (workload identity, instance metadata, or the usual environment
/// variables). No credentials are read from the gateway's own config.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn StorageBackend>> {
    let store: Arc<dyn ObjectStore> = match config.backend_type {
        BackendType::Gcp => gcp::build(config)?,
        BackendType::Aws => aws::build(config)?,
        BackendType::Azure => azure::build(config)?,
        BackendType::Memory => Arc::new(InMemory::new()),
    };
    Ok(Arc::new(ObjectStoreBackend::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (Arc<InMemory>, ObjectStoreBackend) {
        let store = Arc::new(InMemory::new());
        (store.clone(), ObjectStoreBackend::new(store))
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_, backend) = backend();
        backend.write("kv/a", Bytes::from("héllo")).await.unwrap();
        let value = backend.read("kv/a").await.unwrap();
        assert_eq!(value, Some(Bytes::from("héllo")));
    }

    #[tokio::test]
    async fn test_read_missing() {
        let (_, backend) = backend();
        assert_eq!(backend.read("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_sets_text_attributes() {
        let (store, backend) = backend();
        backend.write("a", Bytes::from("1")).await.unwrap();

        let result = store.get(&Path::from("a")).await.unwrap();
        let content_type: Option<&str> = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref());
        let cache_control: Option<&str> = result
            .attributes
            .get(&Attribute::CacheControl)
            .map(|v| v.as_ref());
        assert_eq!(content_type, Some("text/plain"));
        assert_eq!(cache_control, Some("no-store"));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (_, backend) = backend();
        backend.write("a", Bytes::from("1")).await.unwrap();
        backend.remove("a").await.unwrap();
        backend.remove("a").await.unwrap();
        backend.remove("never-existed").await.unwrap();
        assert_eq!(backend.read("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_uses_string_prefix() {
        let (_, backend) = backend();
        for name in ["app-1", "app-2/x", "apple", "bob/app-3", "kv/alice/a", "kv/alice/b/c"] {
            backend.write(name, Bytes::from("v")).await.unwrap();
        }

        let mut names = backend.list("app-").await.unwrap();
        names.sort();
        assert_eq!(names, vec!["app-1", "app-2/x"]);

        let mut names = backend.list("kv/alice/").await.unwrap();
        names.sort();
        assert_eq!(names, vec!["kv/alice/a", "kv/alice/b/c"]);

        assert_eq!(backend.list("").await.unwrap().len(), 6);
        assert!(backend.list("kv//x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unrepresentable_name_is_rejected() {
        let (_, backend) = backend();
        let err = backend.write("a//b", Bytes::from("v")).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_names_are_not_trimmed() {
        let (store, backend) = backend();
        for name in ["x/", "/a", "kv/alice/x/"] {
            let err = backend.write(name, Bytes::from("v")).await.unwrap_err();
            assert!(matches!(err, GatewayError::InvalidKey(_)), "{name}");
            assert!(matches!(
                backend.read(name).await.unwrap_err(),
                GatewayError::InvalidKey(_)
            ));
            assert!(matches!(
                backend.remove(name).await.unwrap_err(),
                GatewayError::InvalidKey(_)
            ));
        }
        assert!(store.list(None).try_collect::<Vec<_>>().await.unwrap().is_empty());
    }
}
