//! Byte storage for uploaded files (local filesystem or memory).
//!
//! Objects are addressed by `<share_id>/<uuid>`; the visitor-supplied
//! filename never becomes part of a path.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where uploaded bytes live
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadsConfig {
    /// In-memory storage (tests and throwaway instances)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Root directory for stored objects
        path: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct Uploads {
    inner: Arc<dyn ObjectStore>,
}

impl Uploads {
    pub async fn new(config: &UploadsConfig) -> Result<Self, UploadsError> {
        let inner: Arc<dyn ObjectStore> = match config {
            UploadsConfig::Memory => Arc::new(InMemory::new()),

            UploadsConfig::Local { path } => {
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| UploadsError::InvalidConfig(e.to_string()))?,
                )
            }
        };

        Ok(Self { inner })
    }

    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Wrap an arbitrary backend
    pub fn from_store(inner: Arc<dyn ObjectStore>) -> Self {
        Self { inner }
    }

    /// Fresh, unique storage path for a file in `share_id`
    pub fn storage_path(share_id: i64) -> String {
        format!("{}/{}", share_id, Uuid::new_v4().simple())
    }

    pub async fn put(&self, path: &str, data: Bytes) -> Result<(), UploadsError> {
        self.inner.put(&ObjectPath::from(path), data.into()).await?;
        Ok(())
    }

    /// Read an object, `None` when nothing is stored at `path`
    pub async fn get(&self, path: &str) -> Result<Option<Bytes>, UploadsError> {
        match self.inner.get(&ObjectPath::from(path)).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an object. Already missing counts as removed.
    pub async fn delete(&self, path: &str) -> Result<(), UploadsError> {
        match self.inner.delete(&ObjectPath::from(path)).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Cheap round trip to the backend: lists the top level only
    pub async fn probe(&self) -> Result<(), UploadsError> {
        self.inner.list_with_delimiter(None).await?;
        Ok(())
    }

    /// Number of stored objects
    pub async fn count(&self) -> Result<usize, UploadsError> {
        use futures::TryStreamExt;

        let objects: Vec<_> = self.inner.list(None).try_collect().await?;
        Ok(objects.len())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadsError {
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_put_get_delete() {
        let uploads = Uploads::memory();
        let path = Uploads::storage_path(7);
        assert!(path.starts_with("7/"));

        uploads.put(&path, Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(uploads.get(&path).await.unwrap().unwrap(), "hello");
        assert_eq!(uploads.count().await.unwrap(), 1);

        uploads.delete(&path).await.unwrap();
        assert!(uploads.get(&path).await.unwrap().is_none());
        // deleting twice is fine
        uploads.delete(&path).await.unwrap();
        assert_eq!(uploads.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_local_store_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        let uploads = Uploads::new(&UploadsConfig::Local { path: root.clone() })
            .await
            .unwrap();

        uploads.put("3/abc", Bytes::from_static(b"data")).await.unwrap();
        assert_eq!(std::fs::read(root.join("3").join("abc")).unwrap(), b"data");
        assert_eq!(uploads.get("3/abc").await.unwrap().unwrap(), "data");
        assert!(uploads.get("3/missing").await.unwrap().is_none());
    }

    #[test]
    fn test_storage_paths_are_unique() {
        assert_ne!(Uploads::storage_path(1), Uploads::storage_path(1));
    }

    #[test]
    fn test_config_toml_shape() {
        let config: UploadsConfig = toml::from_str("type = \"local\"\npath = \"/tmp/x\"").unwrap();
        assert_eq!(
            config,
            UploadsConfig::Local {
                path: PathBuf::from("/tmp/x")
            }
        );
    }
}
