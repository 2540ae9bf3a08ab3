//! Plain local filestore.
//!
//! Blobs are written to `<root>/<namespace>/<sha[0..2]>/<sha>` and identified
//! by the relative path `<sha[0..2]>/<sha>`. The same tree is what the
//! migration job lifts into the remote bucket.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::key::BlobKey;

/// Byte storage addressed by an opaque identifier.
#[async_trait]
pub trait Filestore: Send + Sync + fmt::Debug {
    /// Read the blob, `None` if there is nothing under `identifier`.
    async fn read(&self, identifier: &str) -> Result<Option<Bytes>>;

    /// Store the blob and return the identifier it can be read back with.
    async fn write(&self, data: Bytes) -> Result<String>;

    /// Whether anything is stored under `identifier`, without reading it.
    async fn exists(&self, identifier: &str) -> Result<bool>;
}

/// Filestore on the local disk, one directory per namespace.
#[derive(Debug, Clone)]
pub struct LocalFilestore {
    root: PathBuf,
}

impl LocalFilestore {
    pub fn new(base: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            root: base.as_ref().join(namespace),
        }
    }

    /// Directory holding this namespace's blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for an identifier, refusing anything that escapes the root.
    pub fn full_path(&self, identifier: &str) -> Result<PathBuf> {
        let relative = Path::new(identifier);
        let is_plain = !identifier.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StoreError::InvalidIdentifier(identifier.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn identifier_for(key: &BlobKey) -> String {
        let key = key.as_str();
        format!("{}/{}", &key[..2], key)
    }
}

#[async_trait]
impl Filestore for LocalFilestore {
    async fn read(&self, identifier: &str) -> Result<Option<Bytes>> {
        let path = self.full_path(identifier)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, data: Bytes) -> Result<String> {
        let key = BlobKey::derive(&data);
        let identifier = Self::identifier_for(&key);
        let path = self.full_path(&identifier)?;

        if tokio::fs::try_exists(&path).await? {
            debug!(identifier = %identifier, "blob already in filestore");
            return Ok(identifier);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        debug!(identifier = %identifier, size = data.len(), "wrote blob to filestore");
        Ok(identifier)
    }

    async fn exists(&self, identifier: &str) -> Result<bool> {
        let path = self.full_path(identifier)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalFilestore::new(temp_dir.path(), "db1");

        let identifier = store.write(Bytes::from("hello world")).await.unwrap();
        assert_eq!(
            identifier,
            "2a/2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert!(temp_dir.path().join("db1").join(&identifier).exists());

        let data = store.read(&identifier).await.unwrap().unwrap();
        assert_eq!(data.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_write_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalFilestore::new(temp_dir.path(), "db1");

        let first = store.write(Bytes::from("same")).await.unwrap();
        let second = store.write(Bytes::from("same")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalFilestore::new(temp_dir.path(), "db1");

        let identifier = store.write(Bytes::from("present")).await.unwrap();
        assert!(store.exists(&identifier).await.unwrap());
        assert!(!store.exists("ab/abcdef").await.unwrap());
        assert!(matches!(
            store.exists("../secret").await,
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_read_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalFilestore::new(temp_dir.path(), "db1");
        assert!(store.read("ab/abcdef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_escaping_identifiers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalFilestore::new(temp_dir.path(), "db1");

        for identifier in ["", "../secret", "ab/../../x", "/etc/passwd"] {
            assert!(matches!(
                store.read(identifier).await,
                Err(StoreError::InvalidIdentifier(_))
            ));
        }
    }
}
