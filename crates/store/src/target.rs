//! Handle to a remote bucket and the namespaced paths inside it.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Location of an object inside a bucket: `<namespace>/<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedPath {
    namespace: String,
    key: String,
}

impl NamespacedPath {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The object path for this location, exactly as displayed. Keys that
    /// object_store would have to encode or normalize are rejected.
    pub(crate) fn to_object_path(&self) -> Result<ObjectPath> {
        let raw = self.to_string();
        let invalid = |reason: String| StoreError::InvalidKey {
            path: raw.clone(),
            reason,
        };
        let parsed = ObjectPath::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        if parsed.as_ref() != raw {
            return Err(invalid("leading or trailing '/'".to_string()));
        }
        Ok(parsed)
    }
}

impl fmt::Display for NamespacedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.key)
    }
}

/// A live bucket handle shared by every operation in the process.
#[derive(Debug, Clone)]
pub struct StorageTarget {
    bucket: String,
    inner: Arc<dyn ObjectStore>,
}

impl StorageTarget {
    pub fn new(bucket: impl Into<String>, inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            inner,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create or overwrite the object at `path`.
    pub async fn put(&self, path: &NamespacedPath, data: Bytes) -> Result<()> {
        self.inner
            .put(&path.to_object_path()?, data.into())
            .await
            .map_err(|source| StoreError::Write {
                path: path.to_string(),
                source,
            })?;
        Ok(())
    }

    /// Fetch the object at `path`, `None` if absent.
    pub async fn get(&self, path: &NamespacedPath) -> Result<Option<Bytes>> {
        let Some(location) = addressable(path) else {
            return Ok(None);
        };
        let read_err = |source| StoreError::Read {
            path: path.to_string(),
            source,
        };
        match self.inner.get(&location).await {
            Ok(result) => {
                let bytes = result.bytes().await.map_err(read_err)?;
                Ok(Some(bytes))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(read_err(e)),
        }
    }

    /// Check for the object at `path` without fetching its content.
    pub async fn exists(&self, path: &NamespacedPath) -> Result<bool> {
        let Some(location) = addressable(path) else {
            return Ok(false);
        };
        match self.inner.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(source) => Err(StoreError::Read {
                path: path.to_string(),
                source,
            }),
        }
    }
}

/// Nothing can be stored under a key that is not addressable, so lookups of
/// such keys are misses.
fn addressable(path: &NamespacedPath) -> Option<ObjectPath> {
    match path.to_object_path() {
        Ok(location) => Some(location),
        Err(e) => {
            debug!(path = %path, error = %e, "key is not addressable, treating as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    #[test]
    fn test_namespaced_path_display() {
        let path = NamespacedPath::new("db1", "ab/abcdef");
        assert_eq!(path.to_string(), "db1/ab/abcdef");
        assert_eq!(path.to_object_path().unwrap().as_ref(), "db1/ab/abcdef");
    }

    #[test]
    fn test_object_path_is_verbatim() {
        let path = NamespacedPath::new("db1", "report#1~v2 (final).pdf");
        assert_eq!(
            path.to_object_path().unwrap().as_ref(),
            "db1/report#1~v2 (final).pdf"
        );

        for key in ["../x", "a//b", "a/./b", "trailing/", "bell\u{7}"] {
            assert!(matches!(
                NamespacedPath::new("db1", key).to_object_path(),
                Err(StoreError::InvalidKey { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_unaddressable_key() {
        let target = StorageTarget::new("bucket", Arc::new(InMemory::new()));
        let path = NamespacedPath::new("db1", "../escape");

        assert!(matches!(
            target.put(&path, Bytes::from("x")).await,
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(target.get(&path).await.unwrap().is_none());
        assert!(!target.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_target() {
        let target = StorageTarget::new("bucket", Arc::new(InMemory::new()));
        let path = NamespacedPath::new("db1", "key");
        let data = Bytes::from("hello world");

        assert!(!target.exists(&path).await.unwrap());
        assert!(target.get(&path).await.unwrap().is_none());

        target.put(&path, data.clone()).await.unwrap();
        assert!(target.exists(&path).await.unwrap());
        assert_eq!(target.get(&path).await.unwrap().unwrap(), data);

        // overwrite is not an error
        let replacement = Bytes::from("replaced");
        target.put(&path, replacement.clone()).await.unwrap();
        assert_eq!(target.get(&path).await.unwrap().unwrap(), replacement);
    }
}
