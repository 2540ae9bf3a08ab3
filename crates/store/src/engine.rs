//! Attachment storage engine.
//!
//! [`BlobEngine`] is the single entry point the catalog uses for per-blob
//! reads and writes. On every call it re-reads the current location from its
//! [`LocationSource`] and routes to the local filestore or the S3 bucket, so
//! the backend can be switched at runtime without rebuilding the engine.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::client::TargetFactory;
use crate::config::EngineConfig;
use crate::descriptor::StorageMode;
use crate::error::Result;
use crate::filestore::Filestore;
use crate::key::BlobKey;
use crate::target::NamespacedPath;

/// Supplies the current storage location string (`s3://...` or a local marker).
pub trait LocationSource: Send + Sync {
    fn location(&self) -> String;
}

impl LocationSource for String {
    fn location(&self) -> String {
        self.clone()
    }
}

impl LocationSource for &'static str {
    fn location(&self) -> String {
        self.to_string()
    }
}

impl LocationSource for RwLock<String> {
    fn location(&self) -> String {
        self.read().clone()
    }
}

/// Read/write capability the catalog depends on.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Bytes stored under `identifier`, `None` if no backend has them.
    async fn read(&self, identifier: &str) -> Result<Option<Bytes>>;

    /// Store `data` and return the identifier to read it back with.
    async fn write(&self, data: Bytes) -> Result<String>;
}

pub struct BlobEngine {
    config: EngineConfig,
    location: Arc<dyn LocationSource>,
    factory: TargetFactory,
    filestore: Arc<dyn Filestore>,
    fallbacks: Vec<Arc<dyn Filestore>>,
}

impl BlobEngine {
    /// Build an engine. The local filestore doubles as the first legacy
    /// reader tried when a remote read misses.
    pub fn new(
        config: EngineConfig,
        location: Arc<dyn LocationSource>,
        factory: TargetFactory,
        filestore: Arc<dyn Filestore>,
    ) -> Self {
        Self {
            config,
            location,
            factory,
            fallbacks: vec![filestore.clone()],
            filestore,
        }
    }

    /// Append a reader to the legacy fallback chain.
    pub fn with_fallback(mut self, reader: Arc<dyn Filestore>) -> Self {
        self.fallbacks.push(reader);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn factory(&self) -> &TargetFactory {
        &self.factory
    }

    /// Resolve the mode from the current location.
    pub fn mode(&self) -> Result<StorageMode> {
        Ok(StorageMode::resolve(&self.location.location())?)
    }

    /// Whether `identifier` is present in the current backend.
    pub async fn exists(&self, identifier: &str) -> Result<bool> {
        match self.mode()? {
            StorageMode::Local => self.filestore.exists(identifier).await,
            StorageMode::Remote(descriptor) => {
                let target = self.factory.get_or_create_target(&descriptor).await?;
                target
                    .exists(&NamespacedPath::new(self.namespace(), identifier))
                    .await
            }
        }
    }

    async fn read_fallback(&self, identifier: &str) -> Option<Bytes> {
        if !self.config.legacy_fallback {
            return None;
        }
        for reader in &self.fallbacks {
            match reader.read(identifier).await {
                Ok(Some(data)) => {
                    debug!(identifier = %identifier, "served blob from legacy filestore");
                    return Some(data);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(identifier = %identifier, error = %e, "legacy reader failed, treating as miss");
                }
            }
        }
        None
    }
}

#[async_trait]
impl BlobStorage for BlobEngine {
    async fn read(&self, identifier: &str) -> Result<Option<Bytes>> {
        match self.mode()? {
            StorageMode::Local => self.filestore.read(identifier).await,
            StorageMode::Remote(descriptor) => {
                let target = self.factory.get_or_create_target(&descriptor).await?;
                let path = NamespacedPath::new(self.namespace(), identifier);
                match target.get(&path).await? {
                    Some(data) => {
                        debug!(path = %path, size = data.len(), "read blob from remote store");
                        Ok(Some(data))
                    }
                    None => {
                        debug!(path = %path, "blob missing from remote store");
                        Ok(self.read_fallback(identifier).await)
                    }
                }
            }
        }
    }

    async fn write(&self, data: Bytes) -> Result<String> {
        match self.mode()? {
            StorageMode::Local => self.filestore.write(data).await,
            StorageMode::Remote(descriptor) => {
                let key = BlobKey::derive(&data);
                let target = self.factory.get_or_create_target(&descriptor).await?;
                let path = NamespacedPath::new(self.namespace(), key.as_str());
                let size = data.len();
                target.put(&path, data).await?;
                debug!(path = %path, size = size, "wrote blob to remote store");
                Ok(key.into_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryConnector;
    use crate::error::StoreError;
    use crate::filestore::LocalFilestore;

    const LOCATION: &str = "s3://id:secret@attachments";

    fn engine(location: Arc<dyn LocationSource>, dir: &std::path::Path) -> BlobEngine {
        BlobEngine::new(
            EngineConfig::new("db1"),
            location,
            TargetFactory::new(Arc::new(MemoryConnector::new())),
            Arc::new(LocalFilestore::new(dir, "db1")),
        )
    }

    #[tokio::test]
    async fn test_remote_write_uses_content_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new(LOCATION), temp_dir.path());

        let key = engine.write(Bytes::from("hello world")).await.unwrap();
        assert_eq!(key, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert!(engine.exists(&key).await.unwrap());

        // nothing touched the local filestore
        assert!(!temp_dir.path().join("db1").exists());
    }

    #[tokio::test]
    async fn test_local_mode_delegates_to_filestore() {
        let temp_dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new("file"), temp_dir.path());

        let identifier = engine.write(Bytes::from("local")).await.unwrap();
        assert!(identifier.contains('/'));
        assert_eq!(
            engine.read(&identifier).await.unwrap().unwrap().as_ref(),
            b"local"
        );
        assert!(engine.read("00/missing").await.unwrap().is_none());

        assert!(engine.exists(&identifier).await.unwrap());
        assert!(!engine.exists("00/missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_mode_is_reread_each_call() {
        let temp_dir = tempfile::tempdir().unwrap();
        let location = Arc::new(RwLock::new("file".to_string()));
        let engine = engine(location.clone(), temp_dir.path());

        let identifier = engine.write(Bytes::from("before")).await.unwrap();
        assert!(!engine.mode().unwrap().is_remote());

        *location.write() = LOCATION.to_string();
        assert!(engine.mode().unwrap().is_remote());

        let key = engine.write(Bytes::from("after")).await.unwrap();
        assert!(!key.contains('/'));
        // the pre-switch blob is still reachable through the fallback
        assert_eq!(
            engine.read(&identifier).await.unwrap().unwrap().as_ref(),
            b"before"
        );
    }

    #[tokio::test]
    async fn test_malformed_location_is_a_parse_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let engine = engine(Arc::new("s3://:secret@bucket"), temp_dir.path());

        assert!(matches!(
            engine.read("key").await,
            Err(StoreError::Parse(_))
        ));
        assert!(matches!(
            engine.write(Bytes::from("x")).await,
            Err(StoreError::Parse(_))
        ));
    }
}
