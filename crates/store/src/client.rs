//! Remote client factory.
//!
//! [`TargetFactory`] turns a [`BackendDescriptor`] into a live [`StorageTarget`],
//! creating the bucket if it does not exist yet. The actual remote calls go
//! through a [`Connector`] so the same factory drives real S3 (or MinIO) and
//! the in-memory store used in tests.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{S3Settings, DEFAULT_S3_REGION};
use crate::descriptor::BackendDescriptor;
use crate::error::ConnectionError;
use crate::target::StorageTarget;

/// Bucket-level operations against a remote store.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Whether the descriptor's bucket exists. Auth and network failures are errors.
    async fn bucket_exists(&self, descriptor: &BackendDescriptor) -> Result<bool, ConnectionError>;

    /// Create the descriptor's bucket. Succeeds if it already exists and is ours.
    async fn create_bucket(&self, descriptor: &BackendDescriptor) -> Result<(), ConnectionError>;

    /// Open an object store scoped to the descriptor's bucket.
    fn open(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn ObjectStore>, ConnectionError>;
}

/// Connector for AWS S3 and S3-compatible endpoints.
#[derive(Debug, Clone, Default)]
pub struct S3Connector {
    settings: S3Settings,
}

impl S3Connector {
    pub fn new(settings: S3Settings) -> Self {
        Self { settings }
    }

    fn sdk_client(&self, descriptor: &BackendDescriptor) -> aws_sdk_s3::Client {
        let credentials = Credentials::new(
            descriptor.access_id(),
            descriptor.secret(),
            None,
            None,
            "stash",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.settings.region().to_string()))
            .credentials_provider(credentials)
            .endpoint_url(self.settings.endpoint())
            .force_path_style(true)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}

#[async_trait]
impl Connector for S3Connector {
    async fn bucket_exists(&self, descriptor: &BackendDescriptor) -> Result<bool, ConnectionError> {
        let client = self.sdk_client(descriptor);
        match client.head_bucket().bucket(descriptor.bucket()).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if missing {
                    Ok(false)
                } else {
                    Err(ConnectionError::Lookup {
                        bucket: descriptor.bucket().to_string(),
                        message: DisplayErrorContext(&err).to_string(),
                    })
                }
            }
        }
    }

    async fn create_bucket(&self, descriptor: &BackendDescriptor) -> Result<(), ConnectionError> {
        let client = self.sdk_client(descriptor);
        let region = self.settings.region();

        let mut request = client.create_bucket().bucket(descriptor.bucket());
        // us-east-1 rejects an explicit location constraint
        if region != DEFAULT_S3_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_bucket_already_owned_by_you())
                    .unwrap_or(false) =>
            {
                Ok(())
            }
            Err(err) => Err(ConnectionError::Create {
                bucket: descriptor.bucket().to_string(),
                message: DisplayErrorContext(&err).to_string(),
            }),
        }
    }

    fn open(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn ObjectStore>, ConnectionError> {
        let store = AmazonS3Builder::new()
            .with_endpoint(self.settings.endpoint())
            .with_access_key_id(descriptor.access_id())
            .with_secret_access_key(descriptor.secret())
            .with_bucket_name(descriptor.bucket())
            .with_region(self.settings.region())
            .with_allow_http(self.settings.allow_http())
            .build()?;
        Ok(Arc::new(store))
    }
}

/// In-process connector keeping one [`InMemory`] store per bucket.
///
/// Useful for testing and for dry runs; nothing leaves the process.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    buckets: Mutex<HashMap<String, Arc<InMemory>>>,
    denied: Mutex<HashSet<String>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a bucket.
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.buckets
            .lock()
            .insert(bucket.to_string(), Arc::new(InMemory::new()));
        self
    }

    /// Reject every call made with the given access id, as an auth failure would.
    pub fn deny(self, access_id: &str) -> Self {
        self.denied.lock().insert(access_id.to_string());
        self
    }

    /// Names of all buckets, sorted.
    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.buckets.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn check_access(&self, descriptor: &BackendDescriptor) -> Result<(), ConnectionError> {
        if self.denied.lock().contains(descriptor.access_id()) {
            return Err(ConnectionError::Lookup {
                bucket: descriptor.bucket().to_string(),
                message: "access denied".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn bucket_exists(&self, descriptor: &BackendDescriptor) -> Result<bool, ConnectionError> {
        self.check_access(descriptor)?;
        Ok(self.buckets.lock().contains_key(descriptor.bucket()))
    }

    async fn create_bucket(&self, descriptor: &BackendDescriptor) -> Result<(), ConnectionError> {
        self.check_access(descriptor)?;
        self.buckets
            .lock()
            .entry(descriptor.bucket().to_string())
            .or_insert_with(|| Arc::new(InMemory::new()));
        Ok(())
    }

    fn open(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn ObjectStore>, ConnectionError> {
        self.check_access(descriptor)?;
        let buckets = self.buckets.lock();
        let store = buckets
            .get(descriptor.bucket())
            .ok_or_else(|| ConnectionError::Lookup {
                bucket: descriptor.bucket().to_string(),
                message: "no such bucket".to_string(),
            })?;
        Ok(store.clone())
    }
}

/// Produces bucket handles, caching one per descriptor for the life of the process.
#[derive(Debug, Clone)]
pub struct TargetFactory {
    connector: Arc<dyn Connector>,
    cache: Arc<Mutex<HashMap<BackendDescriptor, StorageTarget>>>,
}

impl TargetFactory {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Factory for real S3 using the given endpoint settings.
    pub fn s3(settings: S3Settings) -> Self {
        Self::new(Arc::new(S3Connector::new(settings)))
    }

    /// Return a handle to the descriptor's bucket, creating the bucket if missing.
    ///
    /// Failures are surfaced as is; retrying is left to the caller.
    pub async fn get_or_create_target(
        &self,
        descriptor: &BackendDescriptor,
    ) -> Result<StorageTarget, ConnectionError> {
        let cached = self.cache.lock().get(descriptor).cloned();
        if let Some(target) = cached {
            return Ok(target);
        }

        let bucket = descriptor.bucket();
        if self.connector.bucket_exists(descriptor).await? {
            debug!(bucket = %bucket, "found existing bucket");
        } else {
            info!(bucket = %bucket, "bucket does not exist, creating it");
            self.connector.create_bucket(descriptor).await?;
        }

        let target = StorageTarget::new(bucket, self.connector.open(descriptor)?);
        self.cache.lock().insert(descriptor.clone(), target.clone());
        Ok(target)
    }
}
