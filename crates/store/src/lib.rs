//! Content-addressed attachment storage
//!
//! This crate stores opaque attachment bytes either in a plain local
//! filestore or in an S3 bucket, and moves existing filestores into S3.
//!
//! # Features
//!
//! - Content keys: hex SHA-1 of the blob bytes
//! - Per-call backend selection from a location string (`s3://id:secret@bucket`
//!   or a local marker), so the backend can change at runtime
//! - Bucket auto-creation on first use
//! - Legacy fallback: remote misses are retried against the local filestore
//! - Bulk migration of a filestore tree into the bucket
//! - Integrity audit of catalogued keys against the bucket
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use stash_store::{BlobEngine, BlobStorage, EngineConfig, LocalFilestore, S3Settings, TargetFactory};
//!
//! # async fn example() -> Result<(), stash_store::StoreError> {
//! let engine = BlobEngine::new(
//!     EngineConfig::new("db1"),
//!     Arc::new("s3://AKIA123:secret@attachments".to_string()),
//!     TargetFactory::s3(S3Settings::default()),
//!     Arc::new(LocalFilestore::new("/var/lib/stash/filestore", "db1")),
//! );
//!
//! let key = engine.write(Bytes::from_static(b"hello")).await?;
//! let _data = engine.read(&key).await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod engine;
mod error;
pub mod filestore;
pub mod key;
pub mod migrate;
pub mod target;

pub use audit::{audit, AuditReport, AuditStatus, AuditTotals, BlobRecord};
pub use client::{Connector, MemoryConnector, S3Connector, TargetFactory};
pub use config::{EngineConfig, S3Settings};
pub use descriptor::{BackendDescriptor, StorageMode};
pub use engine::{BlobEngine, BlobStorage, LocationSource};
pub use error::{ConnectionError, ParseError, Result, StoreError};
pub use filestore::{Filestore, LocalFilestore};
pub use key::BlobKey;
pub use migrate::{migrate_tree, FailurePolicy, MigrationOptions, MigrationOutcome, MigrationReport};
pub use target::{NamespacedPath, StorageTarget};
