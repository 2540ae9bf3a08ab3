//! Error types for the attachment store.

use std::path::PathBuf;

/// Errors raised while parsing an `s3://` location string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The location does not start with the `s3://` marker
    #[error("expected an s3:// location, got {0:?}")]
    Scheme(String),

    /// The location lacks the `:` or `@` separator
    #[error("malformed s3 location, expected s3://<access_id>:<secret>@<bucket>")]
    Malformed,

    /// One of the three fields is empty after splitting
    #[error("s3 location has an empty {0}")]
    EmptyField(&'static str),

    /// A field contains a separator character, which is not supported
    #[error("s3 location {0} contains a reserved ':' or '@' character")]
    ReservedCharacter(&'static str),
}

/// Errors raised while reaching the remote store or ensuring its bucket.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The object store client could not be built
    #[error("failed to build object store client: {0}")]
    Client(#[from] object_store::Error),

    /// Looking up the bucket failed (auth rejected, network error, ...)
    #[error("failed to look up bucket '{bucket}': {message}")]
    Lookup { bucket: String, message: String },

    /// Creating a missing bucket failed
    #[error("failed to create bucket '{bucket}': {message}")]
    Create { bucket: String, message: String },
}

/// Errors that can occur when working with the attachment store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed location string
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Remote store unreachable or bucket unavailable
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Upsert of an object failed
    #[error("failed to write object '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: object_store::Error,
    },

    /// Fetching an object (or its metadata) failed for a reason other than absence
    #[error("failed to read object '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: object_store::Error,
    },

    /// Local filestore IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key that cannot be stored verbatim at `<namespace>/<key>`
    #[error("invalid object key '{path}': {reason}")]
    InvalidKey { path: String, reason: String },

    /// Identifier escapes the filestore root or is otherwise unusable
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Path outside of the migrated tree
    #[error("path error: {0}")]
    Path(PathBuf),
}

/// Result type alias for attachment store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
