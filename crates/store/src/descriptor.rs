//! Parsing of storage location strings.
//!
//! A location is either a plain local marker (anything not starting with
//! `s3://`, typically `file`) or an S3 connection string of the form
//! `s3://<access_id>:<secret>@<bucket>`.

use std::fmt;

use crate::error::ParseError;

/// Scheme marker selecting the remote backend.
pub const S3_SCHEME: &str = "s3://";

/// Credentials and bucket parsed from an `s3://` location.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BackendDescriptor {
    access_id: String,
    secret: String,
    bucket: String,
}

impl BackendDescriptor {
    /// Parse an `s3://<access_id>:<secret>@<bucket>` string.
    ///
    /// Credentials containing `:` or `@` are rejected rather than truncated.
    pub fn parse(location: &str) -> Result<Self, ParseError> {
        let rest = location
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| ParseError::Scheme(location.chars().take(5).collect()))?;

        let (access_id, rest) = rest.split_once(':').ok_or(ParseError::Malformed)?;
        let (secret, bucket) = rest.split_once('@').ok_or(ParseError::Malformed)?;

        if access_id.is_empty() {
            return Err(ParseError::EmptyField("access id"));
        }
        if secret.is_empty() {
            return Err(ParseError::EmptyField("secret"));
        }
        if bucket.is_empty() {
            return Err(ParseError::EmptyField("bucket"));
        }

        if access_id.contains('@') {
            return Err(ParseError::ReservedCharacter("access id"));
        }
        if secret.contains(':') {
            return Err(ParseError::ReservedCharacter("secret"));
        }
        if bucket.contains(':') || bucket.contains('@') {
            return Err(ParseError::ReservedCharacter("bucket"));
        }

        Ok(Self {
            access_id: access_id.to_string(),
            secret: secret.to_string(),
            bucket: bucket.to_string(),
        })
    }

    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

// Keep the secret out of logs.
impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("access_id", &self.access_id)
            .field("secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Where blobs live for a single call, resolved from the current location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Plain local filestore
    Local,
    /// S3 bucket described by the descriptor
    Remote(BackendDescriptor),
}

impl StorageMode {
    /// Resolve a location string. Only `s3://` locations are parsed; anything
    /// else selects the local filestore.
    pub fn resolve(location: &str) -> Result<Self, ParseError> {
        if location.starts_with(S3_SCHEME) {
            Ok(Self::Remote(BackendDescriptor::parse(location)?))
        } else {
            Ok(Self::Local)
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
