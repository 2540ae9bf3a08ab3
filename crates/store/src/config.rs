//! Configuration for the remote client and the engine.

use serde::{Deserialize, Serialize};

/// Standard public S3 endpoint host.
pub const DEFAULT_S3_HOST: &str = "s3.amazonaws.com";
/// Region used when none is configured.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Connection settings for the S3 endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Settings {
    /// Endpoint host override. A bare host is reached over https; a full
    /// `http://` or `https://` URL is used as is (e.g. a local MinIO).
    #[serde(default = "default_host")]
    pub host: String,
    /// Bucket region (defaults to "us-east-1")
    #[serde(default)]
    pub region: Option<String>,
}

fn default_host() -> String {
    DEFAULT_S3_HOST.to_string()
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            region: None,
        }
    }
}

impl S3Settings {
    /// Endpoint URL derived from the host override.
    pub fn endpoint(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.host.trim_end_matches('/'))
        }
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_S3_REGION)
    }

    pub fn allow_http(&self) -> bool {
        self.endpoint().starts_with("http://")
    }
}

/// Engine settings that stay fixed for a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Catalog/database identifier prefixed to every remote key
    pub namespace: String,
    /// Try the local filestore when a remote read misses
    #[serde(default = "default_legacy_fallback")]
    pub legacy_fallback: bool,
}

fn default_legacy_fallback() -> bool {
    true
}

impl EngineConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            legacy_fallback: default_legacy_fallback(),
        }
    }

    pub fn with_legacy_fallback(mut self, enabled: bool) -> Self {
        self.legacy_fallback = enabled;
        self
    }
}
