//! Content keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Hex-encoded SHA-1 of a blob's bytes.
///
/// Identical content always yields the same key; the key says nothing about
/// which backend holds the blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    /// Derive the key for `data`.
    pub fn derive(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<BlobKey> for String {
    fn from(key: BlobKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            BlobKey::derive(b"").as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            BlobKey::derive(b"hello world").as_str(),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn test_deterministic() {
        let data = vec![7u8; 4096];
        assert_eq!(BlobKey::derive(&data), BlobKey::derive(&data));
    }

    #[test]
    fn test_no_collisions_in_corpus() {
        let mut seen = HashSet::new();
        for i in 0u32..10_000 {
            let data = format!("attachment-{}", i);
            assert!(seen.insert(BlobKey::derive(data.as_bytes())));
        }
        // single-byte inputs, including the empty one
        assert!(seen.insert(BlobKey::derive(b"")));
        for b in 0u8..=255 {
            assert!(seen.insert(BlobKey::derive(&[b])));
        }
    }

    #[test]
    fn test_key_shape() {
        let key = BlobKey::derive(b"shape");
        assert_eq!(key.as_str().len(), 40);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
