//! Integrity audit of catalogued blobs against the remote bucket.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::client::TargetFactory;
use crate::descriptor::StorageMode;
use crate::error::Result;
use crate::target::NamespacedPath;

/// Catalog row as seen by the auditor. Only read, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub name: String,
    #[serde(default)]
    pub stored_key: String,
}

impl BlobRecord {
    pub fn new(name: impl Into<String>, stored_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stored_key: stored_key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStatus {
    pub name: String,
    pub stored_key: String,
    pub lost: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditTotals {
    pub count: usize,
    pub lost_count: usize,
}

/// Per-record statuses, in input order, plus totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub statuses: Vec<AuditStatus>,
    pub totals: AuditTotals,
}

impl AuditReport {
    pub fn lost(&self) -> impl Iterator<Item = &AuditStatus> {
        self.statuses.iter().filter(|s| s.lost)
    }
}

/// Check that every record with a stored key has an object at
/// `<namespace>/<stored_key>` in the bucket named by `location`.
///
/// Returns an empty report when the location is not remote. Records without
/// a stored key are skipped and not counted.
pub async fn audit(
    factory: &TargetFactory,
    location: &str,
    namespace: &str,
    records: &[BlobRecord],
) -> Result<AuditReport> {
    let descriptor = match StorageMode::resolve(location)? {
        StorageMode::Remote(descriptor) => descriptor,
        StorageMode::Local => {
            info!("storage location is not remote, skipping audit");
            return Ok(AuditReport::default());
        }
    };

    let target = factory.get_or_create_target(&descriptor).await?;
    let mut report = AuditReport::default();

    for record in records.iter().filter(|r| !r.stored_key.is_empty()) {
        report.totals.count += 1;

        let path = NamespacedPath::new(namespace, record.stored_key.as_str());
        let lost = !target.exists(&path).await?;
        if lost {
            error!(key = %record.stored_key, bucket = %target.bucket(), "blob missing from remote store");
            report.totals.lost_count += 1;
        } else {
            debug!(key = %record.stored_key, "blob present in remote store");
        }

        report.statuses.push(AuditStatus {
            name: record.name.clone(),
            stored_key: record.stored_key.clone(),
            lost,
        });
    }

    info!(
        count = report.totals.count,
        lost_count = report.totals.lost_count,
        "remote store audit finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::MemoryConnector;

    #[tokio::test]
    async fn test_local_location_is_a_noop() {
        let factory = TargetFactory::new(Arc::new(MemoryConnector::new()));
        let records = vec![BlobRecord::new("a", "ab/abc")];

        let report = audit(&factory, "file", "db1", &records).await.unwrap();
        assert_eq!(report, AuditReport::default());
    }

    #[test]
    fn test_record_deserializes_without_key() {
        let record: BlobRecord = serde_json::from_str(r#"{"name": "url attachment"}"#).unwrap();
        assert!(record.stored_key.is_empty());
    }
}
