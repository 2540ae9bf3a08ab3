use std::path::PathBuf;

use clap::Args;
use store::{audit, AuditReport, BlobRecord};

#[derive(Args, Debug, Clone)]
pub struct Audit {
    /// JSON file with an array of `{ "name": ..., "stored_key": ... }` records
    #[arg(long)]
    pub records: PathBuf,

    /// Only list lost blobs (totals still cover every record)
    #[arg(long)]
    pub lost_only: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("state error: {0}")]
    State(#[from] crate::state::StateError),

    #[error("failed to read records from {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("invalid records file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Audit {
    type Error = AuditError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;

        let raw = tokio::fs::read_to_string(&self.records)
            .await
            .map_err(|e| AuditError::Read(self.records.clone(), e))?;
        let records: Vec<BlobRecord> = serde_json::from_str(&raw)?;

        let mut report = audit(
            &state.factory(),
            &state.config.location,
            &state.config.namespace,
            &records,
        )
        .await?;

        if self.lost_only {
            report = AuditReport {
                statuses: report.lost().cloned().collect(),
                totals: report.totals,
            };
        }

        Ok(serde_json::to_string_pretty(&report)?)
    }
}
