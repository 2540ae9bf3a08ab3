use std::path::PathBuf;

use clap::Args;
use store::{migrate_tree, FailurePolicy, MigrationOptions, MigrationOutcome};

#[derive(Args, Debug, Clone)]
pub struct Migrate {
    /// Tree to copy (defaults to the configured filestore for the namespace)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Keep going after a file fails to copy
    #[arg(long)]
    pub continue_on_error: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("state error: {0}")]
    State(#[from] crate::state::StateError),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Migrate {
    type Error = MigrateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let root = self
            .root
            .clone()
            .unwrap_or_else(|| state.filestore().root().to_path_buf());

        let options = MigrationOptions {
            failure_policy: if self.continue_on_error {
                FailurePolicy::Continue
            } else {
                FailurePolicy::AbortOnFirst
            },
        };

        let report = migrate_tree(
            &state.factory(),
            &state.config.location,
            &root,
            &state.config.namespace,
            &options,
        )
        .await;

        if report.outcome == MigrationOutcome::Aborted {
            tracing::warn!("migration stopped early, re-run to retry the remaining files");
        }

        Ok(serde_json::to_string_pretty(&report)?)
    }
}
