use std::path::PathBuf;

use clap::Args;
use store::S3Settings;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Storage location: `file` or `s3://<access_id>:<secret>@<bucket>`
    #[arg(long, default_value = "file")]
    pub location: String,

    /// Catalog/database identifier used as the key prefix
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Base directory of the local filestore (defaults to <stash dir>/filestore)
    #[arg(long)]
    pub filestore_path: Option<PathBuf>,

    /// S3 endpoint host override (default: s3.amazonaws.com)
    #[arg(long)]
    pub s3_host: Option<String>,

    /// S3 region (default: us-east-1)
    #[arg(long)]
    pub s3_region: Option<String>,

    /// Do not fall back to the local filestore on remote misses
    #[arg(long)]
    pub no_legacy_fallback: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),

    #[error("invalid location: {0}")]
    Location(#[from] store::ParseError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // fail early on a location the engine would reject later
        store::StorageMode::resolve(&self.location)?;

        let mut s3 = S3Settings::default();
        if let Some(host) = &self.s3_host {
            s3.host = host.clone();
        }
        s3.region = self.s3_region.clone();

        let config = AppConfig {
            location: self.location.clone(),
            namespace: self.namespace.clone(),
            filestore_path: self.filestore_path.clone(),
            legacy_fallback: !self.no_legacy_fallback,
            s3,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized stash directory at: {}\n\
             - Config: {}\n\
             - Filestore: {}\n\
             - Namespace: {}\n\
             - S3 endpoint: {}",
            state.stash_dir.display(),
            state.config_path.display(),
            state.filestore_path.display(),
            state.config.namespace,
            state.config.s3.endpoint(),
        ))
    }
}
